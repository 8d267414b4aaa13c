pub mod bboxes;
pub mod mesh;
pub mod point;
pub mod ray;
pub mod triangles;
pub mod vector;

/// Geometric precision
const EPS: f64 = 1e-13;
