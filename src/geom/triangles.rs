use crate::error::{Error, Result, try_reserve};
use crate::geom::bboxes::BoundingBox;
use crate::{Point, Vector};

/// A triangle with its bounding box precomputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Point; 3],
    pub bbox: BoundingBox,
}

impl Triangle {
    pub fn new(p0: Point, p1: Point, p2: Point) -> Self {
        let vertices = [p0, p1, p2];
        Self {
            vertices,
            bbox: BoundingBox::from_triangle(&vertices),
        }
    }

    /// Edges `v1 - v0` and `v2 - v0`.
    pub fn edges(&self) -> (Vector, Vector) {
        let [p0, p1, p2] = self.vertices;
        (p1 - p0, p2 - p0)
    }

    /// Unit normal following the right-hand rule over `v0, v1, v2`.
    ///
    /// Zero for degenerate (collinear) triangles.
    pub fn normal(&self) -> Vector {
        let (e1, e2) = self.edges();
        e1.cross(e2).normalize()
    }
}

/// Builds triangles from a vertex buffer and a triangle-list index buffer.
///
/// Every 3 consecutive indices form one triangle.
pub fn triangles_from_buffers(vertices: &[Point], indices: &[u32]) -> Result<Vec<Triangle>> {
    if indices.len() % 3 != 0 {
        return Err(Error::invalid(format!(
            "index buffer length {} is not a multiple of 3",
            indices.len()
        )));
    }

    let mut triangles = Vec::new();
    try_reserve(&mut triangles, indices.len() / 3, "triangle buffer")?;

    for tri in indices.chunks_exact(3) {
        let vertex = |i: usize| {
            vertices.get(i).copied().ok_or_else(|| {
                Error::invalid(format!(
                    "vertex index {i} out of range (vertex count {})",
                    vertices.len()
                ))
            })
        };
        triangles.push(Triangle::new(
            vertex(tri[0] as usize)?,
            vertex(tri[1] as usize)?,
            vertex(tri[2] as usize)?,
        ));
    }

    Ok(triangles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResultCode;

    fn unit_square() -> (Vec<Point>, Vec<u32>) {
        let vertices = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(1.0, 1.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
        ];
        (vertices, vec![0, 1, 2, 0, 2, 3])
    }

    #[test]
    fn test_triangles_from_buffers() {
        let (vertices, indices) = unit_square();
        let tris = triangles_from_buffers(&vertices, &indices).unwrap();
        assert_eq!(tris.len(), 2);
        assert_eq!(tris[1].vertices[2], Point::new(0.0, 1.0, 0.0));
        assert_eq!(tris[0].bbox.max, Point::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_index_out_of_range() {
        let (vertices, _) = unit_square();
        let err = triangles_from_buffers(&vertices, &[0, 1, 4]).unwrap_err();
        assert_eq!(err.code(), ResultCode::InvalidArgument);
    }

    #[test]
    fn test_index_count_not_multiple_of_three() {
        let (vertices, _) = unit_square();
        let err = triangles_from_buffers(&vertices, &[0, 1]).unwrap_err();
        assert_eq!(err.code(), ResultCode::InvalidArgument);
    }

    #[test]
    fn test_empty_buffers() {
        let tris = triangles_from_buffers(&[], &[]).unwrap();
        assert!(tris.is_empty());
    }

    #[test]
    fn test_normal() {
        let t = Triangle::new(
            Point::new(0., 0., 0.),
            Point::new(2., 0., 0.),
            Point::new(0., 2., 0.),
        );
        assert!(t.normal().is_close(&Vector::new(0., 0., 1.)));

        let degenerate = Triangle::new(
            Point::new(0., 0., 0.),
            Point::new(1., 0., 0.),
            Point::new(2., 0., 0.),
        );
        assert_eq!(degenerate.normal(), Vector::zero());
    }
}
