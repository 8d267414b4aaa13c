use crate::error::{Error, Result};
use crate::geom::bboxes::BoundingBox;
use crate::geom::triangles::{Triangle, triangles_from_buffers};
use crate::sim::materials::Material;
use crate::{Point, Vector};

/// Triangle-list environment mesh.
///
/// Every 3 consecutive entries of `indices` form one triangle. Normals and
/// per-triangle material tags are optional.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    vertices: Vec<Point>,
    indices: Vec<u32>,
    normals: Option<Vec<Vector>>,
    triangle_materials: Option<Vec<Material>>,
}

impl Mesh {
    /// Creates a mesh after checking that the index buffer describes whole
    /// triangles and only references existing vertices.
    pub fn new(vertices: Vec<Point>, indices: Vec<u32>) -> Result<Self> {
        if indices.len() % 3 != 0 {
            return Err(Error::invalid(format!(
                "index buffer length {} is not a multiple of 3",
                indices.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(Error::invalid(format!(
                "vertex index {bad} out of range (vertex count {})",
                vertices.len()
            )));
        }
        Ok(Self {
            vertices,
            indices,
            normals: None,
            triangle_materials: None,
        })
    }

    /// Mesh with no geometry.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Attaches per-vertex normals. One normal per vertex is required.
    pub fn with_normals(mut self, normals: Vec<Vector>) -> Result<Self> {
        if normals.len() != self.vertices.len() {
            return Err(Error::invalid(format!(
                "got {} normals for {} vertices",
                normals.len(),
                self.vertices.len()
            )));
        }
        self.normals = Some(normals);
        Ok(self)
    }

    /// Attaches per-triangle material tags. One tag per triangle is required.
    pub fn with_triangle_materials(mut self, materials: Vec<Material>) -> Result<Self> {
        if materials.len() != self.triangle_count() {
            return Err(Error::invalid(format!(
                "got {} material tags for {} triangles",
                materials.len(),
                self.triangle_count()
            )));
        }
        self.triangle_materials = Some(materials);
        Ok(self)
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn normals(&self) -> Option<&[Vector]> {
        self.normals.as_deref()
    }

    pub fn triangle_materials(&self) -> Option<&[Material]> {
        self.triangle_materials.as_deref()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Box around all vertices, `None` for an empty mesh.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.vertices)
    }

    /// Rebuilds the triangle list from the vertex and index buffers.
    pub fn triangles(&self) -> Result<Vec<Triangle>> {
        triangles_from_buffers(&self.vertices, &self.indices)
    }
}
