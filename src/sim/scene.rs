use crate::Point;
use crate::error::{Error, Result, try_reserve};
use crate::geom::bboxes::BoundingBox;
use crate::geom::mesh::Mesh;
use crate::sim::acoustics::source::Source;
use crate::sim::materials::Material;

/// Inputs for [`Scene::new`].
#[derive(Debug, Clone, Copy)]
pub struct SceneConfig<'a> {
    pub sources: &'a [Source],
    /// Room material, used for every triangle without its own tag.
    pub material: Material,
    pub environment: &'a Mesh,
}

/// Sources, room material and the environment they live in.
///
/// The scene keeps its own copy of the sources and borrows the mesh.
#[derive(Debug, Clone)]
pub struct Scene<'a> {
    sources: Vec<Source>,
    material: Material,
    environment: &'a Mesh,
    bbox: BoundingBox,
}

impl<'a> Scene<'a> {
    pub fn new(config: SceneConfig<'a>) -> Result<Self> {
        if config.sources.is_empty() {
            return Err(Error::invalid("scene needs at least one source"));
        }
        for (i, src) in config.sources.iter().enumerate() {
            src.validate().map_err(|e| Error::invalid(format!("source {i}: {e}")))?;
        }

        let mut sources = Vec::new();
        try_reserve(&mut sources, config.sources.len(), "scene sources")?;
        sources.extend_from_slice(config.sources);

        let bbox = config
            .environment
            .bounding_box()
            .unwrap_or_else(|| BoundingBox::at(Point::new(0.0, 0.0, 0.0)));

        log::debug!(
            "Scene: {} source(s), material {}, {} triangles, bbox {} .. {}",
            sources.len(),
            config.material,
            config.environment.triangle_count(),
            bbox.min,
            bbox.max
        );

        Ok(Self {
            sources,
            material: config.material,
            environment: config.environment,
            bbox,
        })
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn num_sources(&self) -> usize {
        self.sources.len()
    }

    pub fn material(&self) -> Material {
        self.material
    }

    pub fn environment(&self) -> &'a Mesh {
        self.environment
    }

    /// World bounding box of the environment, fixed at construction.
    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Material of triangle `idx`: its own tag when the mesh has one,
    /// otherwise the room material.
    pub fn triangle_material(&self, idx: usize) -> Material {
        self.environment
            .triangle_materials()
            .and_then(|tags| tags.get(idx).copied())
            .unwrap_or(self.material)
    }
}
