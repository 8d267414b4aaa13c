pub mod absorption;
pub mod propagation;
pub mod voxel_grid;

use rand::Rng;

use crate::Vector;
use crate::error::{Result, try_reserve};
use crate::geom::bboxes::BoundingBox;
use crate::geom::ray::{Hit, Ray};
use crate::geom::triangles::Triangle;
use crate::sim::acoustics::source::Source;
use crate::sim::scene::Scene;

use self::absorption::ScalarAbsorption;

/// Half-width of the per-axis uniform jitter added to a source's aim.
pub const DIRECTION_JITTER: f64 = 0.1;

/// Flattened scene representation for fast indexed access during tracing.
#[derive(Debug, Clone)]
pub struct FlatScene {
    /// All mesh triangles, in index-buffer order.
    pub triangles: Vec<Triangle>,
    /// Absorption coefficient per triangle.
    pub absorption: ScalarAbsorption,
    /// Scene bounding box.
    pub bbox: BoundingBox,
}

impl FlatScene {
    pub fn new(scene: &Scene) -> Result<Self> {
        let triangles = scene.environment().triangles()?;
        let absorption = ScalarAbsorption::from_scene(scene)?;
        Ok(Self {
            triangles,
            absorption,
            bbox: *scene.bounding_box(),
        })
    }

    /// Closest triangle hit along `ray`, by brute-force scan.
    pub fn closest_hit(&self, ray: &Ray) -> Option<Hit> {
        ray.closest_hit(&self.triangles)
    }

    /// Length of the world box diagonal, used as the reach of escaping rays.
    pub fn diagonal(&self) -> f64 {
        self.bbox.diagonal()
    }
}

/// Primary rays of one source.
#[derive(Debug, Clone)]
pub struct RayBatch {
    pub rays: Vec<Ray>,
}

impl RayBatch {
    /// Emits `num_rays` rays from `source.position`. Each direction is the
    /// source aim plus uniform jitter in `[-DIRECTION_JITTER, DIRECTION_JITTER)`
    /// on every axis, re-normalized. Ray ids start at `first_id`.
    pub fn new(source: &Source, num_rays: usize, first_id: u64, rng: &mut impl Rng) -> Result<Self> {
        let mut rays = Vec::new();
        try_reserve(&mut rays, num_rays, "primary rays")?;
        for i in 0..num_rays {
            let direction = source.direction + jitter(rng);
            rays.push(Ray::new(source.position, direction).with_id(first_id + i as u64));
        }
        Ok(Self { rays })
    }

    /// Number of rays in the batch.
    pub fn len(&self) -> usize {
        self.rays.len()
    }

    /// Returns true if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.rays.is_empty()
    }
}

fn jitter(rng: &mut impl Rng) -> Vector {
    let mut component = || rng.gen_range(-DIRECTION_JITTER..DIRECTION_JITTER);
    Vector::new(component(), component(), component())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::mesh::Mesh;
    use crate::sim::materials::Material;
    use crate::sim::scene::SceneConfig;
    use crate::{Point, Vector};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn floor_mesh() -> Mesh {
        Mesh::new(
            vec![
                Point::new(0., 0., 0.),
                Point::new(4., 0., 0.),
                Point::new(4., 4., 0.),
                Point::new(0., 4., 0.),
            ],
            vec![0, 1, 2, 0, 2, 3],
        )
        .unwrap()
    }

    #[test]
    fn test_flat_scene_construction() {
        let mesh = floor_mesh()
            .with_triangle_materials(vec![Material::Wood, Material::Concrete])
            .unwrap();
        let sources = [Source::new(Point::new(1., 1., 1.), Vector::new(0., 0., -1.), 1.0)];
        let scene = Scene::new(SceneConfig {
            sources: &sources,
            material: Material::Plastic,
            environment: &mesh,
        })
        .unwrap();

        let flat = FlatScene::new(&scene).unwrap();
        assert_eq!(flat.triangles.len(), 2);
        assert_eq!(flat.absorption.coefficients, vec![0.10, 0.02]);
        assert!((flat.diagonal() - 32f64.sqrt()).abs() < 1e-12);

        let ray = Ray::new(Point::new(3., 1., 2.), Vector::new(0., 0., -1.));
        let hit = flat.closest_hit(&ray).unwrap();
        assert_eq!(hit.triangle, 0);
    }

    #[test]
    fn test_ray_batch_creation() {
        let source = Source::new(Point::new(1., 2., 3.), Vector::new(0., 0., 1.), 1.0);
        let mut rng = StdRng::seed_from_u64(7);
        let batch = RayBatch::new(&source, 50, 100, &mut rng).unwrap();
        assert_eq!(batch.len(), 50);
        assert!(!batch.is_empty());

        for (i, ray) in batch.rays.iter().enumerate() {
            assert_eq!(ray.origin, source.position);
            assert_eq!(ray.id, 100 + i as u64);
            assert!((ray.direction.length() - 1.0).abs() < 1e-12);
            // Jitter keeps rays close to the aim
            assert!(ray.direction.dz > 0.97);
        }
    }

    #[test]
    fn test_ray_batch_is_seeded() {
        let source = Source::new(Point::new(0., 0., 0.), Vector::new(1., 0., 0.), 1.0);
        let a = RayBatch::new(&source, 5, 0, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = RayBatch::new(&source, 5, 0, &mut StdRng::seed_from_u64(1)).unwrap();
        let c = RayBatch::new(&source, 5, 0, &mut StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(a.rays, b.rays);
        assert_ne!(a.rays, c.rays);
    }
}
