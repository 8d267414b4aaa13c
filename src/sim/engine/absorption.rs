use crate::error::{Result, try_reserve};
use crate::sim::scene::Scene;

/// Defines how ray energy is absorbed upon surface interaction.
pub trait AbsorptionModel {
    /// Absorption coefficient of surface `surface_index`, in `[0, 1)`.
    fn coefficient(&self, surface_index: usize) -> f64;

    /// Remaining energy after one reflection off the surface.
    fn apply(&self, energy: f64, surface_index: usize) -> f64 {
        energy * (1.0 - self.coefficient(surface_index))
    }
}

/// Scalar absorption: single coefficient per triangle.
#[derive(Debug, Clone)]
pub struct ScalarAbsorption {
    /// Absorption coefficient per triangle index.
    pub coefficients: Vec<f64>,
}

impl ScalarAbsorption {
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }

    /// Resolves one coefficient per mesh triangle, preferring the triangle's
    /// own material tag over the scene material.
    pub fn from_scene(scene: &Scene) -> Result<Self> {
        let count = scene.environment().triangle_count();
        let mut coefficients = Vec::new();
        try_reserve(&mut coefficients, count, "absorption coefficients")?;
        coefficients.extend((0..count).map(|i| scene.triangle_material(i).absorption()));
        Ok(Self { coefficients })
    }
}

impl AbsorptionModel for ScalarAbsorption {
    fn coefficient(&self, surface_index: usize) -> f64 {
        self.coefficients.get(surface_index).copied().unwrap_or(0.0)
    }
}
