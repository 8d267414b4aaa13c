use crate::error::{Error, Result};
use crate::{Point, Vector};
use serde::{Deserialize, Serialize};

fn default_intensity() -> f64 {
    1.0
}

/// Point sound source.
///
/// Rays leave `position` around the aim `direction`. Every energy value a
/// ray from this source deposits is weighted by `intensity`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub position: Point,
    pub direction: Vector,
    #[serde(default = "default_intensity")]
    pub intensity: f64,
}

impl Source {
    pub fn new(position: Point, direction: Vector, intensity: f64) -> Self {
        Self {
            position,
            direction,
            intensity,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.position.is_finite() {
            return Err(Error::invalid(format!(
                "source position {} is not finite",
                self.position
            )));
        }
        if !self.direction.is_finite() {
            return Err(Error::invalid(format!(
                "source direction {} is not finite",
                self.direction
            )));
        }
        if !self.intensity.is_finite() || self.intensity < 0.0 {
            return Err(Error::invalid(format!(
                "source intensity must be finite and >= 0, got {}",
                self.intensity
            )));
        }
        Ok(())
    }
}
