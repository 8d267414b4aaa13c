use serde::Deserialize;

use crate::error::{Error, Result};
use crate::geom::ray::RAY_MAX_ENERGY;

/// Parameters of a ray-tracing run.
///
/// All fields are public; start from [`Settings::new`] and override what you
/// need before handing the settings to a simulation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    // Grid
    /// Voxel edge length in meters.
    pub voxel_size: f64,

    // Rays
    /// Primary rays emitted per source.
    pub num_rays: usize,
    /// Bounce cap per chain.
    pub max_bounces: u32,
    /// A chain keeps bouncing only while its energy stays above this floor.
    pub min_energy: f64,
    pub speed_of_sound: f64,

    // Time binning
    /// Bins per second; `1 / fps` is the bin width.
    pub fps: u32,
    /// Longest time of flight (s) the voxel histograms cover.
    pub max_duration: f64,

    /// RNG seed for ray jitter. `None` draws a fresh seed when the
    /// simulation is created.
    pub seed: Option<u64>,
}

impl Settings {
    pub fn new() -> Self {
        Self {
            voxel_size: 0.5,
            num_rays: 1000,
            max_bounces: 100,
            min_energy: 0.8,
            speed_of_sound: 343.0,
            fps: 60,
            max_duration: 2.0,
            seed: None,
        }
    }

    pub fn bin_width(&self) -> f64 {
        1.0 / self.fps as f64
    }

    /// Number of time bins covering `max_duration`.
    pub fn max_bins(&self) -> usize {
        (self.max_duration * self.fps as f64).ceil() as usize
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(Error::invalid(format!(
                    "{name} must be finite and > 0, got {value}"
                )))
            }
        };
        positive("voxel_size", self.voxel_size)?;
        positive("max_duration", self.max_duration)?;
        positive("speed_of_sound", self.speed_of_sound)?;

        if self.num_rays == 0 {
            return Err(Error::invalid("num_rays must be > 0"));
        }
        if self.fps == 0 {
            return Err(Error::invalid("fps must be > 0"));
        }
        if !self.min_energy.is_finite() || !(0.0..RAY_MAX_ENERGY).contains(&self.min_energy) {
            return Err(Error::invalid(format!(
                "min_energy must be in [0, {RAY_MAX_ENERGY}), got {}",
                self.min_energy
            )));
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}
