//! Bounce chains: the reflected path of one primary ray.

use crate::error::{Result, try_reserve};
use crate::geom::ray::Ray;
use crate::sim::engine::FlatScene;
use crate::sim::engine::absorption::AbsorptionModel;
use crate::sim::engine::voxel_grid::Segment;
use crate::Point;

/// Why a chain stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainEnd {
    /// The last ray hit nothing.
    Escaped,
    /// The last ray's energy was at or below the floor.
    EnergyFloor,
    /// The last ray reached the bounce cap.
    BounceLimit,
}

/// Limits applied while tracing a chain.
#[derive(Debug, Clone, Copy)]
pub struct ChainLimits {
    pub min_energy: f64,
    pub max_bounces: u32,
    /// Added to a parent's id to form its child's id.
    pub id_stride: u64,
}

/// Ordered rays of one primary ray. Element `i + 1` is the child of
/// element `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct BounceChain {
    rays: Vec<Ray>,
    end: ChainEnd,
    /// Where the last ray's segment ends.
    terminal: Point,
}

impl BounceChain {
    /// Traces `primary` through `scene` until it escapes or a limit stops it.
    ///
    /// A chain keeps bouncing while the current ray's energy is above
    /// `min_energy` and its bounce count is below `max_bounces`. A stopped
    /// ray still ends at its next wall. An escaped ray reaches out for the
    /// scene diagonal.
    pub fn trace(primary: Ray, scene: &FlatScene, limits: &ChainLimits) -> Result<Self> {
        let mut rays = vec![primary];
        let mut current = primary;

        loop {
            let Some(hit) = scene.closest_hit(&current) else {
                let terminal = current.point_at(scene.diagonal());
                return Ok(Self {
                    rays,
                    end: ChainEnd::Escaped,
                    terminal,
                });
            };

            let end = if current.energy <= limits.min_energy {
                Some(ChainEnd::EnergyFloor)
            } else if current.bounce_count >= limits.max_bounces {
                Some(ChainEnd::BounceLimit)
            } else {
                None
            };
            if let Some(end) = end {
                return Ok(Self {
                    rays,
                    end,
                    terminal: hit.point,
                });
            }

            let energy = scene.absorption.apply(current.energy, hit.triangle);
            let child = current.reflect_at(&hit, energy, limits.id_stride);
            try_reserve(&mut rays, 1, "bounce chain")?;
            rays.push(child);
            current = child;
        }
    }

    pub fn rays(&self) -> &[Ray] {
        &self.rays
    }

    pub fn primary(&self) -> &Ray {
        &self.rays[0]
    }

    pub fn len(&self) -> usize {
        self.rays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rays.is_empty()
    }

    /// Child of ray `i`, if it bounced.
    pub fn child(&self, i: usize) -> Option<&Ray> {
        self.rays.get(i + 1)
    }

    pub fn end(&self) -> ChainEnd {
        self.end
    }

    pub fn terminal(&self) -> Point {
        self.terminal
    }

    /// Number of reflections in the chain.
    pub fn bounces(&self) -> usize {
        self.rays.len() - 1
    }

    /// Path pieces to deposit: every parent to child edge plus the final
    /// segment, each carrying the parent's energy times `intensity`.
    pub fn segments(&self, intensity: f64) -> impl Iterator<Item = Segment> + '_ {
        self.rays.iter().enumerate().map(move |(i, ray)| Segment {
            start: ray.origin,
            end: self.child(i).map_or(self.terminal, |c| c.origin),
            start_distance: ray.total_distance,
            energy: ray.energy * intensity,
        })
    }
}
