mod chain;
mod config;
mod simulation;

pub use chain::{BounceChain, ChainEnd, ChainLimits};
pub use config::Settings;
pub use simulation::{RunSummary, Simulation, SimulationProgress};

// Re-export VoxelGrid from engine for grid accessors
pub use crate::sim::engine::voxel_grid::{Voxel, VoxelGrid};
