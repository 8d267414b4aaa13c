use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::{Error, Result, try_reserve};
use crate::sim::engine::propagation::InverseSquare;
use crate::sim::engine::voxel_grid::{DepositStats, Voxel, VoxelGrid};
use crate::sim::engine::{FlatScene, RayBatch};
use crate::sim::scene::Scene;
use crate::{Point, Vector};

use super::chain::{BounceChain, ChainEnd, ChainLimits};
use super::config::Settings;

#[derive(Debug, Clone, Copy)]
pub struct SimulationProgress {
    /// Primary rays traced so far, over all sources.
    pub rays_done: usize,
    /// Primary rays this run will trace.
    pub total_rays: usize,
    /// Energy deposited into the grid so far.
    pub deposited_energy: f64,
}

/// Tally of one simulation run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    /// Primary rays traced.
    pub rays: usize,
    /// Reflections over all chains.
    pub bounces: usize,
    pub escaped: usize,
    /// Chains stopped by the energy floor.
    pub energy_floor: usize,
    /// Chains stopped by the bounce cap.
    pub bounce_limit: usize,
    pub segments: usize,
    /// Cell deposits that landed in the grid.
    pub cell_deposits: usize,
    /// Deposits dropped because their time of flight exceeded the duration cap.
    pub out_of_range: usize,
    pub energy: f64,
}

impl RunSummary {
    fn add_chain(&mut self, chain: &BounceChain) {
        self.rays += 1;
        self.bounces += chain.bounces();
        match chain.end() {
            ChainEnd::Escaped => self.escaped += 1,
            ChainEnd::EnergyFloor => self.energy_floor += 1,
            ChainEnd::BounceLimit => self.bounce_limit += 1,
        }
    }

    fn add_deposit(&mut self, stats: DepositStats) {
        self.segments += 1;
        self.cell_deposits += stats.cells;
        self.out_of_range += stats.out_of_range;
        self.energy += stats.energy;
    }
}

/// Ray-tracing simulation over a borrowed scene.
///
/// Creating a simulation allocates the voxel grid and chain storage but traces
/// nothing. Every [`Simulation::run`] starts from a clean grid and the same
/// seed, so repeated runs give identical results.
pub struct Simulation<'s, 'm> {
    scene: &'s Scene<'m>,
    settings: Settings,
    seed: u64,
    grid: VoxelGrid,
    chains: Vec<BounceChain>,
}

trait ProgressReporter {
    fn every_rays(&self) -> usize;
    fn report(&mut self, progress: &SimulationProgress);
}

struct NoProgress;
impl ProgressReporter for NoProgress {
    fn every_rays(&self) -> usize {
        0
    }
    fn report(&mut self, _progress: &SimulationProgress) {}
}

struct FnProgress<F> {
    every_rays: usize,
    f: F,
}
impl<F> ProgressReporter for FnProgress<F>
where
    F: FnMut(&SimulationProgress),
{
    fn every_rays(&self) -> usize {
        self.every_rays
    }
    fn report(&mut self, progress: &SimulationProgress) {
        (self.f)(progress);
    }
}

impl<'s, 'm> Simulation<'s, 'm> {
    pub fn new(scene: &'s Scene<'m>, settings: Settings) -> Result<Self> {
        settings.validate()?;

        let total_rays = scene
            .num_sources()
            .checked_mul(settings.num_rays)
            .ok_or_else(|| Error::Allocation("ray count overflows".to_string()))?;

        let grid = VoxelGrid::new(
            scene.bounding_box(),
            settings.voxel_size,
            settings.bin_width(),
            settings.max_bins(),
        )?;

        let mut chains = Vec::new();
        try_reserve(&mut chains, total_rays, "ray storage")?;

        let seed = settings.seed.unwrap_or_else(rand::random);
        log::info!(
            "Simulation: {} source(s) x {} rays, grid {:?}, seed {seed}",
            scene.num_sources(),
            settings.num_rays,
            grid.dims()
        );

        Ok(Self {
            scene,
            settings,
            seed,
            grid,
            chains,
        })
    }

    pub fn run(&mut self) -> Result<RunSummary> {
        self.run_inner(NoProgress)
    }

    /// Runs the simulation while periodically reporting progress.
    ///
    /// - `every_rays=0` disables progress reporting.
    /// - The reporter is called once at start (`rays_done=0`) and then every `every_rays`
    ///   primary rays, plus once at the end.
    pub fn run_with_progress<F>(&mut self, every_rays: usize, report: F) -> Result<RunSummary>
    where
        F: FnMut(&SimulationProgress),
    {
        self.run_inner(FnProgress {
            every_rays,
            f: report,
        })
    }

    fn run_inner<R: ProgressReporter>(&mut self, mut reporter: R) -> Result<RunSummary> {
        // Start clean so reruns reproduce the first run
        self.grid.clear();
        self.chains.clear();
        let mut rng = StdRng::seed_from_u64(self.seed);

        let scene = self.scene;
        let flat = FlatScene::new(scene)?;
        let propagation = InverseSquare::new(self.settings.speed_of_sound);
        let num_rays = self.settings.num_rays;
        let total_rays = scene.num_sources() * num_rays;
        let limits = ChainLimits {
            min_energy: self.settings.min_energy,
            max_bounces: self.settings.max_bounces,
            id_stride: total_rays as u64,
        };

        let report_every = reporter.every_rays();
        let mut summary = RunSummary::default();
        let progress = |summary: &RunSummary| SimulationProgress {
            rays_done: summary.rays,
            total_rays,
            deposited_energy: summary.energy,
        };
        if report_every > 0 {
            reporter.report(&progress(&summary));
        }

        for (s, source) in scene.sources().iter().enumerate() {
            let batch = RayBatch::new(source, num_rays, (s * num_rays) as u64, &mut rng)?;
            log::debug!("Source {s}: tracing {} rays", batch.len());

            for primary in batch.rays {
                let chain = BounceChain::trace(primary, &flat, &limits)?;
                for seg in chain.segments(source.intensity) {
                    let stats = self.grid.deposit_segment(&seg, &propagation)?;
                    summary.add_deposit(stats);
                }
                summary.add_chain(&chain);
                self.chains.push(chain);

                if report_every > 0 && summary.rays % report_every == 0 && summary.rays < total_rays {
                    reporter.report(&progress(&summary));
                }
            }
        }

        if report_every > 0 {
            reporter.report(&progress(&summary));
        }
        if summary.out_of_range > 0 {
            log::warn!(
                "{} deposits fell beyond the {} s duration cap",
                summary.out_of_range,
                self.settings.max_duration
            );
        }
        log::info!(
            "Traced {} rays, {} bounces ({} escaped, {} energy floor, {} bounce limit), deposited {:.6}",
            summary.rays,
            summary.bounces,
            summary.escaped,
            summary.energy_floor,
            summary.bounce_limit,
            summary.energy
        );

        Ok(summary)
    }

    pub fn scene(&self) -> &'s Scene<'m> {
        self.scene
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Seed used for ray jitter on every run.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn grid_dims(&self) -> [usize; 3] {
        self.grid.dims()
    }

    pub fn grid_origin(&self) -> Point {
        self.grid.origin()
    }

    pub fn voxel_size(&self) -> f64 {
        self.grid.voxel_size()
    }

    pub fn bin_width(&self) -> f64 {
        self.grid.bin_width()
    }

    pub fn max_bins(&self) -> usize {
        self.grid.max_bins()
    }

    pub fn voxel(&self, x: usize, y: usize, z: usize) -> Option<&Voxel> {
        self.grid.voxel(x, y, z)
    }

    pub fn voxel_at(&self, pt: Point) -> Option<&Voxel> {
        self.grid.voxel_at(pt)
    }

    pub fn voxel_center(&self, x: usize, y: usize, z: usize) -> Point {
        self.grid.cell_center(x, y, z)
    }

    /// All voxels, z-outermost.
    pub fn voxels(&self) -> impl Iterator<Item = &Voxel> + '_ {
        self.grid.voxels()
    }

    /// Bounce chains of the last run, source by source.
    pub fn chains(&self) -> &[BounceChain] {
        &self.chains
    }

    /// Origin and direction of every ray in every chain.
    pub fn ray_paths(&self) -> impl Iterator<Item = (Point, Vector)> + '_ {
        self.chains
            .iter()
            .flat_map(|c| c.rays().iter().map(|r| (r.origin, r.direction)))
    }
}
