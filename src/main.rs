use std::path::PathBuf;

use acoustrace::io::Scenario;
use acoustrace::{Scene, SceneConfig, Simulation};
use anyhow::{Context, Result, bail};

/// Number of highest-energy voxels listed after a run.
const TOP_VOXELS: usize = 5;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next().map(PathBuf::from) else {
        bail!("usage: acoustrace <scenario.json>");
    };

    let scenario = Scenario::from_path(&path)
        .with_context(|| format!("Failed to load scenario: {}", path.display()))?;
    let mesh = scenario
        .load_mesh()
        .with_context(|| format!("Failed to load mesh: {}", scenario.mesh.display()))?;

    let scene = Scene::new(SceneConfig {
        sources: &scenario.sources,
        material: scenario.material,
        environment: &mesh,
    })
    .context("Invalid scene")?;

    let mut sim = Simulation::new(&scene, scenario.settings.clone()).context("Invalid settings")?;
    let summary = sim.run_with_progress(scenario.settings.num_rays, |p| {
        log::info!("Traced {}/{} rays", p.rays_done, p.total_rays);
    })?;

    log::info!(
        "Run: {} rays, {} segments, {} cell deposits, {} out of range, energy {:.6}",
        summary.rays,
        summary.segments,
        summary.cell_deposits,
        summary.out_of_range,
        summary.energy
    );

    let [nx, ny, _] = sim.grid_dims();
    let mut ranked: Vec<(usize, f64)> = sim
        .voxels()
        .map(|v| v.total_energy())
        .enumerate()
        .filter(|&(_, e)| e > 0.0)
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    for (idx, energy) in ranked.into_iter().take(TOP_VOXELS) {
        let (x, y, z) = (idx % nx, (idx / nx) % ny, idx / (nx * ny));
        let bins = sim.voxel(x, y, z).map_or(0, |v| v.bin_count());
        log::info!(
            "Voxel ({x}, {y}, {z}) at {:.2}: energy {energy:.6} over {bins} bins",
            sim.voxel_center(x, y, z)
        );
    }

    Ok(())
}
