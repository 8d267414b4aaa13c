//! JSON scenario files.
//!
//! A scenario names the environment mesh, the room material, the sources and
//! the simulation settings:
//!
//! ```json
//! {
//!   "mesh": "shoebox.obj",
//!   "material": "wood",
//!   "sources": [
//!     { "position": { "x": 2, "y": 1.5, "z": 1.2 },
//!       "direction": { "dx": 1, "dy": 0, "dz": 0 } }
//!   ],
//!   "settings": { "num_rays": 500, "seed": 42 }
//! }
//! ```
//!
//! The mesh path is resolved relative to the scenario file.

use crate::error::{Error, Result};
use crate::geom::mesh::Mesh;
use crate::io::read_mesh;
use crate::sim::acoustics::source::Source;
use crate::sim::materials::Material;
use crate::sim::rays::Settings;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub mesh: PathBuf,
    #[serde(default)]
    pub material: Material,
    pub sources: Vec<Source>,
    #[serde(default)]
    pub settings: Settings,
}

impl Scenario {
    /// Reads a scenario and makes its mesh path absolute with respect to the
    /// scenario file's directory.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut scenario: Scenario = serde_json::from_reader(reader)
            .map_err(|e| Error::Scenario(format!("{}: {e}", path.display())))?;

        if scenario.mesh.is_relative() {
            if let Some(dir) = path.parent() {
                scenario.mesh = dir.join(&scenario.mesh);
            }
        }
        log::debug!(
            "Scenario {}: mesh {}, {} source(s)",
            path.display(),
            scenario.mesh.display(),
            scenario.sources.len()
        );
        Ok(scenario)
    }

    pub fn load_mesh(&self) -> Result<Mesh> {
        read_mesh(&self.mesh, self.material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_mesh_path_relative_to_scenario() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let sub = dir.path().join("rooms");
        std::fs::create_dir(&sub)?;
        std::fs::write(sub.join("tri.obj"), "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n")?;

        let scenario_path = sub.join("scenario.json");
        std::fs::write(
            &scenario_path,
            r#"{
                "mesh": "tri.obj",
                "material": "plastic",
                "sources": [
                    {"position": {"x": 0.2, "y": 0.2, "z": 1}, "direction": {"dx": 0, "dy": 0, "dz": -1}, "intensity": 2}
                ],
                "settings": {"num_rays": 4, "seed": 1}
            }"#,
        )?;

        let scenario = Scenario::from_path(&scenario_path)?;
        assert_eq!(scenario.mesh, sub.join("tri.obj"));
        assert_eq!(scenario.material, Material::Plastic);
        assert_eq!(scenario.sources.len(), 1);
        assert_eq!(scenario.sources[0].intensity, 2.0);
        assert_eq!(scenario.settings.num_rays, 4);
        assert_eq!(scenario.settings.fps, 60);

        let mesh = scenario.load_mesh()?;
        assert_eq!(mesh.triangle_count(), 1);
        Ok(())
    }

    #[test]
    fn test_malformed_scenario() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"sources": []}"#)?;

        let err = Scenario::from_path(&path).unwrap_err();
        assert!(matches!(err, Error::Scenario(_)));
        Ok(())
    }
}
