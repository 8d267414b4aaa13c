//! File I/O for environment meshes and scenario descriptions.

pub mod obj;
pub mod scenario;
pub mod stl;

pub use obj::read_obj;
pub use scenario::Scenario;
pub use stl::{StlFormat, read_stl, write_stl};

use crate::error::{Error, Result};
use crate::geom::mesh::Mesh;
use crate::sim::materials::Material;
use std::path::Path;

/// Reads a mesh, picking the reader from the file extension.
///
/// `fallback` is the material given to OBJ faces that have no known
/// `usemtl` when other faces in the same file do.
pub fn read_mesh(path: &Path, fallback: Material) -> Result<Mesh> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let mesh = match ext.as_deref() {
        Some("stl") => read_stl(path)?,
        Some("obj") => read_obj(path, fallback)?,
        _ => {
            return Err(Error::MeshLoad(format!(
                "{}: unsupported mesh format (expected .stl or .obj)",
                path.display()
            )));
        }
    };

    log::info!(
        "Loaded mesh {}: {} vertices, {} triangles",
        path.display(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_read_mesh_by_extension() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("tri.OBJ");
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n")?;
        assert_eq!(read_mesh(&path, Material::Wood)?.triangle_count(), 1);

        let stl_path = dir.path().join("tri.stl");
        let mesh = read_mesh(&path, Material::Wood)?;
        write_stl(&stl_path, &mesh, "tri", StlFormat::Ascii)?;
        assert_eq!(read_mesh(&stl_path, Material::Wood)?.triangle_count(), 1);

        let err = read_mesh(&dir.path().join("scene.gltf"), Material::Wood).unwrap_err();
        assert!(matches!(err, Error::MeshLoad(_)));
        Ok(())
    }
}
