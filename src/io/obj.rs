//! Wavefront OBJ reader.
//!
//! Only geometry records are interpreted: `v` (vertex), `vn` (vertex normal),
//! `f` (face, fan-triangulated) and `usemtl` (material switch). Everything
//! else is skipped.

use crate::error::{Error, Result, try_reserve};
use crate::geom::mesh::Mesh;
use crate::sim::materials::Material;
use crate::{Point, Vector};
use std::path::Path;

/// Reads an OBJ file into a mesh.
///
/// Faces declared after `usemtl concrete|plastic|wood` are tagged with that
/// material. If any face is tagged, faces without a known material are tagged
/// with `fallback`. If no face is tagged, the mesh carries no material tags.
pub fn read_obj(path: &Path, fallback: Material) -> Result<Mesh> {
    let text = std::fs::read_to_string(path)?;
    log::debug!("Reading OBJ {}", path.display());
    parse_obj(&text, fallback).map_err(|e| match e {
        Error::MeshLoad(msg) => Error::MeshLoad(format!("{}: {msg}", path.display())),
        other => other,
    })
}

fn parse_obj(text: &str, fallback: Material) -> Result<Mesh> {
    let mut vertices: Vec<Point> = Vec::new();
    let mut normals: Vec<Vector> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut tags: Vec<Option<Material>> = Vec::new();
    let mut current: Option<Material> = None;

    for (lineno, line) in text.lines().enumerate() {
        let lineno = lineno + 1;
        let line = line.split('#').next().unwrap_or("");
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };

        match keyword {
            "v" => {
                let [x, y, z] = parse_triplet(&mut parts, lineno)?;
                try_reserve(&mut vertices, 1, "OBJ vertex buffer")?;
                vertices.push(Point::new(x, y, z));
            }
            "vn" => {
                let [x, y, z] = parse_triplet(&mut parts, lineno)?;
                try_reserve(&mut normals, 1, "OBJ normal buffer")?;
                normals.push(Vector::new(x, y, z));
            }
            "usemtl" => {
                let name = parts.next().unwrap_or("");
                current = Material::from_name(name);
                if current.is_none() {
                    log::warn!("line {lineno}: unknown material '{name}', using {fallback}");
                }
            }
            "f" => {
                let face = parts
                    .map(|tok| parse_face_index(tok, vertices.len(), lineno))
                    .collect::<Result<Vec<u32>>>()?;
                if face.len() < 3 {
                    return Err(Error::MeshLoad(format!(
                        "line {lineno}: face has {} vertices",
                        face.len()
                    )));
                }
                // Fan triangulation around the first vertex
                let fan = face.len() - 2;
                try_reserve(&mut indices, fan * 3, "OBJ index buffer")?;
                try_reserve(&mut tags, fan, "OBJ material tags")?;
                for k in 1..face.len() - 1 {
                    indices.extend([face[0], face[k], face[k + 1]]);
                    tags.push(current);
                }
            }
            _ => {}
        }
    }

    let mut mesh = Mesh::new(vertices, indices)?;
    if normals.len() == mesh.vertex_count() && !normals.is_empty() {
        mesh = mesh.with_normals(normals)?;
    }
    if tags.iter().any(Option::is_some) {
        let materials = tags.into_iter().map(|t| t.unwrap_or(fallback)).collect();
        mesh = mesh.with_triangle_materials(materials)?;
    }
    Ok(mesh)
}

fn parse_triplet<'a>(parts: &mut impl Iterator<Item = &'a str>, lineno: usize) -> Result<[f64; 3]> {
    let mut out = [0.0; 3];
    for slot in out.iter_mut() {
        *slot = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::MeshLoad(format!("line {lineno}: expected 3 numbers")))?;
    }
    Ok(out)
}

/// Parses the vertex part of a face token (`7`, `7/1`, `7//3`, `-1`).
///
/// OBJ indices are 1-based. Negative indices count back from the most
/// recent vertex.
fn parse_face_index(token: &str, vertex_count: usize, lineno: usize) -> Result<u32> {
    let head = token.split('/').next().unwrap_or("");
    let raw: i64 = head
        .parse()
        .map_err(|_| Error::MeshLoad(format!("line {lineno}: invalid face index '{token}'")))?;

    let idx = if raw > 0 {
        raw - 1
    } else {
        vertex_count as i64 + raw
    };
    if raw == 0 || idx < 0 || idx >= vertex_count as i64 {
        return Err(Error::MeshLoad(format!(
            "line {lineno}: face index {raw} out of range (vertex count {vertex_count})"
        )));
    }
    u32::try_from(idx)
        .map_err(|_| Error::MeshLoad(format!("line {lineno}: face index {raw} too large")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# unit quad in the xy plane
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";

    #[test]
    fn test_quad_fan_triangulation() {
        let mesh = parse_obj(QUAD, Material::Concrete).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices(), &[0, 1, 2, 0, 2, 3]);
        assert!(mesh.triangle_materials().is_none());
        assert!(mesh.normals().is_none());
    }

    #[test]
    fn test_usemtl_tags() {
        let text = "\
v 0 0 0
v 1 0 0
v 0 1 0
v 0 0 1
usemtl wood
f 1 2 3
usemtl marble
f 1 2 4
usemtl Plastic
f 1/1/1 3//2 -1
";
        let mesh = parse_obj(text, Material::Concrete).unwrap();
        assert_eq!(mesh.triangle_count(), 3);
        assert_eq!(
            mesh.triangle_materials().unwrap(),
            &[Material::Wood, Material::Concrete, Material::Plastic]
        );
        assert_eq!(&mesh.indices()[6..], &[0, 2, 3]);
    }

    #[test]
    fn test_normals_kept_when_one_per_vertex() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nvn 0 0 1\nvn 0 0 1\nf 1 2 3\n";
        let mesh = parse_obj(text, Material::Concrete).unwrap();
        assert_eq!(mesh.normals().map(|n| n.len()), Some(3));
    }

    #[test]
    fn test_bad_records() {
        let err = parse_obj("v 0 0\n", Material::Wood).unwrap_err();
        assert!(matches!(err, Error::MeshLoad(_)));

        let err = parse_obj("v 0 0 0\nv 1 0 0\nf 1 2\n", Material::Wood).unwrap_err();
        assert!(matches!(err, Error::MeshLoad(_)));

        let err = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 5\n", Material::Wood).unwrap_err();
        assert!(matches!(err, Error::MeshLoad(_)));

        let err = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n", Material::Wood).unwrap_err();
        assert!(matches!(err, Error::MeshLoad(_)));
    }

    #[test]
    fn test_read_obj_from_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("quad.obj");
        std::fs::write(&path, QUAD)?;

        let mesh = read_obj(&path, Material::Concrete)?;
        assert_eq!(mesh.triangle_count(), 2);

        let missing = read_obj(&dir.path().join("nope.obj"), Material::Concrete);
        assert!(matches!(missing, Err(Error::Io(_))));
        Ok(())
    }
}
