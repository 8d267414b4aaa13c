//! STL file format I/O.
//!
//! STL (STereoLithography) stores raw triangles with facet normals. Vertices
//! shared between facets are deduplicated on read so the resulting [`Mesh`]
//! uses an indexed triangle list.

use crate::error::{Error, Result, try_reserve};
use crate::geom::mesh::Mesh;
use crate::{Point, Vector};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// STL file format variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StlFormat {
    /// ASCII text format (human-readable, larger file size)
    Ascii,
    /// Binary format (compact, faster to read/write)
    Binary,
}

const BINARY_HEADER_LEN: usize = 80;
const BINARY_FACET_LEN: usize = 50;

/// Reads an STL file (ASCII or binary) into a mesh.
///
/// A file is treated as binary when its size matches the facet count stored
/// in the binary header, since some binary exporters also start the header
/// with `solid`.
pub fn read_stl(path: &Path) -> Result<Mesh> {
    let bytes = std::fs::read(path)?;
    log::debug!("Reading STL {} ({} bytes)", path.display(), bytes.len());

    if looks_binary(&bytes) {
        read_stl_binary(&bytes)
    } else if bytes.trim_ascii_start().starts_with(b"solid") {
        let text = std::str::from_utf8(&bytes)
            .map_err(|e| Error::MeshLoad(format!("{}: not valid UTF-8: {e}", path.display())))?;
        read_stl_ascii(text)
    } else {
        Err(Error::MeshLoad(format!(
            "{}: neither ASCII nor binary STL",
            path.display()
        )))
    }
}

fn looks_binary(bytes: &[u8]) -> bool {
    let Some(count) = bytes.get(BINARY_HEADER_LEN..BINARY_HEADER_LEN + 4) else {
        return false;
    };
    let count = u32::from_le_bytes([count[0], count[1], count[2], count[3]]) as usize;
    count
        .checked_mul(BINARY_FACET_LEN)
        .and_then(|n| n.checked_add(BINARY_HEADER_LEN + 4))
        == Some(bytes.len())
}

fn read_stl_ascii(text: &str) -> Result<Mesh> {
    let mut builder = DedupBuilder::default();
    let mut current: Vec<Point> = Vec::with_capacity(3);

    for (lineno, line) in text.lines().enumerate() {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("vertex") => {
                let mut coord = || -> Result<f64> {
                    parts
                        .next()
                        .and_then(|s| s.parse().ok())
                        .ok_or_else(|| {
                            Error::MeshLoad(format!("line {}: invalid vertex", lineno + 1))
                        })
                };
                let (x, y, z) = (coord()?, coord()?, coord()?);
                current.push(Point::new(x, y, z));
            }
            Some("endloop") => {
                if current.len() != 3 {
                    return Err(Error::MeshLoad(format!(
                        "line {}: facet has {} vertices, expected 3",
                        lineno + 1,
                        current.len()
                    )));
                }
                builder.push_triangle([current[0], current[1], current[2]])?;
                current.clear();
            }
            _ => {}
        }
    }

    builder.finish()
}

fn read_stl_binary(bytes: &[u8]) -> Result<Mesh> {
    let facets = &bytes[BINARY_HEADER_LEN + 4..];
    let mut builder = DedupBuilder::default();

    for facet in facets.chunks_exact(BINARY_FACET_LEN) {
        // Skip the stored normal (12 bytes) and the trailing attribute count
        let read_point = |offset: usize| {
            let f = |o: usize| {
                f32::from_le_bytes([facet[o], facet[o + 1], facet[o + 2], facet[o + 3]]) as f64
            };
            Point::new(f(offset), f(offset + 4), f(offset + 8))
        };
        builder.push_triangle([read_point(12), read_point(24), read_point(36)])?;
    }

    builder.finish()
}

const STL_DEDUP_SCALE: f64 = 1e9;

/// Collects triangles while merging vertices that coincide up to
/// `1 / STL_DEDUP_SCALE`.
#[derive(Default)]
struct DedupBuilder {
    vertices: Vec<Point>,
    indices: Vec<u32>,
    map: HashMap<(i64, i64, i64), u32>,
}

impl DedupBuilder {
    fn push_triangle(&mut self, tri: [Point; 3]) -> Result<()> {
        try_reserve(&mut self.indices, 3, "STL index buffer")?;
        for p in tri {
            let idx = self.vertex_index(p)?;
            self.indices.push(idx);
        }
        Ok(())
    }

    fn vertex_index(&mut self, p: Point) -> Result<u32> {
        let key = (
            (p.x * STL_DEDUP_SCALE).round() as i64,
            (p.y * STL_DEDUP_SCALE).round() as i64,
            (p.z * STL_DEDUP_SCALE).round() as i64,
        );
        if let Some(&idx) = self.map.get(&key) {
            return Ok(idx);
        }
        let idx = u32::try_from(self.vertices.len())
            .map_err(|_| Error::MeshLoad("too many vertices for a u32 index".to_string()))?;
        try_reserve(&mut self.vertices, 1, "STL vertex buffer")?;
        self.vertices.push(p);
        self.map.insert(key, idx);
        Ok(idx)
    }

    fn finish(self) -> Result<Mesh> {
        Mesh::new(self.vertices, self.indices)
    }
}

/// Writes a mesh to an STL file.
pub fn write_stl(path: &Path, mesh: &Mesh, name: &str, format: StlFormat) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let triangles = mesh.triangles()?;

    match format {
        StlFormat::Ascii => {
            writeln!(writer, "solid {name}")?;
            for tri in &triangles {
                let n = facet_normal(tri.normal());
                writeln!(writer, "  facet normal {} {} {}", n.dx, n.dy, n.dz)?;
                writeln!(writer, "    outer loop")?;
                for p in tri.vertices {
                    writeln!(writer, "      vertex {} {} {}", p.x, p.y, p.z)?;
                }
                writeln!(writer, "    endloop")?;
                writeln!(writer, "  endfacet")?;
            }
            writeln!(writer, "endsolid {name}")?;
        }
        StlFormat::Binary => {
            let mut header = [0u8; BINARY_HEADER_LEN];
            let label = format!("binary STL - {name}");
            let len = label.len().min(BINARY_HEADER_LEN);
            header[..len].copy_from_slice(&label.as_bytes()[..len]);
            writer.write_all(&header)?;
            writer.write_all(&(triangles.len() as u32).to_le_bytes())?;

            for tri in &triangles {
                let n = facet_normal(tri.normal());
                let mut values = vec![n.dx, n.dy, n.dz];
                for p in tri.vertices {
                    values.extend([p.x, p.y, p.z]);
                }
                for v in values {
                    writer.write_all(&(v as f32).to_le_bytes())?;
                }
                writer.write_all(&0u16.to_le_bytes())?;
            }
        }
    }

    writer.flush()?;
    Ok(())
}

fn facet_normal(n: Vector) -> Vector {
    if n == Vector::zero() {
        Vector::new(0.0, 0.0, 1.0)
    } else {
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResultCode;
    use anyhow::Result;
    use tempfile::tempdir;

    fn create_test_mesh() -> Mesh {
        // Simple tetrahedron
        let vertices = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.5, 1.0, 0.0),
            Point::new(0.5, 0.5, 1.0),
        ];
        let indices = vec![0, 1, 2, 0, 1, 3, 1, 2, 3, 2, 0, 3];
        Mesh::new(vertices, indices).unwrap()
    }

    #[test]
    fn test_write_stl_ascii() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("test.stl");

        write_stl(&path, &create_test_mesh(), "test", StlFormat::Ascii)?;

        let content = std::fs::read_to_string(&path)?;
        assert!(content.contains("solid test"));
        assert!(content.contains("facet normal"));
        assert!(content.contains("endsolid test"));
        Ok(())
    }

    #[test]
    fn test_write_stl_binary_size() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("test.stl");

        write_stl(&path, &create_test_mesh(), "test", StlFormat::Binary)?;

        // 80 header + 4 count + 4 triangles * 50 bytes
        let metadata = std::fs::metadata(&path)?;
        assert_eq!(metadata.len(), 80 + 4 + 4 * 50);
        Ok(())
    }

    #[test]
    fn test_read_stl_both_formats() -> Result<()> {
        let dir = tempdir()?;
        let original = create_test_mesh();

        for format in [StlFormat::Ascii, StlFormat::Binary] {
            let path = dir.path().join(format!("{format:?}.stl"));
            write_stl(&path, &original, "tetra", format)?;

            let loaded = read_stl(&path)?;
            assert_eq!(loaded.triangle_count(), original.triangle_count());
            // Vertices are deduplicated
            assert_eq!(loaded.vertex_count(), original.vertex_count());
            assert_eq!(loaded.bounding_box(), original.bounding_box());
        }
        Ok(())
    }

    #[test]
    fn test_binary_header_starting_with_solid() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("solid_header.stl");

        write_stl(&path, &create_test_mesh(), "x", StlFormat::Binary)?;
        let mut bytes = std::fs::read(&path)?;
        bytes[..5].copy_from_slice(b"solid");
        std::fs::write(&path, &bytes)?;

        assert_eq!(read_stl(&path)?.triangle_count(), 4);
        Ok(())
    }

    #[test]
    fn test_read_errors() -> Result<()> {
        let dir = tempdir()?;

        let missing = read_stl(&dir.path().join("missing.stl")).unwrap_err();
        assert_eq!(missing.code(), ResultCode::Load);

        let path = dir.path().join("bad.stl");
        std::fs::write(
            &path,
            "solid bad\n facet normal 0 0 1\n outer loop\n vertex 0 0 zz\n",
        )?;
        let err = read_stl(&path).unwrap_err();
        assert!(matches!(err, Error::MeshLoad(_)));

        let path = dir.path().join("garbage.stl");
        std::fs::write(&path, "hello")?;
        assert!(matches!(read_stl(&path).unwrap_err(), Error::MeshLoad(_)));
        Ok(())
    }
}
