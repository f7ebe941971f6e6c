//! Mesh decoding behind a single seam.
//!
//! STL goes through `stl_io`, OBJ through `tobj`; both normalize into
//! [`TriMesh`] so the rasterizer never sees parser-specific types.

use crate::error::{PreviewError, Result};
use crate::format::MeshFormat;
use crate::mesh::TriMesh;
use glam::Vec3;
use std::fmt;
use std::io::{BufReader, Read, Seek};

/// Decode mesh bytes in the given format.
///
/// Parser rejections map to [`PreviewError::DecodeFailed`]. Input that
/// parses but contains no triangles comes back as an empty [`TriMesh`];
/// the caller decides how to treat emptiness.
pub fn decode<R: Read + Seek>(reader: &mut R, format: MeshFormat) -> Result<TriMesh> {
    match format {
        MeshFormat::Stl => decode_stl(reader),
        MeshFormat::Obj => decode_obj(reader),
    }
}

fn decode_stl<R: Read + Seek>(reader: &mut R) -> Result<TriMesh> {
    let stl = stl_io::read_stl(reader).map_err(|e| decode_error(MeshFormat::Stl, e))?;
    // Catches out-of-range face indices before they can panic the rasterizer.
    stl.validate().map_err(|e| decode_error(MeshFormat::Stl, e))?;

    let positions = stl
        .vertices
        .iter()
        .map(|v| Vec3::new(v[0], v[1], v[2]))
        .collect();
    let faces = stl
        .faces
        .iter()
        .map(|f| {
            [
                f.vertices[0] as u32,
                f.vertices[1] as u32,
                f.vertices[2] as u32,
            ]
        })
        .collect();

    Ok(TriMesh { positions, faces })
}

fn decode_obj<R: Read + Seek>(reader: &mut R) -> Result<TriMesh> {
    let mut buf = BufReader::new(reader);
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    };
    // No material resolution: previews are shaded with a fixed surface color.
    let (models, _materials) = tobj::load_obj_buf(&mut buf, &options, |_| Ok(Default::default()))
        .map_err(|e| decode_error(MeshFormat::Obj, e))?;

    let mut mesh = TriMesh::default();
    for model in models {
        let m = model.mesh;
        let base = mesh.positions.len() as u32;
        mesh.positions
            .extend(m.positions.chunks_exact(3).map(|p| Vec3::new(p[0], p[1], p[2])));
        for tri in m.indices.chunks_exact(3) {
            mesh.faces.push([base + tri[0], base + tri[1], base + tri[2]]);
        }
    }

    Ok(mesh)
}

fn decode_error(format: MeshFormat, err: impl fmt::Display) -> PreviewError {
    PreviewError::DecodeFailed {
        format,
        reason: err.to_string(),
    }
}
