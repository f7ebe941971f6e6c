//! End-to-end preview pipeline: decode, frame, rasterize, encode.

use crate::config::RenderConfig;
use crate::decode;
use crate::error::{PreviewError, Result};
use crate::format::MeshFormat;
use crate::raster;
use std::io::{Cursor, Read, Seek};
use std::time::Instant;

/// An encoded PNG preview.
#[derive(Debug, Clone)]
pub struct PreviewImage {
    png: Vec<u8>,
    width: u32,
    height: u32,
}

impl PreviewImage {
    /// Encoded PNG bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.png
    }

    /// Consume the preview, returning the PNG bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.png
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// MIME type of the encoded bytes.
    pub fn content_type() -> &'static str {
        "image/png"
    }
}

/// Render a preview image from a mesh byte stream.
///
/// Decodes the stream as `format`, rejects meshes with no geometry,
/// rasterizes through a camera fitted to the mesh bounds, and encodes the
/// result as PNG.
///
/// # Arguments
/// * `input` - Seekable stream of raw mesh bytes
/// * `format` - Format the bytes claim to be
/// * `config` - Output size, framing, and shading parameters
///
/// # Returns
/// The encoded preview, or the first pipeline error.
pub fn render_preview<R: Read + Seek>(
    input: &mut R,
    format: MeshFormat,
    config: &RenderConfig,
) -> Result<PreviewImage> {
    let started = Instant::now();

    let mesh = decode::decode(input, format)?;
    if mesh.is_empty() {
        return Err(PreviewError::EmptyMesh {
            vertices: mesh.positions.len(),
            faces: mesh.faces.len(),
        });
    }
    tracing::debug!(
        "decoded {} mesh: {} vertices, {} faces",
        format,
        mesh.positions.len(),
        mesh.faces.len()
    );

    let image = raster::rasterize(&mesh, config);
    let (width, height) = image.dimensions();

    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, image::ImageFormat::Png)
        .map_err(|e| PreviewError::RenderFailed(format!("png encoding: {e}")))?;

    tracing::debug!(
        "rendered {}x{} preview in {}ms",
        width,
        height,
        started.elapsed().as_millis()
    );

    Ok(PreviewImage {
        png: png.into_inner(),
        width,
        height,
    })
}

/// [`render_preview`] over an in-memory byte slice.
pub fn render_preview_bytes(
    bytes: &[u8],
    format: MeshFormat,
    config: &RenderConfig,
) -> Result<PreviewImage> {
    render_preview(&mut Cursor::new(bytes), format, config)
}
