use crate::format::MeshFormat;
use thiserror::Error;

/// Errors produced while turning mesh bytes into a preview image.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// The bytes could not be parsed as the claimed format.
    #[error("failed to decode {format} data: {reason}")]
    DecodeFailed { format: MeshFormat, reason: String },

    /// The input parsed cleanly but contains nothing to draw.
    #[error("mesh has no renderable geometry ({vertices} vertices, {faces} faces)")]
    EmptyMesh { vertices: usize, faces: usize },

    /// Rasterization or image encoding failed.
    #[error("failed to produce preview image: {0}")]
    RenderFailed(String),
}

pub type Result<T> = std::result::Result<T, PreviewError>;
