//! Mesh preview rendering library
//!
//! Turns STL/OBJ bytes into shaded PNG previews without a GPU:
//! - **format**: supported formats, detected from file name suffixes
//! - **decode**: parsers normalized into a single triangle mesh type
//! - **framing**: bounding-sphere camera fit on a fixed orbit
//! - **raster**: z-buffered edge-function rasterizer with flat shading
//! - **render**: the end-to-end pipeline producing encoded PNG bytes
//!
//! The pipeline is synchronous and holds no state between calls; callers
//! that need concurrency limits apply them a level above.

pub mod config;
pub mod decode;
pub mod error;
pub mod format;
pub mod framing;
pub mod lighting;
pub mod mesh;
pub mod raster;
pub mod render;

// Re-export the types most callers need at crate root
pub use config::{RenderConfig, DEFAULT_RESOLUTION};
pub use error::{PreviewError, Result};
pub use format::MeshFormat;
pub use mesh::{Bounds, TriMesh};
pub use render::{render_preview, render_preview_bytes, PreviewImage};
