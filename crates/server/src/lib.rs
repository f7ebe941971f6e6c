//! Mesh preview server crate.
//!
//! This crate wraps the `preview` rendering library in a small HTTP service.
//! The modules exposed here cover request parsing, input resolution
//! (uploads and remote fetches), staging of mesh bytes, and the async
//! accept loop that ties them together.

pub mod config;
pub mod error;
pub mod http;
pub mod multipart;
pub mod resolve;
pub mod server;
pub mod staging;

pub use config::ServiceConfig;
pub use error::{Result, ServiceError};
pub use resolve::{FetchLimits, MeshSource, ResolvedMesh};
pub use server::PreviewServer;
pub use staging::{StagedBytes, StagedReader};
