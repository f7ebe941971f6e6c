//! Input resolution: uploads and remote URLs into staged bytes.
//!
//! Format detection runs before any network traffic, so a bad suffix never
//! costs a fetch.

use crate::error::{Result, ServiceError};
use crate::staging::StagedBytes;
use preview::MeshFormat;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

/// Where the mesh bytes come from.
#[derive(Debug)]
pub enum MeshSource {
    /// A file uploaded with the request.
    Upload { filename: String, bytes: Vec<u8> },
    /// A URL to fetch the file from.
    RemoteUrl(String),
}

/// Limits applied while fetching remote files.
#[derive(Debug, Clone)]
pub struct FetchLimits {
    /// Timeout covering the whole fetch, connect through last byte.
    pub timeout: Duration,
    /// Maximum accepted payload size in bytes.
    pub max_bytes: u64,
}

/// A staged mesh and its detected format.
#[derive(Debug)]
pub struct ResolvedMesh {
    pub format: MeshFormat,
    pub bytes: StagedBytes,
}

/// Resolve a source into staged bytes plus format.
///
/// The file suffix decides the format in both cases. Uploaded bytes stay in
/// memory; remote files stream to a temp spool with `limits.max_bytes`
/// enforced as the download progresses.
pub async fn resolve(
    source: MeshSource,
    http: &reqwest::Client,
    limits: &FetchLimits,
) -> Result<ResolvedMesh> {
    match source {
        MeshSource::Upload { filename, bytes } => {
            if filename.is_empty() {
                return Err(ServiceError::InvalidInput("no file selected".into()));
            }
            let format = detect_format(&filename)?;
            Ok(ResolvedMesh {
                format,
                bytes: StagedBytes::Memory(bytes),
            })
        }
        MeshSource::RemoteUrl(url) => {
            if url.is_empty() {
                return Err(ServiceError::InvalidInput("no file url provided".into()));
            }
            let format = detect_format(url_file_name(&url))?;
            let bytes = fetch_to_spool(&url, http, limits).await?;
            Ok(ResolvedMesh { format, bytes })
        }
    }
}

fn detect_format(name: &str) -> Result<MeshFormat> {
    MeshFormat::from_name(name).ok_or_else(|| ServiceError::UnsupportedFormat(name.to_string()))
}

/// The URL without query or fragment, for suffix detection.
fn url_file_name(url: &str) -> &str {
    let end = url.find(|c| c == '?' || c == '#').unwrap_or(url.len());
    &url[..end]
}

/// Stream a remote file into a spool, enforcing the size cap as bytes arrive.
async fn fetch_to_spool(
    url: &str,
    http: &reqwest::Client,
    limits: &FetchLimits,
) -> Result<StagedBytes> {
    let mut response = http
        .get(url)
        .timeout(limits.timeout)
        .send()
        .await
        .map_err(fetch_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(ServiceError::FetchFailed(format!(
            "remote returned {status}"
        )));
    }

    // Reject declared oversizes up front; the streaming check below covers
    // responses that lie or omit the header.
    if let Some(declared) = response.content_length() {
        if declared > limits.max_bytes {
            return Err(too_large(limits.max_bytes));
        }
    }

    let mut spool = NamedTempFile::new()
        .map_err(|e| ServiceError::FetchFailed(format!("failed to create spool file: {e}")))?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await.map_err(fetch_error)? {
        written += chunk.len() as u64;
        if written > limits.max_bytes {
            return Err(too_large(limits.max_bytes));
        }
        spool
            .write_all(&chunk)
            .map_err(|e| ServiceError::FetchFailed(format!("failed to spool download: {e}")))?;
    }

    Ok(StagedBytes::Spooled {
        file: spool,
        len: written,
    })
}

fn fetch_error(err: reqwest::Error) -> ServiceError {
    let reason = if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    };
    ServiceError::FetchFailed(reason)
}

fn too_large(max: u64) -> ServiceError {
    ServiceError::FetchFailed(format!("remote file exceeds the {max} byte limit"))
}
