use preview::PreviewError;
use thiserror::Error;

/// Request-level errors, each with a fixed HTTP status mapping.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Required input was missing or unreadable.
    #[error("{0}")]
    InvalidInput(String),
    /// The file name or URL does not end in a supported mesh suffix.
    #[error("unsupported file type {0:?}; expected .stl or .obj")]
    UnsupportedFormat(String),
    /// The remote source could not be fetched.
    #[error("failed to fetch remote file: {0}")]
    FetchFailed(String),
    /// Decode, emptiness, or render failures from the pipeline.
    #[error(transparent)]
    Preview(#[from] PreviewError),
}

impl ServiceError {
    /// HTTP status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            ServiceError::InvalidInput(_) => 400,
            ServiceError::UnsupportedFormat(_) => 415,
            ServiceError::FetchFailed(_) => 502,
            ServiceError::Preview(PreviewError::DecodeFailed { .. }) => 422,
            ServiceError::Preview(PreviewError::EmptyMesh { .. }) => 422,
            ServiceError::Preview(PreviewError::RenderFailed(_)) => 500,
        }
    }

    /// True when the failure is the caller's fault (4xx).
    pub fn is_client_error(&self) -> bool {
        self.status() < 500
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
