// Error taxonomy for the tracking console
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackingError {
    /// Backend unreachable or answered with an unexpected status
    #[error("network error: {0}")]
    Network(String),

    /// No telemetry or summary exists yet for a valid id
    #[error("not found: {0}")]
    NotFound(String),

    #[error("request timed out after {0} ms")]
    Timeout(u64),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("could not decode backend response: {0}")]
    Decode(String),

    #[error("session storage error: {0}")]
    Storage(String),
}

impl TrackingError {
    /// Failures the poller retries on its next tick.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout(_) | Self::Decode(_)
        )
    }
}

pub type TrackingResult<T> = Result<T, TrackingError>;
