//! Adapter error types.

use thiserror::Error;

/// Result type alias for adapter calls.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Exceptional failures talking to a backend.
///
/// Capacity refusals are not errors; they come back as
/// [`Reservation::Rejected`](crate::Reservation::Rejected).
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    #[error("backend error: {0}")]
    Backend(String),
}
