use std::{future::Future, time::Duration};

/// Errors returned by [`crate::Api`] calls.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested resource does not exist.
    #[error("{0} not found")]
    NotFound(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The API answered with an unexpected status.
    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Bounds a single API call so that a stalled call fails only the sub-unit
/// that issued it.
pub(crate) async fn bounded<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, Error>>,
) -> Result<T, Error> {
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| Error::Timeout(timeout))?
}
