use thiserror::Error;

/// Failure taxonomy for cache, gateway and synchronizer operations.
///
/// `Network` covers an unreachable endpoint or a non-2xx response, `Storage`
/// covers local persistence failures, `NotFound` a mutation aimed at an id
/// absent from the current collection (a stale reference, not a transient
/// condition), and `Validation` a draft rejected before any remote call.
#[derive(Debug, Error)]
pub enum Error {
    #[error("network error: {0}")]
    Network(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("task {0} not found")]
    NotFound(u64),

    #[error("invalid task: {0}")]
    Validation(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
