//! Catalog error types.

/// Errors that can occur while refreshing or persisting the station catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The catalog source could not be reached or answered with an error status
    #[error("network error: {message}")]
    Network { message: String },

    /// The catalog document could not be understood
    #[error("malformed catalog: {message}")]
    Format { message: String },

    /// Reading or writing the local cache file failed
    #[error("cache error: {message}")]
    Cache { message: String },
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network {
            message: err.to_string(),
        }
    }
}
