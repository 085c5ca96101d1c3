//! Geocoder error types.

/// Errors from turning an address into coordinates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeocodeError {
    /// The service could not be reached
    #[error("geocoder unreachable: {message}")]
    Network { message: String },

    /// The service answered with a non-success status
    #[error("geocoder returned HTTP {status}")]
    Status { status: u16 },

    /// The service found nothing for the address
    #[error("no location found for the address")]
    NoResults,

    /// The response could not be understood
    #[error("malformed geocoder response: {message}")]
    Malformed { message: String },
}

impl GeocodeError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        GeocodeError::Malformed {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for GeocodeError {
    fn from(err: reqwest::Error) -> Self {
        GeocodeError::Network {
            message: err.to_string(),
        }
    }
}
