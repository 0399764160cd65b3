//! Threshold service client errors.

use aquagrow_domain::error::AquaGrowError;

/// Errors from talking to the farm configuration service.
#[derive(Debug, thiserror::Error)]
pub enum ThresholdHttpError {
    /// The configured base URL is not an absolute HTTP URL.
    #[error("invalid threshold service URL: {0}")]
    InvalidUrl(String),

    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("threshold request failed")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("threshold service error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body, for the logs.
        body: String,
    },

    /// The body was not a threshold document.
    #[error("failed to decode threshold response")]
    Decode(#[source] serde_json::Error),
}

impl ThresholdHttpError {
    /// Classify into the port-boundary error.
    ///
    /// Transport failures and error statuses mean the configuration is
    /// unavailable; an undecodable body means it is malformed.
    pub fn into_domain(self) -> AquaGrowError {
        match self {
            Self::Decode(_) => AquaGrowError::ConfigMalformed(Box::new(self)),
            Self::InvalidUrl(_) | Self::Request(_) | Self::Status { .. } => {
                AquaGrowError::ConfigUnavailable(Box::new(self))
            }
        }
    }
}

impl From<ThresholdHttpError> for AquaGrowError {
    fn from(err: ThresholdHttpError) -> Self {
        err.into_domain()
    }
}
