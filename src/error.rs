use axum::http::StatusCode;
use thiserror::Error;

/// Everything that can go wrong while validating or executing a driver.
///
/// Each variant knows the HTTP status it is reported with, see [`DriverError::status_code`].
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("can't process config: {0}")]
    ConfigShape(String),

    #[error("{0} not provided")]
    MissingConfigField(&'static str),

    #[error("invalid tag {0:?}: must start with a word character followed by word characters, '.' or '-'")]
    InvalidTag(String),

    #[error("webhook body should be a JSON object")]
    BadRequestShape,

    #[error("webhook body is missing {0}")]
    MissingField(&'static str),

    #[error("invalid service url {url:?}: {reason}")]
    Configuration { url: String, reason: String },

    /// Network failures and non-2xx responses from the cluster proxy.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("response from {url} is not a deployment: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("container {container} not found in deployment {deployment}")]
    ContainerNotFound {
        container: String,
        deployment: String,
    },

    #[error("can't convert config {0}")]
    UnconvertibleConfig(String),
}

impl DriverError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DriverError::MissingConfigField(_)
            | DriverError::InvalidTag(_)
            | DriverError::BadRequestShape
            | DriverError::MissingField(_)
            | DriverError::Configuration { .. } => StatusCode::BAD_REQUEST,
            DriverError::ContainerNotFound { .. } => StatusCode::NOT_FOUND,
            DriverError::ConfigShape(_)
            | DriverError::Transport { .. }
            | DriverError::Decode { .. }
            | DriverError::UnconvertibleConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
