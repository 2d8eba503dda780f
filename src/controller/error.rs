//! Error types for cluster lifecycle operations

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors returned by the lifecycle operations, mapped onto HTTP statuses
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid json")]
    InvalidJson,

    #[error("{0}")]
    ValidationError(String),

    #[error("missing name param")]
    MissingName,

    /// A control-plane call failed; `context` is the label shown to callers
    #[error("{context}: {source}")]
    KubeError {
        context: &'static str,
        #[source]
        source: kube::Error,
    },

    /// The PostgresCluster does not exist
    #[error("not found: {0}")]
    NotFound(#[source] kube::Error),

    #[error("{condition} not created by operator in time")]
    RequiredConditionTimeout {
        condition: &'static str,
        attempts: u32,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl Error {
    /// Attach a context label to a control-plane error
    pub fn kube(context: &'static str) -> impl FnOnce(kube::Error) -> Error {
        move |source| Error::KubeError { context, source }
    }

    /// HTTP status reported for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidJson | Error::ValidationError(_) | Error::MissingName => {
                StatusCode::BAD_REQUEST
            }
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::KubeError { .. }
            | Error::RequiredConditionTimeout { .. }
            | Error::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for request metrics
    pub fn outcome(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "client_error",
            StatusCode::NOT_FOUND => "not_found",
            _ => "server_error",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

/// Check if a kube error is an API 404
pub fn is_not_found(e: &kube::Error) -> bool {
    matches!(e, kube::Error::Api(resp) if resp.code == 404)
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
