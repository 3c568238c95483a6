use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::error::Error;
use std::fmt;

/// Failures reported by a [`Store`](crate::store::Store) or by the operation
/// context a store call runs under.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The operation's time budget elapsed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
    /// The operation was abandoned, usually because the client went away.
    #[error("context canceled")]
    Canceled,
    #[error("{0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid stored payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// True for the errors produced by an expired or cancelled [`OpContext`](crate::context::OpContext).
    pub fn is_cancellation(&self) -> bool {
        matches!(self, StoreError::DeadlineExceeded | StoreError::Canceled)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The error type returned by HTTP handlers.
///
/// Every variant renders as a plain-text body terminated by a newline, so
/// clients see the same shape whether the request was rejected up front or
/// failed in the store.
#[derive(Debug)]
pub enum AppError {
    /// Malformed payload or an unrecognized filter value.
    BadRequest(String),
    /// The operation deadline fired before the store answered.
    Timeout,
    /// Any other failure reported by the store.
    Store(StoreError),
    /// Failures outside the store, such as response encoding.
    Internal(anyhow::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "{}", msg),
            AppError::Timeout => write!(f, "Request timed out"),
            AppError::Store(e) => write!(f, "{}", e),
            AppError::Internal(e) => write!(f, "Internal error: {}", e),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Store(e) => Some(e),
            AppError::Internal(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn invalid_payload() -> Self {
        AppError::BadRequest("Invalid request payload".to_string())
    }

    pub fn invalid_asset_type() -> Self {
        AppError::BadRequest("invalid asset type".to_string())
    }
}

/// Builds a plain-text error response the way `net/http`-style servers do:
/// the message followed by a newline, never sniffed as HTML.
pub fn text_error(status: StatusCode, message: &str) -> Response {
    let mut res = (status, format!("{}\n", message)).into_response();
    let headers = res.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    res
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                msg.clone()
            }
            AppError::Timeout => {
                tracing::warn!("Request timed out");
                self.to_string()
            }
            AppError::Store(e) => {
                tracing::error!("Error on executing the query: {}", e);
                e.to_string()
            }
            AppError::Internal(e) => {
                let error_id = uuid::Uuid::new_v4();
                tracing::error!(%error_id, "Internal error: {:?}", e);
                format!("An internal server error occurred (error id {})", error_id)
            }
        };
        text_error(status, &message)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        if err.is_cancellation() {
            AppError::Timeout
        } else {
            AppError::Store(err)
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

/// A type alias for `Result<T, AppError>`, used throughout the handlers.
pub type AppResult<T> = Result<T, AppError>;
