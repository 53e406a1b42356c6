use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Failures of the comment store itself.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store file is not valid json: {0}")]
    Json(#[from] serde_json::Error),

    /// Every freshly minted slug collided with an existing one.
    #[error("could not mint a unique slug after {0} attempts")]
    SlugSpaceExhausted(usize),
}

/// Failures of a cache backend. Never surfaced to clients.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache backend is poisoned")]
    Poisoned,
}

/// Request-level failures, mapped onto HTTP responses at the boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// A backend call failed, timed out, or answered with garbage.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("no comment with slug {slug:?} under news {news_id}")]
    ParentNotFound { news_id: i64, slug: String },

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("storage fault: {0}")]
    StorageFault(#[from] StoreError),

    #[error("{0} not found")]
    NotFound(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::UpstreamUnavailable(err.to_string())
    }
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            Error::ParentNotFound { .. } => StatusCode::NOT_FOUND,
            Error::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            Error::StorageFault(_) => StatusCode::BAD_GATEWAY,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if let Error::StorageFault(err) = &self {
            tracing::error!("storage fault: {err}");
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_taxonomy() {
        let parent = Error::ParentNotFound {
            news_id: 1,
            slug: "abcd".to_owned(),
        };
        assert_eq!(parent.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::UpstreamUnavailable("down".to_owned()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            Error::MalformedRequest("limit".to_owned()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::from(StoreError::SlugSpaceExhausted(32)).status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
