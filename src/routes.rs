use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path as ReqPath, Query, Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{debug, Instrument};

use crate::data::comments::{Created, NewComment};
use crate::data::news::{Article, NewsStore, PageQuery, Pagination, SearchQuery};
use crate::data::thread::ThreadAssembler;
use crate::error::{Error, Result};
use crate::gateway::Gateway;

pub mod comments;
pub mod gateway;
pub mod news;

const REQUEST_ID: HeaderName = HeaderName::from_static("request_id");

#[derive(Clone)]
pub struct CommentState {
    pub threads: Arc<ThreadAssembler>,
}

#[derive(Clone)]
pub struct NewsState {
    pub news: Arc<NewsStore>,
}

#[derive(Clone)]
pub struct GatewayState {
    pub gateway: Gateway,
}

pub fn comment_router(state: CommentState) -> Router {
    Router::new()
        .route("/comments", get(comments::list_all))
        .route(
            "/comments/:id",
            get(comments::list_by_news).post(comments::add_comment),
        )
        .route("/comments/:id/thread", get(comments::thread))
        .route("/comments/:id/:slug", post(comments::add_reply))
        .layer(middleware::from_fn(request_id))
        .with_state(state)
}

pub fn news_router(state: NewsState) -> Router {
    Router::new()
        .route("/news", get(news::page).post(news::create))
        .route("/news/search", get(news::search))
        .route("/news/:id", get(news::article))
        .layer(middleware::from_fn(request_id))
        .with_state(state)
}

pub fn gateway_router(state: GatewayState) -> Router {
    Router::new()
        .route("/news", get(gateway::page))
        .route("/news/search", get(gateway::search))
        .route("/news/:id", get(gateway::article))
        .route("/comments/:id", post(gateway::add_comment))
        .route("/comments/:id/:slug", post(gateway::add_reply))
        .layer(middleware::from_fn(request_id))
        .with_state(state)
}

/// Tag each request with a fresh id, in its log span and its response headers.
async fn request_id(request: Request, next: Next) -> Response {
    let id = format!("{:032x}", rand::random::<u128>());
    let span = tracing::info_span!("request", id = %id);
    debug!(parent: &span, "{} {}", request.method(), request.uri());

    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID, value);
    }
    response
}

/// Parse an article id path segment.
pub(crate) fn news_id(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| Error::MalformedRequest(format!("invalid news id {raw:?}")))
}

/// Unwrap a JSON body, turning extractor rejections into [`Error::MalformedRequest`].
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(body)| body)
        .map_err(|rejection| Error::MalformedRequest(rejection.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn news_ids_must_be_integers() {
        assert_eq!(news_id("42").unwrap(), 42);
        assert!(matches!(news_id("abc"), Err(Error::MalformedRequest(_))));
    }
}
