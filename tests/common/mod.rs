#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use axum::Router;
use newsdesk::data::{
    Article, CommentStore, MemoryCache, NewsStore, ThreadAssembler, ThreadCache,
};
use newsdesk::gateway::Gateway;
use newsdesk::routes::{self, CommentState, GatewayState, NewsState};
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral port and return its base url.
pub async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// A base url nothing listens on.
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub async fn comment_service() -> String {
    let threads = ThreadAssembler::new(
        Arc::new(CommentStore::in_memory()),
        Arc::new(ThreadCache::new(MemoryCache::new())),
    );
    serve(routes::comment_router(CommentState {
        threads: Arc::new(threads),
    }))
    .await
}

pub fn article(id: i64, title: &str) -> Article {
    Article {
        id,
        title: title.to_owned(),
        content: format!("{title} body"),
        pub_time: 1_700_000_000 + id,
        link: format!("https://example.com/{id}"),
    }
}

pub async fn news_service(articles: Vec<Article>) -> String {
    serve(routes::news_router(NewsState {
        news: Arc::new(NewsStore::in_memory(articles)),
    }))
    .await
}

pub async fn gateway(news_url: &str, comments_url: &str) -> String {
    let gateway = Gateway::new(news_url, comments_url, Duration::from_secs(5)).unwrap();
    serve(routes::gateway_router(GatewayState { gateway })).await
}
