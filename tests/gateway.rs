mod common;

use std::time::{Duration, Instant};

use axum::http::StatusCode as AxumStatus;
use axum::routing::get;
use axum::{Json, Router};
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn get_json(url: String) -> (StatusCode, Value) {
    let response = reqwest::get(url).await.unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn article_arrives_with_its_comments() {
    let news = common::news_service(vec![common::article(1, "Rust"), common::article(2, "Go")]).await;
    let comments = common::comment_service().await;
    let gateway = common::gateway(&news, &comments).await;

    let client = reqwest::Client::new();
    let created = client
        .post(format!("{gateway}/comments/1"))
        .json(&json!({ "author": "alice", "text": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let created: Value = created.json().await.unwrap();

    let (status, body) = get_json(format!("{gateway}/news/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], 1);
    assert_eq!(body[0]["title"], "Rust");
    assert_eq!(body[0]["comment"][0]["author"], "alice");
    assert_eq!(body[0]["comment"][0]["slug"], created["slug"]);

    let (_, other) = get_json(format!("{gateway}/news/2")).await;
    assert_eq!(other[0]["comment"], json!([]));
}

#[tokio::test]
async fn failing_comment_backend_fails_the_whole_read() {
    let news = common::news_service(vec![common::article(1, "Rust")]).await;
    let broken = common::serve(Router::new().route(
        "/comments/:id",
        get(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "boom") }),
    ))
    .await;
    let gateway = common::gateway(&news, &broken).await;

    let (status, body) = get_json(format!("{gateway}/news/1")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.get("error").is_some());
    assert!(body.get("title").is_none());
}

#[tokio::test]
async fn comment_failure_does_not_wait_for_slow_article_backend() {
    let slow = common::serve(Router::new().route(
        "/news/:id",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(vec![common::article(1, "Rust")])
        }),
    ))
    .await;
    let broken = common::serve(Router::new().route(
        "/comments/:id",
        get(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "boom") }),
    ))
    .await;
    let gateway = common::gateway(&slow, &broken).await;

    let started = Instant::now();
    let (status, _) = get_json(format!("{gateway}/news/1")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
}

#[tokio::test]
async fn unreachable_backend_is_upstream_unavailable() {
    let comments = common::comment_service().await;
    let gateway = common::gateway(&common::dead_url().await, &comments).await;

    let (status, _) = get_json(format!("{gateway}/news/1")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (status, _) = get_json(format!("{gateway}/news?limit=10&page=1")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn missing_article_is_not_found() {
    let news = common::news_service(vec![common::article(1, "Rust")]).await;
    let comments = common::comment_service().await;
    let gateway = common::gateway(&news, &comments).await;

    let (status, _) = get_json(format!("{gateway}/news/9")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_and_search_pass_through() {
    let articles = (1..=12)
        .map(|id| common::article(id, if id % 3 == 0 { "Rust weekly" } else { "Other" }))
        .collect();
    let news = common::news_service(articles).await;
    let gateway = common::gateway(&news, &common::dead_url().await).await;

    let (status, page) = get_json(format!("{gateway}/news?limit=5&page=3")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = page.as_array().unwrap().iter().map(|a| a["id"].clone()).collect();
    assert_eq!(ids, vec![json!(11), json!(12)]);
    assert_eq!(page[0]["countPage"], 3);
    assert_eq!(page[0]["page"], 3);

    let (status, _) = get_json(format!("{gateway}/news?limit=5&page=4")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let huge = usize::MAX;
    let (status, _) = get_json(format!("{gateway}/news?limit=5&page={huge}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, found) = get_json(format!("{gateway}/news/search?title=rust&limit=2&page=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 2);
    assert_eq!(found[0]["id"], 3);
    assert_eq!(found[0]["countPage"], 2);
}

#[tokio::test]
async fn malformed_requests_never_reach_a_backend() {
    let dead = common::dead_url().await;
    let gateway = common::gateway(&dead, &dead).await;

    let (status, _) = get_json(format!("{gateway}/news?limit=ten")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(format!("{gateway}/news/search?title=x&page=x")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let response = reqwest::Client::new()
        .post(format!("{gateway}/comments/1"))
        .json(&json!({ "text": "no author" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reply_errors_are_relayed_verbatim() {
    let comments = common::comment_service().await;
    let gateway = common::gateway(&common::dead_url().await, &comments).await;
    let client = reqwest::Client::new();

    let missing = client
        .post(format!("{gateway}/comments/1/zzzz"))
        .json(&json!({ "slug": "zzzz", "author": "bob", "text": "re" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body: Value = missing.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("zzzz"));

    let parent: Value = client
        .post(format!("{gateway}/comments/1"))
        .json(&json!({ "author": "alice", "text": "hi" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let slug = parent["slug"].as_str().unwrap();
    let reply = client
        .post(format!("{gateway}/comments/1/{slug}"))
        .json(&json!({ "slug": slug, "author": "bob", "text": "re" }))
        .send()
        .await
        .unwrap();
    assert_eq!(reply.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn writes_through_the_gateway_need_the_comment_backend() {
    let gateway = common::gateway(&common::dead_url().await, &common::dead_url().await).await;

    let response = reqwest::Client::new()
        .post(format!("{gateway}/comments/1"))
        .json(&json!({ "author": "alice", "text": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
