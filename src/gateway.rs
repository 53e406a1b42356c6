use std::{future::Future, time::Duration};

use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::data::{
    comments::{Comment, NewComment},
    news::{Article, ArticleFull, ArticlePage, Pagination},
};
use crate::error::{Error, Result};

/// Fans reads out to the article and comment backends and proxies comment writes.
#[derive(Clone)]
pub struct Gateway {
    client: reqwest::Client,
    news_url: String,
    comments_url: String,
}

impl Gateway {
    pub fn new(news_url: &str, comments_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Gateway {
            client,
            news_url: news_url.trim_end_matches('/').to_owned(),
            comments_url: comments_url.trim_end_matches('/').to_owned(),
        })
    }

    /// An article with its comments. Both backends are queried at once and
    /// either failing fails the whole read.
    pub async fn fetch_combined(&self, news_id: i64) -> Result<ArticleFull> {
        let news = spawn(self.get_json::<Vec<Article>>(format!("{}/news/{news_id}", self.news_url)));
        let comments = spawn(
            self.get_json::<Vec<Comment>>(format!("{}/comments/{news_id}", self.comments_url)),
        );

        // On the first failure the other handle is dropped, which detaches its
        // task rather than aborting it.
        let (articles, comments) = tokio::try_join!(join(news), join(comments))?;

        let article = articles
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("news {news_id}")))?;
        Ok(ArticleFull { article, comments })
    }

    /// One page of the article listing.
    pub async fn fetch_page(&self, pagination: Pagination) -> Result<Vec<ArticlePage>> {
        let url = format!(
            "{}/news?limit={}&page={}",
            self.news_url, pagination.limit, pagination.page
        );
        let page = join(spawn(self.get_json::<Vec<ArticlePage>>(url))).await?;
        if page.is_empty() {
            return Err(Error::NotFound(format!("page {}", pagination.page)));
        }
        Ok(page)
    }

    /// One page of articles whose title matches.
    pub async fn fetch_search(&self, title: &str, pagination: Pagination) -> Result<Vec<ArticlePage>> {
        let request = self.client.get(format!("{}/news/search", self.news_url)).query(&[
            ("title", title.to_owned()),
            ("limit", pagination.limit.to_string()),
            ("page", pagination.page.to_string()),
        ]);
        join(spawn(decode::<Vec<ArticlePage>>(request))).await
    }

    /// Forward a top-level comment. Returns the backend's status and body untouched.
    pub async fn post_comment(&self, news_id: i64, body: &NewComment) -> Result<(StatusCode, String)> {
        body.validate()?;
        self.forward(format!("{}/comments/{news_id}", self.comments_url), body)
            .await
    }

    /// Forward a reply under `parent_slug`.
    pub async fn post_reply(
        &self,
        news_id: i64,
        parent_slug: &str,
        body: &NewComment,
    ) -> Result<(StatusCode, String)> {
        body.validate()?;
        self.forward(
            format!("{}/comments/{news_id}/{parent_slug}", self.comments_url),
            body,
        )
        .await
    }

    async fn forward(&self, url: String, body: &NewComment) -> Result<(StatusCode, String)> {
        debug!("Forwarding comment to {url}");
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    fn get_json<T: DeserializeOwned + Send + 'static>(
        &self,
        url: String,
    ) -> impl Future<Output = Result<T>> + Send + 'static {
        decode(self.client.get(url))
    }
}

async fn decode<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T> {
    let response = request.send().await?;
    let url = response.url().clone();
    let response = response.error_for_status().map_err(|err| {
        warn!("Upstream {url} answered with an error: {err}");
        Error::from(err)
    })?;
    Ok(response.json().await?)
}

fn spawn<T: Send + 'static>(
    call: impl Future<Output = Result<T>> + Send + 'static,
) -> JoinHandle<Result<T>> {
    tokio::spawn(call)
}

async fn join<T>(handle: JoinHandle<Result<T>>) -> Result<T> {
    handle
        .await
        .map_err(|err| Error::UpstreamUnavailable(format!("upstream call panicked: {err}")))?
}
