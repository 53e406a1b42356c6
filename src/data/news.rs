use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use tokio::{fs, sync::Mutex};
use tracing::info;

use super::comments::Comment;
use crate::error::{Error, Result, StoreError};

pub const DEFAULT_LIMIT: usize = 10;

/// A published article.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default)]
    pub id: i64,
    pub title: String,
    pub content: String,

    /// Unix seconds.
    pub pub_time: i64,
    pub link: String,
}

/// An article as one row of a paginated listing.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePage {
    #[serde(flatten)]
    pub article: Article,
    pub count_page: usize,
    pub page: usize,
}

/// An article with its comment thread attached.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleFull {
    #[serde(flatten)]
    pub article: Article,
    #[serde(rename = "comment")]
    pub comments: Vec<Comment>,
}

/// Raw `limit`/`page` query parameters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub limit: Option<String>,
    pub page: Option<String>,
}

/// Raw search query parameters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub title: String,
    pub limit: Option<String>,
    pub page: Option<String>,
}

impl SearchQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            limit: self.limit.clone(),
            page: self.page.clone(),
        }
    }
}

/// Validated pagination window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub limit: usize,
    pub page: usize,
}

impl Pagination {
    /// Parse query parameters. Blank values take defaults; page 0 means page 1,
    /// and a zero limit falls back to the default.
    pub fn parse(query: &PageQuery) -> Result<Self> {
        fn number(name: &str, value: Option<&str>) -> Result<Option<usize>> {
            match value.map(str::trim).filter(|v| !v.is_empty()) {
                None => Ok(None),
                Some(v) => v.parse().map(Some).map_err(|_| {
                    Error::MalformedRequest(format!("{name} must be a non-negative integer"))
                }),
            }
        }

        let limit = number("limit", query.limit.as_deref())?
            .filter(|&l| l > 0)
            .unwrap_or(DEFAULT_LIMIT);
        let page = number("page", query.page.as_deref())?.unwrap_or(1).max(1);
        Ok(Pagination { limit, page })
    }

    /// Rows to skip. Saturates, so an absurd page lands past the end.
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Pages needed to show `total` rows, never less than one.
    pub fn count_pages(&self, total: usize) -> usize {
        total.div_ceil(self.limit).max(1)
    }
}

/// Article storage backed by a JSON file, keyed by id in insertion order.
pub struct NewsStore {
    path: Option<PathBuf>,
    articles: Mutex<IndexMap<i64, Article>>,
}

impl NewsStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_owned();
        let articles: Vec<Article> = match fs::read_to_string(&path).await {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        info!("Loaded {} articles from {}", articles.len(), path.display());

        Ok(NewsStore {
            path: Some(path),
            articles: Mutex::new(index(articles)),
        })
    }

    pub fn in_memory(articles: Vec<Article>) -> Self {
        NewsStore {
            path: None,
            articles: Mutex::new(index(articles)),
        }
    }

    /// Zero or one article.
    pub async fn article(&self, id: i64) -> Vec<Article> {
        let articles = self.articles.lock().await;
        articles.get(&id).cloned().into_iter().collect()
    }

    /// A page of articles ordered by id.
    pub async fn page(&self, pagination: Pagination) -> Vec<ArticlePage> {
        let articles = self.articles.lock().await;
        let mut ordered: Vec<&Article> = articles.values().collect();
        ordered.sort_by_key(|a| a.id);
        paginate(ordered, pagination)
    }

    /// A page of articles whose title contains `title`, ignoring case, oldest first.
    pub async fn search(&self, title: &str, pagination: Pagination) -> Vec<ArticlePage> {
        let articles = self.articles.lock().await;
        let pattern = RegexBuilder::new(&regex::escape(title))
            .case_insensitive(true)
            .build();
        let mut matched: Vec<&Article> = match &pattern {
            Ok(pattern) => articles
                .values()
                .filter(|a| pattern.is_match(&a.title))
                .collect(),
            Err(_) => Vec::new(),
        };
        matched.sort_by_key(|a| (a.pub_time, a.id));
        paginate(matched, pagination)
    }

    /// Append articles under fresh ids and persist. Returns the assigned ids.
    pub async fn create(&self, new: Vec<Article>) -> Result<Vec<i64>> {
        let mut articles = self.articles.lock().await;
        let mut next = articles.keys().max().copied().unwrap_or(0) + 1;
        let mut ids = Vec::with_capacity(new.len());
        for mut article in new {
            article.id = next;
            articles.insert(next, article);
            ids.push(next);
            next += 1;
        }

        if let Err(err) = self.save(&articles).await {
            for id in &ids {
                articles.shift_remove(id);
            }
            return Err(err.into());
        }
        info!("Stored {} new articles", ids.len());
        Ok(ids)
    }

    async fn save(&self, articles: &IndexMap<i64, Article>) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let rows: Vec<&Article> = articles.values().collect();
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_string_pretty(&rows)?).await?;
        fs::rename(&staging, path).await?;
        Ok(())
    }
}

fn index(articles: Vec<Article>) -> IndexMap<i64, Article> {
    articles.into_iter().map(|a| (a.id, a)).collect()
}

fn paginate(rows: Vec<&Article>, pagination: Pagination) -> Vec<ArticlePage> {
    let count_page = pagination.count_pages(rows.len());
    rows.into_iter()
        .skip(pagination.offset())
        .take(pagination.limit)
        .map(|article| ArticlePage {
            article: article.clone(),
            count_page,
            page: pagination.page,
        })
        .collect()
}
