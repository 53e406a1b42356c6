//! Threaded comments for a news aggregator, the article backend they hang
//! off, and the gateway that joins the two.

use std::sync::Arc;

pub mod config;
pub mod data;
pub mod error;
pub mod gateway;
pub mod routes;

use config::Config;
use data::{CommentStore, FileCache, MemoryCache, NewsStore, ThreadAssembler, ThreadCache};
use error::StoreError;
use routes::{CommentState, GatewayState, NewsState};

impl CommentState {
    /// Open the comment store and pick the cache backend.
    pub async fn from_config(config: &Config) -> Result<Self, StoreError> {
        let store = CommentStore::open(&config.comments_file).await?;
        let cache = match &config.cache_dir {
            Some(dir) => ThreadCache::new(FileCache::new(dir)),
            None => ThreadCache::new(MemoryCache::new()),
        };
        Ok(CommentState {
            threads: Arc::new(ThreadAssembler::new(Arc::new(store), Arc::new(cache))),
        })
    }
}

impl NewsState {
    pub async fn from_config(config: &Config) -> Result<Self, StoreError> {
        Ok(NewsState {
            news: Arc::new(NewsStore::open(&config.news_file).await?),
        })
    }
}

impl GatewayState {
    pub fn from_config(config: &Config) -> error::Result<Self> {
        Ok(GatewayState {
            gateway: gateway::Gateway::new(
                &config.news_url,
                &config.comments_url,
                config.upstream_timeout,
            )?,
        })
    }
}
