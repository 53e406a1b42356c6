use std::sync::Arc;

use tracing::{debug, info};

use super::cache::ThreadCache;
use super::comments::{Comment, NewComment, ThreadedComment};
use super::store::CommentStore;
use crate::error::Result;

/// Picks the store query and cache policy for each read shape, and keeps the
/// cache coherent across writes.
pub struct ThreadAssembler {
    store: Arc<CommentStore>,
    cache: Arc<ThreadCache>,
}

impl ThreadAssembler {
    pub fn new(store: Arc<CommentStore>, cache: Arc<ThreadCache>) -> Self {
        ThreadAssembler { store, cache }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &CommentStore {
        &self.store
    }

    /// Every comment in `(parent_id, full_slug)` order, served from the cache when possible.
    pub async fn assemble_all(&self) -> Result<Vec<Comment>> {
        if let Some(comments) = self.cache.get() {
            debug!("Served {} comments from cache", comments.len());
            return Ok(comments);
        }

        debug!("Cache miss, scanning store");
        let generation = self.cache.generation();
        let comments = self.store.list_all().await?;
        self.cache.put(&comments, generation);
        Ok(comments)
    }

    /// One article's comments in `(parent_id, created_at)` order. Never cached.
    pub async fn assemble_for_news(&self, news_id: i64) -> Result<Vec<Comment>> {
        self.store.list_by_news(news_id).await
    }

    /// One article's comments in depth-first order, each with its depth.
    pub async fn thread_for_news(&self, news_id: i64) -> Result<Vec<ThreadedComment>> {
        let comments = self.store.list_by_news(news_id).await?;
        Ok(linearize(comments))
    }

    pub async fn post_comment(&self, news_id: i64, body: &NewComment) -> Result<Comment> {
        body.validate()?;
        let comment = self
            .store
            .insert_top_level(news_id, &body.author, &body.text)
            .await?;
        self.cache.invalidate();

        info!("Added comment {} to news {news_id}", comment.slug);
        Ok(comment)
    }

    pub async fn post_reply(
        &self,
        news_id: i64,
        parent_slug: &str,
        body: &NewComment,
    ) -> Result<Comment> {
        body.validate()?;
        if let Some(requested) = &body.slug {
            debug!("Ignoring client supplied slug {requested:?}");
        }
        let comment = self
            .store
            .insert_reply(news_id, parent_slug, &body.author, &body.text)
            .await?;
        self.cache.invalidate();

        info!("Added reply {} under {parent_slug} on news {news_id}", comment.slug);
        Ok(comment)
    }
}

/// Sort comments by full slug and annotate their depth.
pub fn linearize(mut comments: Vec<Comment>) -> Vec<ThreadedComment> {
    comments.sort_by(|a, b| a.full_slug.cmp(&b.full_slug));
    comments
        .into_iter()
        .map(|comment| ThreadedComment {
            depth: comment.depth(),
            comment,
        })
        .collect()
}
