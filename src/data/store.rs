use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::{fs, sync::Mutex};
use tracing::{debug, info};

use super::comments::{Comment, CommentData, CommentId};
use super::slug;
use crate::error::{Error, Result, StoreError};

/// How many slugs to try before giving up on an insert.
pub const MAX_SLUG_ATTEMPTS: usize = 32;

/// Durable, append-mostly comment storage backed by a JSON file.
pub struct CommentStore {
    path: Option<PathBuf>,
    comments: Mutex<Vec<CommentData>>,
}

impl CommentStore {
    /// Load the store from `path`. A missing file is an empty store.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_owned();
        let comments = match fs::read_to_string(&path).await {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        info!("Loaded {} comments from {}", comments.len(), path.display());

        Ok(CommentStore {
            path: Some(path),
            comments: Mutex::new(comments),
        })
    }

    /// A store that never touches the disk.
    pub fn in_memory() -> Self {
        CommentStore {
            path: None,
            comments: Mutex::new(Vec::new()),
        }
    }

    pub async fn insert_top_level(&self, news_id: i64, author: &str, text: &str) -> Result<Comment> {
        self.insert_with(&mut StdRng::from_entropy(), news_id, None, author, text)
            .await
    }

    /// Insert a reply under the comment named by `(news_id, parent_slug)`.
    pub async fn insert_reply(
        &self,
        news_id: i64,
        parent_slug: &str,
        author: &str,
        text: &str,
    ) -> Result<Comment> {
        self.insert_with(
            &mut StdRng::from_entropy(),
            news_id,
            Some(parent_slug),
            author,
            text,
        )
        .await
    }

    pub(crate) async fn insert_with<R: Rng + Send>(
        &self,
        rng: &mut R,
        news_id: i64,
        parent_slug: Option<&str>,
        author: &str,
        text: &str,
    ) -> Result<Comment> {
        let mut comments = self.comments.lock().await;

        let parent = match parent_slug {
            Some(parent_slug) => {
                let parent = comments
                    .iter()
                    .find(|c| c.news_id == news_id && c.slug == parent_slug)
                    .ok_or_else(|| Error::ParentNotFound {
                        news_id,
                        slug: parent_slug.to_owned(),
                    })?;
                Some((parent.id.clone(), parent.full_slug.clone()))
            }
            None => None,
        };

        let now = Utc::now();
        let salt = slug::salt(now);
        let parent_full_slug = parent.as_ref().map(|(_, full_slug)| full_slug.as_str());
        let (slug, full_slug) = mint_unique(&comments, rng, news_id, parent_full_slug, &salt)?;

        let data = CommentData {
            id: CommentId::mint(now),
            news_id,
            parent_id: parent.map(|(id, _)| id),
            slug,
            full_slug,
            created_at: now,
            author: author.to_owned(),
            text: text.to_owned(),
            deleted: false,
        };
        let comment = Comment::from(&data);
        comments.push(data);

        // Roll back so memory never holds a row the disk doesn't.
        if let Err(err) = self.save(&comments).await {
            comments.pop();
            return Err(err.into());
        }

        debug!("Stored comment {} at {}", comment.id, comment.full_slug);
        Ok(comment)
    }

    /// The comment named by `slug` within an article.
    #[cfg(test)]
    pub(crate) async fn find(&self, news_id: i64, slug: &str) -> Option<Comment> {
        let comments = self.comments.lock().await;
        comments
            .iter()
            .find(|c| c.news_id == news_id && c.slug == slug)
            .map(Comment::from)
    }

    /// An article's live comments ordered by `(parent_id, created_at)`.
    pub async fn list_by_news(&self, news_id: i64) -> Result<Vec<Comment>> {
        let comments = self.comments.lock().await;
        let mut listed: Vec<Comment> = comments
            .iter()
            .filter(|c| c.news_id == news_id && !c.deleted)
            .map(Comment::from)
            .collect();
        listed.sort_by(|a, b| {
            (&a.parent_id, a.created_at).cmp(&(&b.parent_id, b.created_at))
        });
        Ok(listed)
    }

    /// Every comment in the store ordered by `(parent_id, full_slug)`.
    pub async fn list_all(&self) -> Result<Vec<Comment>> {
        let comments = self.comments.lock().await;
        let mut listed: Vec<Comment> = comments.iter().map(Comment::from).collect();
        listed.sort_by(|a, b| (&a.parent_id, &a.full_slug).cmp(&(&b.parent_id, &b.full_slug)));
        Ok(listed)
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.comments.lock().await.len()
    }

    async fn save(&self, comments: &[CommentData]) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let contents = serde_json::to_string_pretty(comments)?;

        // Write beside the target and rename so a crash never leaves half a file.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, contents).await?;
        fs::rename(&staging, path).await?;
        Ok(())
    }
}

/// Mint a slug unused within the article whose full slug is unused store-wide.
fn mint_unique<R: Rng>(
    comments: &[CommentData],
    rng: &mut R,
    news_id: i64,
    parent_full_slug: Option<&str>,
    salt: &str,
) -> Result<(String, String), StoreError> {
    for _ in 0..MAX_SLUG_ATTEMPTS {
        let slug = slug::new_slug_with(rng);
        let full_slug = slug::compose_full_slug(parent_full_slug, &slug, salt);
        let taken = comments
            .iter()
            .any(|c| (c.news_id == news_id && c.slug == slug) || c.full_slug == full_slug);
        if !taken {
            return Ok((slug, full_slug));
        }
        debug!("Slug {slug} already taken under news {news_id}, retrying");
    }
    Err(StoreError::SlugSpaceExhausted(MAX_SLUG_ATTEMPTS))
}
