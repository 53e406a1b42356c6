use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Store-assigned identity of a comment.
///
/// Twenty-four hex characters: four bytes of unix seconds followed by eight
/// random bytes.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(String);

impl CommentId {
    pub(crate) fn mint(now: DateTime<Utc>) -> Self {
        let seconds = now.timestamp() as u32;
        let random: u64 = rand::thread_rng().gen();
        CommentId(format!("{seconds:08x}{random:016x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A comment as persisted by the store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct CommentData {
    pub(crate) id: CommentId,
    pub(crate) news_id: i64,
    pub(crate) parent_id: Option<CommentId>,
    pub(crate) slug: String,
    pub(crate) full_slug: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) author: String,
    pub(crate) text: String,

    /// Soft-delete flag. Nothing sets it yet.
    #[serde(default)]
    pub(crate) deleted: bool,
}

/// A comment as it leaves the store, the cache, and the services.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,

    /// The article this comment belongs to.
    pub news_id: i64,

    /// The comment this one replies to. `None` for top-level comments.
    pub parent_id: Option<CommentId>,

    /// Short token naming this comment among the article's comments.
    pub slug: String,

    /// Root-to-leaf chain of `salt:slug` segments. Sorting by it yields
    /// depth-first, creation-ordered thread order.
    pub full_slug: String,

    pub created_at: DateTime<Utc>,
    pub author: String,
    pub text: String,
}

impl From<&CommentData> for Comment {
    fn from(data: &CommentData) -> Self {
        Comment {
            id: data.id.clone(),
            news_id: data.news_id,
            parent_id: data.parent_id.clone(),
            slug: data.slug.clone(),
            full_slug: data.full_slug.clone(),
            created_at: data.created_at,
            author: data.author.clone(),
            text: data.text.clone(),
        }
    }
}

impl Comment {
    /// How many ancestors this comment has.
    pub fn depth(&self) -> usize {
        super::slug::depth(&self.full_slug)
    }
}

/// Request body for posting a comment or a reply.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NewComment {
    #[serde(default)]
    pub author: String,

    #[serde(default)]
    pub text: String,

    /// Carried by reply requests for compatibility. The store always mints its own slug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl NewComment {
    /// Reject bodies missing a required field.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.author.trim().is_empty() {
            return Err(crate::error::Error::MalformedRequest(
                "author is required".to_owned(),
            ));
        }
        if self.text.trim().is_empty() {
            return Err(crate::error::Error::MalformedRequest(
                "text is required".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Acknowledgement returned when a comment is created.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Created {
    pub message: String,
    pub id: CommentId,
    pub slug: String,
}

impl From<&Comment> for Created {
    fn from(comment: &Comment) -> Self {
        Created {
            message: "Comment added".to_owned(),
            id: comment.id.clone(),
            slug: comment.slug.clone(),
        }
    }
}

/// A comment placed in depth-first thread order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThreadedComment {
    #[serde(flatten)]
    pub comment: Comment,
    pub depth: usize,
}
