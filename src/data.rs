pub use cache::{CacheBackend, FileCache, MemoryCache, ThreadCache};
pub use comments::{Comment, CommentId, Created, NewComment, ThreadedComment};
pub use news::{Article, ArticleFull, ArticlePage, NewsStore, Pagination};
pub use store::CommentStore;
pub use thread::ThreadAssembler;

/// Read-through cache of the full comment listing.
pub mod cache;

/// Data structures for comments.
pub mod comments;

/// Articles and their paginated listings.
pub mod news;

/// Minting and composing the slug paths that position comments in a thread.
pub mod slug;

/// Durable comment storage.
pub mod store;

/// Read and write paths over the store and cache.
pub mod thread;
