//! Domain entities mirrored from persistent storage.
//!
//! The wire shapes double as the entities: an article is never reshaped
//! between the store, the caches, the SSR context and the JSON API.

pub use inkblog_api_types::{Article, ArticleSummary};
