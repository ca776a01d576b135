//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::entities::{Article, ArticleSummary};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateArticleParams {
    pub title: String,
    pub content: Option<String>,
    pub markdown: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateArticleParams {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub markdown: Option<String>,
}

#[async_trait]
pub trait ArticlesRepo: Send + Sync {
    /// Summaries of every article, newest first.
    async fn list_summaries(&self) -> Result<Vec<ArticleSummary>, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Article>, RepoError>;

    /// Insert a new article; the store assigns id and timestamps.
    async fn create_article(&self, params: CreateArticleParams) -> Result<Article, RepoError>;

    /// Replace the mutable fields of an article. `None` when the id is unknown.
    async fn update_article(
        &self,
        params: UpdateArticleParams,
    ) -> Result<Option<Article>, RepoError>;

    /// Returns `false` when nothing was deleted.
    async fn delete_article(&self, id: i64) -> Result<bool, RepoError>;

    /// Database clock, used as a connectivity probe.
    async fn current_time(&self) -> Result<OffsetDateTime, RepoError>;
}
