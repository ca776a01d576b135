use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::application::repos::{
    ArticlesRepo, CreateArticleParams, RepoError, UpdateArticleParams,
};
use crate::cache::ArticleCache;
use crate::domain::{
    articles::ensure_non_empty,
    entities::{Article, ArticleSummary},
    error::DomainError,
};
use inkblog_api_types::ArticleInput;

const TARGET: &str = "inkblog::application::articles";

#[derive(Debug, Error)]
pub enum ArticleError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("article {id} not found")]
    NotFound { id: i64 },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListOutcome {
    pub articles: Vec<ArticleSummary>,
    pub from_cache: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRead {
    pub article: Article,
    pub from_cache: bool,
}

/// Article CRUD behind the two cache tiers.
///
/// Reads go through the caches; writes hit the store and then invalidate both
/// tiers before returning, so no acknowledged write is followed by a stale read
/// from this process.
#[derive(Clone)]
pub struct ArticleService {
    repo: Arc<dyn ArticlesRepo>,
    cache: ArticleCache,
}

impl ArticleService {
    pub fn new(repo: Arc<dyn ArticlesRepo>, cache: ArticleCache) -> Self {
        Self { repo, cache }
    }

    pub async fn list(&self) -> Result<ListOutcome, ArticleError> {
        if let Some(articles) = self.cache.list().get_list().await {
            return Ok(ListOutcome {
                articles,
                from_cache: true,
            });
        }

        let epoch = self.cache.list().epoch();
        let articles = self.repo.list_summaries().await?;
        self.cache.list().fill_list(&articles, epoch).await;

        Ok(ListOutcome {
            articles,
            from_cache: false,
        })
    }

    /// `Ok(None)` when the id is unknown.
    pub async fn get(&self, id: i64) -> Result<Option<ArticleRead>, ArticleError> {
        if let Some(article) = self.cache.local().get_article(id) {
            return Ok(Some(ArticleRead {
                article,
                from_cache: true,
            }));
        }

        let epoch = self.cache.local().epoch();
        let Some(article) = self.repo.find_by_id(id).await? else {
            debug!(target: TARGET, article_id = id, "article not found");
            return Ok(None);
        };
        if !self.cache.local().fill_article(id, article.clone(), epoch) {
            debug!(target: TARGET, article_id = id, "article changed during read; not cached");
        }

        Ok(Some(ArticleRead {
            article,
            from_cache: false,
        }))
    }

    pub async fn create(&self, input: ArticleInput) -> Result<Article, ArticleError> {
        ensure_non_empty(input.title.as_deref(), "title")?;
        ensure_non_empty(input.markdown.as_deref(), "markdown")?;

        let params = CreateArticleParams {
            title: input.title.unwrap_or_default().trim().to_string(),
            content: input.content,
            markdown: input.markdown,
        };
        let article = self.repo.create_article(params).await?;
        self.cache.invalidate_for_write(Some(article.id)).await;

        info!(target: TARGET, article_id = article.id, "article created");
        Ok(article)
    }

    pub async fn update(&self, id: i64, input: ArticleInput) -> Result<Article, ArticleError> {
        ensure_non_empty(input.title.as_deref(), "title")?;

        let params = UpdateArticleParams {
            id,
            title: input.title.unwrap_or_default().trim().to_string(),
            content: input.content,
            markdown: input.markdown,
        };
        let updated = self.repo.update_article(params).await?;
        let Some(article) = updated else {
            return Err(ArticleError::NotFound { id });
        };
        self.cache.invalidate_for_write(Some(id)).await;

        info!(target: TARGET, article_id = id, "article updated");
        Ok(article)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ArticleError> {
        if !self.repo.delete_article(id).await? {
            return Err(ArticleError::NotFound { id });
        }
        self.cache.invalidate_for_write(Some(id)).await;

        info!(target: TARGET, article_id = id, "article deleted");
        Ok(())
    }

    pub async fn database_time(&self) -> Result<OffsetDateTime, ArticleError> {
        Ok(self.repo.current_time().await?)
    }
}
