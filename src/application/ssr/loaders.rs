//! Route data loaders and the registry binding them to components.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::application::articles::{ArticleError, ArticleService};
use crate::domain::articles::parse_article_id;

use super::context::SsrContext;
use super::routes::{Component, RouteParams};

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("loader for {component} requires parameter `{param}`")]
    MissingParam {
        component: &'static str,
        param: &'static str,
    },
    #[error(transparent)]
    Articles(#[from] ArticleError),
    #[error("loader result could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Data-loading hook of one page component.
///
/// The same data the server embeds is what the client would fetch on a cold start.
#[async_trait]
pub trait RouteLoader: Send + Sync {
    /// Path parameters that must be present before `load` runs.
    fn required_params(&self) -> &'static [&'static str] {
        &[]
    }

    async fn load(&self, params: &RouteParams) -> Result<SsrContext, LoaderError>;
}

/// Loads the article list under `articles`.
pub struct ArticleListLoader {
    articles: ArticleService,
}

impl ArticleListLoader {
    pub fn new(articles: ArticleService) -> Self {
        Self { articles }
    }
}

#[async_trait]
impl RouteLoader for ArticleListLoader {
    async fn load(&self, _params: &RouteParams) -> Result<SsrContext, LoaderError> {
        let outcome = self.articles.list().await?;
        Ok(SsrContext::with_articles(&outcome.articles)?)
    }
}

/// Loads one article under `article`; `null` when the id names nothing.
pub struct ArticleDetailLoader {
    articles: ArticleService,
}

impl ArticleDetailLoader {
    pub fn new(articles: ArticleService) -> Self {
        Self { articles }
    }
}

#[async_trait]
impl RouteLoader for ArticleDetailLoader {
    fn required_params(&self) -> &'static [&'static str] {
        &["id"]
    }

    async fn load(&self, params: &RouteParams) -> Result<SsrContext, LoaderError> {
        let raw = params.get("id").ok_or(LoaderError::MissingParam {
            component: Component::ArticleDetail.name(),
            param: "id",
        })?;

        let article = match parse_article_id(raw) {
            Some(id) => self.articles.get(id).await?.map(|read| read.article),
            None => None,
        };
        Ok(SsrContext::with_article(article.as_ref())?)
    }
}

#[derive(Clone, Default)]
pub struct LoaderRegistry {
    loaders: HashMap<Component, Arc<dyn RouteLoader>>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loaders for the standard route table.
    pub fn standard(articles: ArticleService) -> Self {
        Self::new()
            .with(
                Component::ArticleList,
                Arc::new(ArticleListLoader::new(articles.clone())),
            )
            .with(
                Component::ArticleDetail,
                Arc::new(ArticleDetailLoader::new(articles)),
            )
    }

    pub fn with(mut self, component: Component, loader: Arc<dyn RouteLoader>) -> Self {
        self.loaders.insert(component, loader);
        self
    }

    pub fn get(&self, component: Component) -> Option<&Arc<dyn RouteLoader>> {
        self.loaders.get(&component)
    }
}
