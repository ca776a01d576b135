//! Per-request data handed from loaders to components and then to the browser.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::entities::{Article, ArticleSummary};

pub const ARTICLES_KEY: &str = "articles";
pub const ARTICLE_KEY: &str = "article";

/// Global the embedded script assigns on the client.
pub const INITIAL_DATA_GLOBAL: &str = "window.__INITIAL_DATA__";

/// Mapping from loader result keys to JSON values.
///
/// Merging is last-writer-wins per key; the route table keeps keys disjoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SsrContext(Map<String, Value>);

impl SsrContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_articles(articles: &[ArticleSummary]) -> Result<Self, serde_json::Error> {
        let mut context = Self::new();
        context.insert(ARTICLES_KEY, serde_json::to_value(articles)?);
        Ok(context)
    }

    /// `None` is stored as an explicit `null`: the article was looked up and does not exist.
    pub fn with_article(article: Option<&Article>) -> Result<Self, serde_json::Error> {
        let mut context = Self::new();
        context.insert(ARTICLE_KEY, serde_json::to_value(article)?);
        Ok(context)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn merge(&mut self, other: SsrContext) {
        self.0.extend(other.0);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The article list, when present and well-formed.
    pub fn articles(&self) -> Option<Vec<ArticleSummary>> {
        self.get(ARTICLES_KEY)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Outer `None`: nothing loaded. Inner `None`: loaded, no such article.
    pub fn article(&self) -> Option<Option<Article>> {
        match self.get(ARTICLE_KEY)? {
            Value::Null => Some(None),
            value => serde_json::from_value(value.clone()).ok().map(Some),
        }
    }

    /// JSON for embedding inside a `<script>` element.
    pub fn to_script_json(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(&self.0)?;
        Ok(json.replace('<', "\\u003c"))
    }

    pub fn to_script_tag(&self) -> Result<String, serde_json::Error> {
        Ok(format!(
            "<script>{INITIAL_DATA_GLOBAL} = {};</script>",
            self.to_script_json()?
        ))
    }
}
