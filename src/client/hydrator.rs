use std::sync::Arc;

use tracing::debug;

use crate::application::ssr::{Component, RenderError, RouteMatch, RouteTable, SsrContext};
use crate::domain::articles::parse_article_id;
use crate::presentation::views::render_app;

use super::fetch::{ArticleFetcher, FetchError};

const TARGET: &str = "inkblog::client::hydrator";

/// Where a mounted component takes its data from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    /// The server embedded usable data; the value is the partial context.
    Embedded(SsrContext),
    Fetch(FetchPlan),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchPlan {
    ArticleList,
    Article { raw_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Embedded,
    Fetched,
    /// The component needs no data.
    Static,
}

#[derive(Debug, Clone)]
pub struct HydratedPage {
    pub markup: String,
    pub context: SsrContext,
    pub sources: Vec<(Component, SourceKind)>,
}

#[derive(Debug, thiserror::Error)]
pub enum HydrateError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Decide how a matched component gets its data.
///
/// Embedded data is only trusted when it is present and, for the detail page,
/// describes the article the URL names. `None` means the component has no data.
pub fn select_source(embedded: Option<&SsrContext>, matched: &RouteMatch) -> Option<DataSource> {
    match matched.component {
        Component::ArticleList => {
            if let Some(context) = embedded
                && let Some(articles) = context.articles()
                && let Ok(partial) = SsrContext::with_articles(&articles)
            {
                return Some(DataSource::Embedded(partial));
            }
            Some(DataSource::Fetch(FetchPlan::ArticleList))
        }
        Component::ArticleDetail => {
            let raw_id = matched.params.get("id").unwrap_or_default().to_string();
            if let Some(context) = embedded
                && let Some(Some(article)) = context.article()
                && parse_article_id(&raw_id) == Some(article.id)
                && let Ok(partial) = SsrContext::with_article(Some(&article))
            {
                return Some(DataSource::Embedded(partial));
            }
            Some(DataSource::Fetch(FetchPlan::Article { raw_id }))
        }
        Component::ArticleAdmin | Component::NotFound => None,
    }
}

/// Client-side counterpart of the SSR renderer.
///
/// The embedded context is consumed by the first mount; later navigations
/// always fetch.
pub struct Hydrator {
    routes: RouteTable,
    fetcher: Arc<dyn ArticleFetcher>,
    embedded: Option<SsrContext>,
}

impl Hydrator {
    pub fn new(routes: RouteTable, fetcher: Arc<dyn ArticleFetcher>, embedded: SsrContext) -> Self {
        Self {
            routes,
            fetcher,
            embedded: Some(embedded),
        }
    }

    /// Whether the next mount may still read embedded data.
    pub fn has_embedded(&self) -> bool {
        self.embedded.is_some()
    }

    pub async fn mount(&mut self, path: &str) -> Result<HydratedPage, HydrateError> {
        let embedded = self.embedded.take();
        let matches = self.routes.resolve(path);

        let mut context = SsrContext::new();
        let mut sources = Vec::with_capacity(matches.len());
        for matched in &matches {
            let kind = match select_source(embedded.as_ref(), matched) {
                Some(DataSource::Embedded(partial)) => {
                    context.merge(partial);
                    SourceKind::Embedded
                }
                Some(DataSource::Fetch(plan)) => {
                    context.merge(self.fetch(&plan).await?);
                    SourceKind::Fetched
                }
                None => SourceKind::Static,
            };
            sources.push((matched.component, kind));
        }

        let components: Vec<Component> = if matches.is_empty() {
            vec![Component::NotFound]
        } else {
            matches.iter().map(|matched| matched.component).collect()
        };
        let markup = render_app(&components, &context)?;

        debug!(target: TARGET, path, sources = ?sources, "page mounted");
        Ok(HydratedPage {
            markup,
            context,
            sources,
        })
    }

    async fn fetch(&self, plan: &FetchPlan) -> Result<SsrContext, HydrateError> {
        let context = match plan {
            FetchPlan::ArticleList => {
                let articles = self.fetcher.fetch_articles().await?;
                SsrContext::with_articles(&articles).map_err(RenderError::from)?
            }
            FetchPlan::Article { raw_id } => {
                let article = self.fetcher.fetch_article(raw_id).await?;
                SsrContext::with_article(article.as_ref()).map_err(RenderError::from)?
            }
        };
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use time::OffsetDateTime;

    use super::*;
    use crate::domain::entities::{Article, ArticleSummary};

    fn article(id: i64) -> Article {
        Article {
            id,
            title: format!("Article {id}"),
            content: Some("first\nsecond".to_string()),
            markdown: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[derive(Default)]
    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ArticleFetcher for CountingFetcher {
        async fn fetch_articles(&self) -> Result<Vec<ArticleSummary>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![article(1).summary()])
        }

        async fn fetch_article(&self, id: &str) -> Result<Option<Article>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(id.parse().ok().filter(|id| *id == 7).map(article))
        }
    }

    fn detail_match(id: &str) -> RouteMatch {
        RouteTable::standard()
            .resolve(&format!("/article/{id}"))
            .remove(0)
    }

    #[test]
    fn embedded_detail_requires_matching_id() {
        let embedded = SsrContext::with_article(Some(&article(7))).unwrap();

        assert!(matches!(
            select_source(Some(&embedded), &detail_match("7")),
            Some(DataSource::Embedded(_))
        ));
        assert_eq!(
            select_source(Some(&embedded), &detail_match("8")),
            Some(DataSource::Fetch(FetchPlan::Article {
                raw_id: "8".to_string()
            }))
        );
    }

    #[test]
    fn embedded_null_article_is_refetched() {
        let embedded = SsrContext::with_article(None).unwrap();
        assert!(matches!(
            select_source(Some(&embedded), &detail_match("7")),
            Some(DataSource::Fetch(_))
        ));
    }

    #[test]
    fn admin_needs_no_data() {
        let matched = RouteTable::standard().resolve("/admin").remove(0);
        assert_eq!(select_source(None, &matched), None);
    }

    #[tokio::test]
    async fn embedded_context_is_consumed_by_first_mount() {
        let fetcher = Arc::new(CountingFetcher::default());
        let embedded = SsrContext::with_article(Some(&article(7))).unwrap();
        let mut hydrator = Hydrator::new(RouteTable::standard(), fetcher.clone(), embedded);

        let first = hydrator.mount("/article/7").await.unwrap();
        assert_eq!(first.sources, vec![(Component::ArticleDetail, SourceKind::Embedded)]);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert!(!hydrator.has_embedded());

        let second = hydrator.mount("/article/7").await.unwrap();
        assert_eq!(second.sources, vec![(Component::ArticleDetail, SourceKind::Fetched)]);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.markup, second.markup);
    }

    #[tokio::test]
    async fn missing_article_renders_not_found_message() {
        let fetcher = Arc::new(CountingFetcher::default());
        let mut hydrator = Hydrator::new(RouteTable::standard(), fetcher, SsrContext::new());

        let page = hydrator.mount("/article/99").await.unwrap();
        assert!(page.markup.contains("Article not found"));
    }

    #[tokio::test]
    async fn unmatched_path_mounts_not_found() {
        let fetcher = Arc::new(CountingFetcher::default());
        let mut hydrator = Hydrator::new(RouteTable::standard(), fetcher, SsrContext::new());

        let page = hydrator.mount("/nope").await.unwrap();
        assert!(page.sources.is_empty());
        assert!(page.markup.contains("Page not found"));
    }
}
