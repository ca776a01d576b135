use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, warn};

use crate::presentation::views::render_app;

use super::{
    RenderError,
    context::SsrContext,
    loaders::{LoaderError, LoaderRegistry},
    routes::{Component, RouteMatch, RouteTable},
    template::{TemplateSource, splice},
};

const TARGET: &str = "inkblog::application::ssr";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub html: String,
    pub outcome: RenderOutcome,
}

#[derive(Clone)]
pub struct SsrRenderer {
    routes: Arc<RouteTable>,
    loaders: LoaderRegistry,
    template: Arc<TemplateSource>,
}

impl SsrRenderer {
    pub fn new(routes: RouteTable, loaders: LoaderRegistry, template: TemplateSource) -> Self {
        Self {
            routes: Arc::new(routes),
            loaders,
            template: Arc::new(template),
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Render `path`, or serve the fallback document when any stage fails.
    pub async fn render(&self, path: &str) -> RenderedDocument {
        match self.try_render(path).await {
            Ok(html) => RenderedDocument {
                html,
                outcome: RenderOutcome::Rendered,
            },
            Err(err) => {
                warn!(
                    target: TARGET,
                    path,
                    error = %err,
                    "server-side render failed; serving fallback document"
                );
                RenderedDocument {
                    html: self.default_document().await,
                    outcome: RenderOutcome::Fallback,
                }
            }
        }
    }

    /// The template untouched, for paths the client routes on its own.
    pub async fn default_document(&self) -> String {
        self.template.document_or_minimal().await
    }

    pub async fn try_render(&self, path: &str) -> Result<String, RenderError> {
        let matches = self.routes.resolve(path);
        let context = self.run_loaders(&matches).await?;

        let components: Vec<Component> = if matches.is_empty() {
            vec![Component::NotFound]
        } else {
            matches.iter().map(|matched| matched.component).collect()
        };
        let markup = render_app(&components, &context)?;
        let script = context.to_script_tag()?;

        let template = self.template.load().await?;
        let html = splice(template, &markup, &script)?;

        debug!(
            target: TARGET,
            path,
            components = ?components,
            context_keys = context.len(),
            "page rendered"
        );
        Ok(html)
    }

    /// Run every matched loader concurrently; the first rejection aborts the render.
    pub async fn run_loaders(&self, matches: &[RouteMatch]) -> Result<SsrContext, RenderError> {
        let pending = matches.iter().filter_map(|matched| {
            self.loaders.get(matched.component).map(|loader| async move {
                if let Some(param) = loader
                    .required_params()
                    .iter()
                    .find(|param| !matched.params.contains(param))
                {
                    return Err(LoaderError::MissingParam {
                        component: matched.component.name(),
                        param: *param,
                    });
                }
                loader.load(&matched.params).await
            })
        });

        let partials = try_join_all(pending).await?;
        Ok(partials
            .into_iter()
            .fold(SsrContext::new(), |mut merged, partial| {
                merged.merge(partial);
                merged
            }))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::application::ssr::{MINIMAL_DOCUMENT, RouteLoader, RouteParams};

    const TEMPLATE: &str = "<html><body><div id=\"root\"></div></body></html>";

    struct StaticLoader(&'static str);

    #[async_trait]
    impl RouteLoader for StaticLoader {
        async fn load(&self, _params: &RouteParams) -> Result<SsrContext, LoaderError> {
            let mut context = SsrContext::new();
            context.insert(self.0, Value::from(true));
            Ok(context)
        }
    }

    struct FailingLoader;

    #[async_trait]
    impl RouteLoader for FailingLoader {
        async fn load(&self, _params: &RouteParams) -> Result<SsrContext, LoaderError> {
            Err(LoaderError::MissingParam {
                component: "test",
                param: "forced",
            })
        }
    }

    struct NeedsSlug;

    #[async_trait]
    impl RouteLoader for NeedsSlug {
        fn required_params(&self) -> &'static [&'static str] {
            &["slug"]
        }

        async fn load(&self, _params: &RouteParams) -> Result<SsrContext, LoaderError> {
            Ok(SsrContext::new())
        }
    }

    fn renderer(loaders: LoaderRegistry, template: TemplateSource) -> SsrRenderer {
        SsrRenderer::new(RouteTable::standard(), loaders, template)
    }

    #[tokio::test]
    async fn matched_loaders_are_merged() {
        let table = RouteTable::new([("/", Component::ArticleList), ("/", Component::ArticleAdmin)]);
        let registry = LoaderRegistry::new()
            .with(Component::ArticleList, Arc::new(StaticLoader("first")))
            .with(Component::ArticleAdmin, Arc::new(StaticLoader("second")));
        let renderer = SsrRenderer::new(table, registry, TemplateSource::inline(TEMPLATE));

        let matches = renderer.routes().resolve("/");
        let context = renderer.run_loaders(&matches).await.unwrap();

        assert!(context.contains("first"));
        assert!(context.contains("second"));
    }

    #[tokio::test]
    async fn loader_rejection_serves_template_unmodified() {
        let registry =
            LoaderRegistry::new().with(Component::ArticleList, Arc::new(FailingLoader));
        let document = renderer(registry, TemplateSource::inline(TEMPLATE))
            .render("/")
            .await;

        assert_eq!(document.outcome, RenderOutcome::Fallback);
        assert_eq!(document.html, TEMPLATE);
    }

    #[tokio::test]
    async fn missing_required_param_rejects() {
        let table = RouteTable::new([("/", Component::ArticleList)]);
        let registry = LoaderRegistry::new().with(Component::ArticleList, Arc::new(NeedsSlug));
        let renderer = SsrRenderer::new(table, registry, TemplateSource::inline(TEMPLATE));

        let err = renderer.try_render("/").await.unwrap_err();
        assert!(matches!(
            err,
            RenderError::Loader(LoaderError::MissingParam { param: "slug", .. })
        ));
    }

    #[tokio::test]
    async fn unreadable_template_falls_back_to_minimal_document() {
        let dir = tempfile::tempdir().unwrap();
        let source = TemplateSource::from_path(dir.path().join("missing.html"));
        let document = renderer(LoaderRegistry::new(), source).render("/admin").await;

        assert_eq!(document.outcome, RenderOutcome::Fallback);
        assert_eq!(document.html, MINIMAL_DOCUMENT);
    }

    #[tokio::test]
    async fn unmatched_path_renders_not_found_with_empty_context() {
        let html = renderer(LoaderRegistry::new(), TemplateSource::inline(TEMPLATE))
            .try_render("/nowhere")
            .await
            .unwrap();

        assert!(html.contains("Page not found"));
        assert!(html.contains("window.__INITIAL_DATA__ = {};"));
    }

    #[tokio::test]
    async fn template_without_mount_point_falls_back() {
        let document = renderer(
            LoaderRegistry::new(),
            TemplateSource::inline("<html><body></body></html>"),
        )
        .render("/admin")
        .await;

        assert_eq!(document.outcome, RenderOutcome::Fallback);
        assert_eq!(document.html, "<html><body></body></html>");
    }
}
