//! Server-side rendering of page routes.
//!
//! A request moves through ResolveRoute → RunLoaders → Render → Serialize →
//! Respond. Any failure drops to the fallback document so the browser always
//! receives something it can hydrate or render on its own.

mod context;
mod loaders;
mod renderer;
mod routes;
mod template;

use thiserror::Error;

pub use context::{ARTICLE_KEY, ARTICLES_KEY, INITIAL_DATA_GLOBAL, SsrContext};
pub use loaders::{
    ArticleDetailLoader, ArticleListLoader, LoaderError, LoaderRegistry, RouteLoader,
};
pub use renderer::{RenderOutcome, RenderedDocument, SsrRenderer};
pub use routes::{Component, RouteMatch, RouteParams, RoutePattern, RouteTable};
pub use template::{MINIMAL_DOCUMENT, MOUNT_SELECTOR, TemplateSource, splice};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error("failed to render component {component}")]
    Template {
        component: &'static str,
        #[source]
        source: askama::Error,
    },
    #[error("failed to serialise page context")]
    Serialize(#[from] serde_json::Error),
    #[error("template document `{path}` is unavailable")]
    TemplateUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("template document has no `{MOUNT_SELECTOR}` mount point")]
    MountPointMissing,
    #[error("failed to rewrite template document: {0}")]
    Rewrite(String),
}
