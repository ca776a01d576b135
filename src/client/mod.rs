//! Client-side hydration.
//!
//! Mirrors what the browser does with a server-rendered page: read the
//! embedded context once, decide per component whether to trust it or fetch,
//! and render through the same views the server used.

mod embedded;
mod fetch;
mod hydrator;

use std::sync::Arc;

use tracing::info;

use crate::application::ssr::{RouteTable, SsrContext};

pub use embedded::EmbeddedContext;
pub use fetch::{ArticleFetcher, FetchError, HttpArticleFetcher};
pub use hydrator::{
    DataSource, FetchPlan, HydrateError, HydratedPage, Hydrator, SourceKind, select_source,
};

const TARGET: &str = "inkblog::client";

#[derive(Debug, Clone)]
pub struct HydrationReport {
    pub path: String,
    pub embedded: HydratedPage,
    pub fetched: HydratedPage,
    /// The served document contains exactly the markup the hydrator produced.
    pub server_markup_matches: bool,
}

impl HydrationReport {
    /// Hydrating from embedded data and from a cold fetch produced the same page.
    pub fn converged(&self) -> bool {
        self.embedded.markup == self.fetched.markup
    }

    pub fn passed(&self) -> bool {
        self.converged() && self.server_markup_matches
    }
}

/// Hydrate `html` twice, once from its embedded context and once from a cold fetch.
pub async fn compare_hydration(
    routes: &RouteTable,
    fetcher: Arc<dyn ArticleFetcher>,
    path: &str,
    html: &str,
) -> Result<HydrationReport, HydrateError> {
    let embedded = EmbeddedContext::extract(html);
    let warm = Hydrator::new(routes.clone(), Arc::clone(&fetcher), embedded)
        .mount(path)
        .await?;
    let cold = Hydrator::new(routes.clone(), fetcher, SsrContext::new())
        .mount(path)
        .await?;

    Ok(HydrationReport {
        path: path.to_string(),
        server_markup_matches: html.contains(&warm.markup),
        embedded: warm,
        fetched: cold,
    })
}

/// Fetch `path` from a running site and check that hydration converges.
pub async fn verify_hydration(site: &str, path: &str) -> Result<HydrationReport, HydrateError> {
    let fetcher = HttpArticleFetcher::new(site)?;
    let html = fetcher.fetch_page(path).await?;
    let report = compare_hydration(&RouteTable::standard(), Arc::new(fetcher), path, &html).await?;

    info!(
        target: TARGET,
        site,
        path,
        converged = report.converged(),
        server_markup_matches = report.server_markup_matches,
        "hydration verified"
    );
    Ok(report)
}
