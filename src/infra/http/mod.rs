pub mod api;
mod middleware;
mod pages;

pub use middleware::{RequestContext, ResponseTrace};

use std::sync::Arc;

use axum::{Router, middleware as axum_middleware};

use crate::application::{ai::AiContentService, articles::ArticleService, ssr::SsrRenderer};
use crate::infra::assets::StaticAssets;

use self::middleware::{log_responses, set_request_context};

/// Everything the HTTP handlers need, cloned per request.
#[derive(Clone)]
pub struct HttpState {
    pub articles: ArticleService,
    pub ai: Arc<AiContentService>,
    pub renderer: SsrRenderer,
    pub assets: StaticAssets,
}

pub fn build_router(state: HttpState) -> Router {
    api::build_api_router()
        .fallback(pages::page_fallback)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
