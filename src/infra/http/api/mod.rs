pub mod error;
pub mod handlers;

use axum::{
    Router,
    routing::{get, post},
};

use crate::infra::http::HttpState;

/// Routes under `/api`. Unknown `/api/*` paths are answered by the page fallback.
pub fn build_api_router() -> Router<HttpState> {
    Router::new()
        .route(
            "/api/articles",
            get(handlers::list_articles).post(handlers::create_article),
        )
        .route(
            "/api/articles/{id}",
            get(handlers::get_article)
                .put(handlers::update_article)
                .delete(handlers::delete_article),
        )
        .route("/api/ai/generate", post(handlers::generate_content))
        .route("/api/health", get(handlers::health))
        .route("/api/test", get(handlers::database_probe))
}
