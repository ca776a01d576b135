//! Page handling for every path the API router does not claim.

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    response::{Html, IntoResponse, Response},
};
use tracing::debug;

use crate::application::ssr::RenderOutcome;
use crate::domain::articles::parse_article_id;

use super::{HttpState, ResponseTrace, api::error::ApiError};

const TARGET: &str = "inkblog::infra::http::pages";

/// Static file, then unknown API path, then SSR for page routes, then the bare template.
pub async fn page_fallback(State(state): State<HttpState>, request: Request<Body>) -> Response {
    let uri = request.uri().clone();
    let path = uri.path();
    let requested_url = uri
        .path_and_query()
        .map(|value| value.as_str().to_string())
        .unwrap_or_else(|| path.to_string());

    let readable = matches!(*request.method(), Method::GET | Method::HEAD);
    if !readable || is_api_path(path) {
        return ApiError::route_not_found(requested_url).into_response();
    }

    if let Some(response) = state.assets.serve(path).await {
        return ResponseTrace::route("static")
            .document("asset")
            .attach(response);
    }

    let matches = state.renderer.routes().resolve(path);
    let Some(first) = matches.first() else {
        debug!(target: TARGET, path, "no page route; serving template for client routing");
        return ResponseTrace::route("client")
            .document("template")
            .attach(Html(state.renderer.default_document().await));
    };
    let trace = ResponseTrace::route(first.component.name()).article(
        matches
            .iter()
            .find_map(|matched| matched.params.get("id"))
            .and_then(parse_article_id),
    );

    let document = state.renderer.render(path).await;
    let kind = match document.outcome {
        RenderOutcome::Rendered => "ssr",
        RenderOutcome::Fallback => {
            debug!(target: TARGET, path, "served fallback document");
            "fallback"
        }
    };
    trace.document(kind).attach(Html(document.html))
}

fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_prefix_is_segment_aware() {
        assert!(is_api_path("/api"));
        assert!(is_api_path("/api/unknown"));
        assert!(!is_api_path("/apiary"));
        assert!(!is_api_path("/article/1"));
    }
}
