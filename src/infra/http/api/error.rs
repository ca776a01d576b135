use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::articles::ArticleError;
use crate::application::error::ErrorReport;
use crate::application::repos::RepoError;
use crate::domain::error::DomainError;
use inkblog_api_types::ApiEnvelope;

/// A JSON API failure rendered as `{success: false, error}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    /// Diagnostic for the response log; never sent to the client.
    detail: Option<String>,
    requested_url: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            status,
            message: message.into(),
            detail,
            requested_url: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, None)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message, None)
    }

    pub fn internal(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message,
            Some(detail.into()),
        )
    }

    /// Unknown path under `/api`.
    pub fn route_not_found(requested_url: impl Into<String>) -> Self {
        Self {
            requested_url: Some(requested_url.into()),
            ..Self::not_found("Route not found")
        }
    }

    /// Map a service failure; `failure` is the client-facing text for store errors.
    pub fn from_article(failure: &'static str, err: ArticleError) -> Self {
        match err {
            ArticleError::Validation(err) => domain_to_api(err),
            ArticleError::NotFound { .. } => Self::not_found("Article not found"),
            ArticleError::Repo(err) => repo_to_api(failure, err),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub(crate) fn domain_to_api(err: DomainError) -> ApiError {
    match err {
        DomainError::Validation { message } => ApiError::bad_request(message),
        DomainError::NotFound { entity } => ApiError::not_found(format!("{entity} not found")),
    }
}

pub(crate) fn repo_to_api(failure: &'static str, err: RepoError) -> ApiError {
    match err {
        RepoError::InvalidInput { message } => ApiError::bad_request(message),
        RepoError::Timeout => ApiError::internal(failure, "database timeout"),
        RepoError::Persistence(message) => ApiError::internal(failure, message),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let diagnostic = match &self.detail {
            Some(detail) => format!("{}: {detail}", self.message),
            None => self.message.clone(),
        };

        let mut body = ApiEnvelope::failure(self.message);
        if let Some(url) = self.requested_url {
            body = body.with_requested_url(url);
        }

        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message("infra::http::api", self.status, diagnostic)
            .attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_statuses() {
        let validation = ApiError::from_article(
            "Failed to create article",
            ArticleError::Validation(DomainError::validation("title must not be empty")),
        );
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(validation.message(), "title must not be empty");

        let missing = ApiError::from_article("x", ArticleError::NotFound { id: 3 });
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let store = ApiError::from_article(
            "Failed to update article",
            ArticleError::Repo(RepoError::Persistence("connection reset".into())),
        );
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.message(), "Failed to update article");
    }

    #[test]
    fn response_carries_report_without_leaking_detail() {
        let response = ApiError::internal("Failed to fetch articles", "pool closed").into_response();
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.messages, vec!["Failed to fetch articles: pool closed".to_string()]);
    }
}
