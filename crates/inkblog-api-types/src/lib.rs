//! Request and response shapes of the inkblog JSON API.
//!
//! The server handlers, the SSR context and the client hydrator all decode
//! through these types, so a page rendered from embedded data and a page
//! rendered from a live fetch see exactly the same values.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A stored article as returned by `GET /api/articles/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    /// Legacy plain-text body, rendered paragraph by paragraph.
    #[serde(default)]
    pub content: Option<String>,
    /// Markdown source; preferred over `content` when present.
    #[serde(default)]
    pub markdown: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Article {
    pub fn summary(&self) -> ArticleSummary {
        ArticleSummary {
            id: self.id,
            title: self.title.clone(),
            created_at: self.created_at,
        }
    }
}

/// List entry returned by `GET /api/articles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: i64,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Body of `POST /api/articles` and `PUT /api/articles/:id`.
///
/// Every field is optional on the wire so that missing values surface as
/// validation errors instead of body rejections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub markdown: Option<String>,
}

/// Body of `POST /api/ai/generate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateRequest {
    pub title: Option<String>,
    pub keywords: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedContentBody {
    pub content: String,
    /// `"llm"` when the external provider answered, `"fallback"` otherwise.
    pub service: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthBody {
    pub status: String,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseProbeBody {
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub database_time: OffsetDateTime,
}

/// The `{success, data, fromCache, message, error}` envelope every API route answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_cache: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_url: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            from_cache: None,
            message: None,
            error: None,
            requested_url: None,
        }
    }

    pub fn with_from_cache(mut self, from_cache: bool) -> Self {
        self.from_cache = Some(from_cache);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiEnvelope<()> {
    pub fn acknowledged(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            from_cache: None,
            message: Some(message.into()),
            error: None,
            requested_url: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            from_cache: None,
            message: None,
            error: Some(error.into()),
            requested_url: None,
        }
    }

    pub fn with_requested_url(mut self, url: impl Into<String>) -> Self {
        self.requested_url = Some(url.into());
        self
    }
}
