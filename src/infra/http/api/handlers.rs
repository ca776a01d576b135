//! JSON API handlers.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use time::OffsetDateTime;

use crate::domain::articles::parse_article_id;
use crate::infra::http::{HttpState, ResponseTrace};
use inkblog_api_types::{
    ApiEnvelope, ArticleInput, DatabaseProbeBody, GenerateRequest, GeneratedContentBody,
    HealthBody,
};

use super::error::{ApiError, domain_to_api};

/// Unwrap a JSON body, reporting malformed input as 400 in the API envelope.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

fn article_id(raw: &str) -> Result<i64, ApiError> {
    parse_article_id(raw).ok_or_else(|| ApiError::not_found("Article not found"))
}

pub async fn list_articles(State(state): State<HttpState>) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .articles
        .list()
        .await
        .map_err(|err| ApiError::from_article("Failed to fetch articles", err))?;

    Ok(ResponseTrace::route("articles.list")
        .cache(outcome.from_cache)
        .attach(Json(
            ApiEnvelope::ok(outcome.articles).with_from_cache(outcome.from_cache),
        )))
}

pub async fn get_article(
    State(state): State<HttpState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = article_id(&raw_id)?;
    let read = state
        .articles
        .get(id)
        .await
        .map_err(|err| ApiError::from_article("Failed to fetch article", err))?
        .ok_or_else(|| ApiError::not_found("Article not found"))?;

    Ok(ResponseTrace::route("articles.get")
        .article(Some(id))
        .cache(read.from_cache)
        .attach(Json(
            ApiEnvelope::ok(read.article).with_from_cache(read.from_cache),
        )))
}

pub async fn create_article(
    State(state): State<HttpState>,
    payload: Result<Json<ArticleInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let input = json_body(payload)?;
    let article = state
        .articles
        .create(input)
        .await
        .map_err(|err| ApiError::from_article("Failed to create article", err))?;

    Ok(ResponseTrace::route("articles.create")
        .article(Some(article.id))
        .attach(Json(
            ApiEnvelope::ok(article).with_message("Article created"),
        )))
}

pub async fn update_article(
    State(state): State<HttpState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<ArticleInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = article_id(&raw_id)?;
    let input = json_body(payload)?;
    let article = state
        .articles
        .update(id, input)
        .await
        .map_err(|err| ApiError::from_article("Failed to update article", err))?;

    Ok(ResponseTrace::route("articles.update")
        .article(Some(id))
        .attach(Json(
            ApiEnvelope::ok(article).with_message("Article updated"),
        )))
}

pub async fn delete_article(
    State(state): State<HttpState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = article_id(&raw_id)?;
    state
        .articles
        .delete(id)
        .await
        .map_err(|err| ApiError::from_article("Failed to delete article", err))?;

    Ok(ResponseTrace::route("articles.delete")
        .article(Some(id))
        .attach(Json(ApiEnvelope::acknowledged("Article deleted"))))
}

pub async fn generate_content(
    State(state): State<HttpState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(payload)?;
    let generated = state
        .ai
        .generate(request.title.as_deref(), request.keywords.as_deref())
        .await
        .map_err(domain_to_api)?;

    let body = GeneratedContentBody {
        service: generated.service().to_string(),
        content: generated.into_text(),
    };
    Ok(ResponseTrace::route("ai.generate").attach(Json(ApiEnvelope::ok(body))))
}

pub async fn health() -> impl IntoResponse {
    Json(HealthBody {
        status: "OK".to_string(),
        message: "inkblog is running".to_string(),
        timestamp: OffsetDateTime::now_utc(),
    })
}

pub async fn database_probe(State(state): State<HttpState>) -> Result<impl IntoResponse, ApiError> {
    let database_time = state
        .articles
        .database_time()
        .await
        .map_err(|err| ApiError::from_article("Database connection failed", err))?;

    Ok(Json(DatabaseProbeBody {
        message: "Database connection OK".to_string(),
        database_time,
    }))
}
