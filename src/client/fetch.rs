use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::domain::entities::{Article, ArticleSummary};
use inkblog_api_types::ApiEnvelope;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {status} for {url}")]
    Status { status: u16, url: String },
    #[error("failed to parse body: {0}")]
    Decode(String),
    #[error("server reported failure: {0}")]
    Api(String),
}

/// The fetches a page would issue when no embedded data is usable.
#[async_trait]
pub trait ArticleFetcher: Send + Sync {
    async fn fetch_articles(&self) -> Result<Vec<ArticleSummary>, FetchError>;

    /// `Ok(None)` when the server answers 404.
    async fn fetch_article(&self, id: &str) -> Result<Option<Article>, FetchError>;
}

/// Fetcher over the JSON API of a running server.
#[derive(Clone, Debug)]
pub struct HttpArticleFetcher {
    client: Client,
    base: Url,
}

impl HttpArticleFetcher {
    pub fn new(site: &str) -> Result<Self, FetchError> {
        let base = Url::parse(site)?.join("/")?;
        let client = Client::builder().user_agent(Self::user_agent()).build()?;
        Ok(Self { client, base })
    }

    pub fn user_agent() -> &'static str {
        concat!("inkblog-hydrator/", env!("CARGO_PKG_VERSION"))
    }

    pub fn url(&self, path: &str) -> Result<Url, FetchError> {
        self.base.join(path).map_err(FetchError::Url)
    }

    /// Raw HTML of a page, as a browser would receive it.
    pub async fn fetch_page(&self, path: &str) -> Result<String, FetchError> {
        let url = self.url(path)?;
        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }

    async fn get_envelope<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<ApiEnvelope<T>>, FetchError> {
        let url = self.url(path)?;
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|err| FetchError::Decode(err.to_string()))
    }
}

fn unwrap_envelope<T>(envelope: ApiEnvelope<T>) -> Result<T, FetchError> {
    match (envelope.success, envelope.data) {
        (true, Some(data)) => Ok(data),
        (_, _) => Err(FetchError::Api(
            envelope
                .error
                .unwrap_or_else(|| "response carried no data".to_string()),
        )),
    }
}

#[async_trait]
impl ArticleFetcher for HttpArticleFetcher {
    async fn fetch_articles(&self) -> Result<Vec<ArticleSummary>, FetchError> {
        let envelope = self
            .get_envelope::<Vec<ArticleSummary>>("/api/articles")
            .await?
            .ok_or_else(|| FetchError::Status {
                status: StatusCode::NOT_FOUND.as_u16(),
                url: "/api/articles".to_string(),
            })?;
        unwrap_envelope(envelope)
    }

    async fn fetch_article(&self, id: &str) -> Result<Option<Article>, FetchError> {
        match self
            .get_envelope::<Article>(&format!("/api/articles/{id}"))
            .await?
        {
            Some(envelope) => unwrap_envelope(envelope).map(Some),
            None => Ok(None),
        }
    }
}
