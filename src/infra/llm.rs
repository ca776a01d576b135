use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::ai::{GenerationProvider, ProviderError};
use crate::config::{AiProviderSettings, AiSettings};

use super::error::InfraError;

const TARGET: &str = "inkblog::infra::llm";

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    top_p: f32,
    penalty_score: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error_msg: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

struct CachedToken {
    value: String,
    fetched_at: Instant,
}

/// Chat-completion client that exchanges API credentials for an access token
/// and keeps the token until its configured lifetime runs out.
pub struct HttpGenerationClient {
    client: Client,
    settings: AiProviderSettings,
    token: Mutex<Option<CachedToken>>,
}

impl HttpGenerationClient {
    pub fn new(settings: AiProviderSettings, ai: &AiSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(concat!("inkblog/", env!("CARGO_PKG_VERSION")))
            .timeout(ai.timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;
        Ok(Self {
            client,
            settings,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, ProviderError> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref()
            && token.fetched_at.elapsed() < self.settings.token_lifetime
        {
            return Ok(token.value.clone());
        }

        let mut url = self.settings.token_url.clone();
        url.query_pairs_mut()
            .append_pair("grant_type", "client_credentials")
            .append_pair("client_id", &self.settings.api_key)
            .append_pair("client_secret", &self.settings.secret_key);

        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|err| ProviderError::Token(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ProviderError::Status {
                status: response.status().as_u16(),
            });
        }
        let body: TokenResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::Token(err.to_string()))?;
        let value = body
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ProviderError::Token("response carried no access_token".to_string()))?;

        debug!(target: TARGET, "obtained provider access token");
        *guard = Some(CachedToken {
            value: value.clone(),
            fetched_at: Instant::now(),
        });
        Ok(value)
    }

    fn endpoint_with_token(&self, token: &str) -> Url {
        let mut url = self.settings.endpoint.clone();
        url.query_pairs_mut().append_pair("access_token", token);
        url
    }
}

#[async_trait]
impl GenerationProvider for HttpGenerationClient {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let token = self.access_token().await?;
        let request = ChatRequest {
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.8,
            top_p: 0.8,
            penalty_score: 1.0,
        };

        let response = self
            .client
            .post(self.endpoint_with_token(&token))
            .json(&request)
            .send()
            .await
            .map_err(|err| ProviderError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::Shape(err.to_string()))?;
        parse_result(body)
    }
}

fn parse_result(body: ChatResponse) -> Result<String, ProviderError> {
    match body.result {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ProviderError::Shape(
            body.error_msg
                .unwrap_or_else(|| "response carried no result".to_string()),
        )),
    }
}
