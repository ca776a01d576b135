//! AI-assisted opening paragraphs with a deterministic fallback.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::Rng;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::articles::ensure_non_empty;
use crate::domain::error::DomainError;

const TARGET: &str = "inkblog::application::ai";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider transport failed: {0}")]
    Transport(String),
    #[error("provider answered with status {status}")]
    Status { status: u16 },
    #[error("unexpected provider response: {0}")]
    Shape(String),
    #[error("access token exchange failed: {0}")]
    Token(String),
}

/// One external text-generation endpoint.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Outcome of a generation request. The text is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedContent {
    Generated(String),
    Fallback(String),
}

impl GeneratedContent {
    pub fn text(&self) -> &str {
        match self {
            Self::Generated(text) | Self::Fallback(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Generated(text) | Self::Fallback(text) => text,
        }
    }

    pub fn service(&self) -> &'static str {
        match self {
            Self::Generated(_) => "llm",
            Self::Fallback(_) => "fallback",
        }
    }
}

/// Source of indices for fallback selection.
pub trait RandomSource: Send + Sync {
    /// Returns a value in `0..upper`. `upper` is never zero.
    fn next_index(&self, upper: usize) -> usize;
}

/// Production randomness from the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_index(&self, upper: usize) -> usize {
        rand::thread_rng().gen_range(0..upper)
    }
}

/// Replays a fixed sequence of indices, wrapping modulo the requested bound.
#[derive(Debug, Default)]
pub struct ScriptedRandom {
    values: Vec<usize>,
    cursor: Mutex<usize>,
}

impl ScriptedRandom {
    pub fn new(values: Vec<usize>) -> Self {
        Self {
            values,
            cursor: Mutex::new(0),
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_index(&self, upper: usize) -> usize {
        if self.values.is_empty() {
            return 0;
        }
        let mut cursor = match self.cursor.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let value = self.values[*cursor % self.values.len()];
        *cursor += 1;
        value % upper
    }
}

type TitleTemplate = fn(&str) -> String;

const TEMPLATES: [TitleTemplate; 5] = [
    |title| {
        format!(
            "\"{title}\" is a topic drawing more attention than ever. As times change, people keep arriving at a deeper understanding of it."
        )
    },
    |title| {
        format!(
            "\"{title}\" touches almost every part of daily life. This post looks at it from several angles."
        )
    },
    |title| {
        format!(
            "Thinking about \"{title}\" means weighing its history, where it stands today and where it is heading. It rewards careful thought."
        )
    },
    |title| {
        format!(
            "\"{title}\" is not only a theoretical question; it shapes the way we live. Let us explore it together."
        )
    },
    |title| {
        format!(
            "People see \"{title}\" in very different ways. This post tries to offer a rounded perspective."
        )
    },
];

const ENHANCEMENTS: [&str; 5] = [
    "First, it helps to understand the basic ideas and how they developed.",
    "In practice, the question has real consequences.",
    "Notably, work in this area has moved forward quickly in recent years.",
    "Along the way, new technology has played a key role.",
    "Experts have offered a range of valuable views and suggestions on it.",
];

/// Builds fallback paragraphs from a fixed template and enhancement set.
#[derive(Clone)]
pub struct FallbackComposer {
    random: Arc<dyn RandomSource>,
}

impl FallbackComposer {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }

    pub fn compose(&self, title: &str) -> String {
        let template = TEMPLATES[self.random.next_index(TEMPLATES.len())];
        let enhancement = ENHANCEMENTS[self.random.next_index(ENHANCEMENTS.len())];
        format!("{} {}", template(title), enhancement)
    }

    /// Every paragraph [`compose`](Self::compose) can return for `title`.
    pub fn candidates(title: &str) -> Vec<String> {
        TEMPLATES
            .iter()
            .flat_map(|template| {
                ENHANCEMENTS
                    .iter()
                    .map(move |enhancement| format!("{} {}", template(title), enhancement))
            })
            .collect()
    }
}

pub fn build_prompt(title: &str, keywords: Option<&str>) -> String {
    let keywords_line = keywords
        .map(str::trim)
        .filter(|keywords| !keywords.is_empty())
        .map(|keywords| format!("Keywords: {keywords}\n"))
        .unwrap_or_default();

    format!(
        "Write the opening paragraph of a blog post for the title below. \
         Keep it lively and engaging, around 200 words, and suited to casual reading.\n\n\
         Title: {title}\n{keywords_line}\n\
         Reply with the paragraph only, without explanations or extra notes."
    )
}

/// Generation entry point used by the HTTP layer. Never fails for provider problems.
#[derive(Clone)]
pub struct AiContentService {
    provider: Option<Arc<dyn GenerationProvider>>,
    fallback: FallbackComposer,
}

impl AiContentService {
    pub fn new(provider: Option<Arc<dyn GenerationProvider>>, random: Arc<dyn RandomSource>) -> Self {
        Self {
            provider,
            fallback: FallbackComposer::new(random),
        }
    }

    /// Only a blank title is an error.
    pub async fn generate(
        &self,
        title: Option<&str>,
        keywords: Option<&str>,
    ) -> Result<GeneratedContent, DomainError> {
        ensure_non_empty(title, "title")?;
        let title = title.unwrap_or_default().trim();

        let Some(provider) = self.provider.as_ref() else {
            return Ok(GeneratedContent::Fallback(self.fallback.compose(title)));
        };

        let prompt = build_prompt(title, keywords);
        match provider.generate(&prompt).await {
            Ok(text) if !text.trim().is_empty() => {
                info!(target: TARGET, title, "generated content from provider");
                Ok(GeneratedContent::Generated(text))
            }
            Ok(_) => {
                warn!(target: TARGET, title, "provider returned empty text; using fallback");
                Ok(GeneratedContent::Fallback(self.fallback.compose(title)))
            }
            Err(err) => {
                warn!(target: TARGET, title, error = %err, "provider failed; using fallback");
                Ok(GeneratedContent::Fallback(self.fallback.compose(title)))
            }
        }
    }
}
