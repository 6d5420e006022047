//! AI-assisted editing.
//!
//! [`Assistant`] wraps an optional [`TextGenerator`]. Every operation has a
//! fallback answer, so a missing API key or a failing upstream degrades the
//! feature instead of failing the request.

use std::sync::Arc;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::Ai as AiConfig;
use crate::error::{Error, Result};
use crate::router::BoxFuture;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Returned by [`Assistant::summarize`] when no generator is configured.
pub const MISSING_KEY_NOTICE: &str =
    "AI features require an API key. Set INKSTONE_AI_API_KEY to enable them.";

/// An external text-generation endpoint.
pub trait TextGenerator: Send + Sync {
    /// Complete a single-turn prompt.
    fn generate<'a>(&'a self, prompt: &'a str, max_tokens: u32) -> BoxFuture<'a, Result<String>>;
}

/// Client for the Anthropic Messages API.
pub struct Anthropic {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl Anthropic {
    pub fn new(config: &AiConfig, api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            model: config.model.clone(),
            endpoint: format!("{}/v1/messages", config.base_url.trim_end_matches('/')),
        })
    }

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let response: MessagesResponse = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| Error::Internal("AI response contained no text".into()))
    }
}

impl TextGenerator for Anthropic {
    fn generate<'a>(&'a self, prompt: &'a str, max_tokens: u32) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.complete(prompt, max_tokens))
    }
}

/// SEO suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Seo {
    pub meta_description: String,
    pub keywords: Vec<String>,
    pub seo_score: u32,
}

/// Sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Positive,
    Neutral,
    Negative,
}

/// Sentiment analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Sentiment {
    pub sentiment: Mood,
    pub confidence: u32,
    pub emotions: Vec<String>,
}

// Lenient shapes for model output; every field may be missing.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSeo {
    #[serde(default)]
    meta_description: Option<String>,
    #[serde(default)]
    keywords: Option<Vec<String>>,
    #[serde(default)]
    seo_score: Option<f64>,
}

#[derive(Deserialize)]
struct RawSentiment {
    #[serde(default)]
    sentiment: Option<Mood>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    emotions: Option<Vec<String>>,
}

/// Truncate to at most `max` characters.
fn clip(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Treat zero and missing scores alike.
fn score_or(value: Option<f64>, fallback: u32) -> u32 {
    match value {
        Some(v) if v > 0.0 => v.round().min(100.0) as u32,
        _ => fallback,
    }
}

/// Facade over an optional generator.
#[derive(Clone, Default)]
pub struct Assistant {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl Assistant {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    /// Build from config: an Anthropic client if a key is set, otherwise
    /// fallback-only.
    pub fn from_config(config: &AiConfig) -> Result<Self> {
        let generator = match &config.api_key {
            Some(key) => {
                let client: Arc<dyn TextGenerator> = Arc::new(Anthropic::new(config, key.clone())?);
                Some(client)
            }
            None => {
                tracing::info!("No AI API key configured; AI features will return fallbacks");
                None
            }
        };
        Ok(Self { generator })
    }

    pub fn is_enabled(&self) -> bool {
        self.generator.is_some()
    }

    /// Two-sentence summary.
    pub async fn summarize(&self, content: &str) -> String {
        let Some(generator) = &self.generator else {
            return MISSING_KEY_NOTICE.to_string();
        };
        let prompt = format!("Summarize in 2 sentences:\n\n{}", clip(content, 500));
        match generator.generate(&prompt, 100).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("AI summarize failed: {e}");
                "Error generating summary".to_string()
            }
        }
    }

    pub async fn seo(&self, title: &str, content: &str) -> Seo {
        let Some(generator) = &self.generator else {
            return Seo {
                meta_description: "Add an AI API key".to_string(),
                keywords: Vec::new(),
                seo_score: 0,
            };
        };
        let prompt = format!(
            "SEO for: {title}\n{}\nJSON: {{metaDescription, keywords[], seoScore}}",
            clip(content, 300)
        );
        let parsed = match generator.generate(&prompt, 150).await {
            Ok(text) => serde_json::from_str::<RawSeo>(text.trim()).map_err(Error::from),
            Err(e) => Err(e),
        };
        match parsed {
            Ok(raw) => Seo {
                meta_description: raw.meta_description.unwrap_or_default(),
                keywords: raw.keywords.unwrap_or_default(),
                seo_score: score_or(raw.seo_score, 50),
            },
            Err(e) => {
                tracing::warn!("AI SEO failed: {e}");
                Seo {
                    meta_description: clip(content, 150).to_string(),
                    keywords: Vec::new(),
                    seo_score: 50,
                }
            }
        }
    }

    pub async fn sentiment(&self, content: &str) -> Sentiment {
        let Some(generator) = &self.generator else {
            return Sentiment {
                sentiment: Mood::Neutral,
                confidence: 0,
                emotions: Vec::new(),
            };
        };
        let prompt = format!(
            "Sentiment: {}\nJSON: {{sentiment, confidence, emotions[]}}",
            clip(content, 300)
        );
        let parsed = match generator.generate(&prompt, 80).await {
            Ok(text) => serde_json::from_str::<RawSentiment>(text.trim()).map_err(Error::from),
            Err(e) => Err(e),
        };
        match parsed {
            Ok(raw) => Sentiment {
                sentiment: raw.sentiment.unwrap_or(Mood::Neutral),
                confidence: score_or(raw.confidence, 50),
                emotions: raw.emotions.unwrap_or_default(),
            },
            Err(e) => {
                tracing::warn!("AI sentiment failed: {e}");
                Sentiment {
                    sentiment: Mood::Neutral,
                    confidence: 50,
                    emotions: Vec::new(),
                }
            }
        }
    }

    pub async fn tags(&self, title: &str, content: &str) -> Vec<String> {
        let Some(generator) = &self.generator else {
            return Vec::new();
        };
        let prompt = format!(
            "Tags for: {title} {}\nJSON array of 4 tags:",
            clip(content, 200)
        );
        let parsed = match generator.generate(&prompt, 50).await {
            Ok(text) => serde_json::from_str::<Vec<String>>(text.trim()).map_err(Error::from),
            Err(e) => Err(e),
        };
        parsed.unwrap_or_else(|e| {
            tracing::warn!("AI tags failed: {e}");
            Vec::new()
        })
    }
}
