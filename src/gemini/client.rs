use axum::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;

use crate::config::GeminiConfig;

/// One piece of a multimodal prompt.
pub enum Part {
    Text(String),
    InlineData { mime_type: String, data: Bytes },
}

/// Narrow capability interface over the generative model: parts in, raw text
/// out. Everything above this seam (prompts, parsing) is testable with a
/// canned implementation.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, parts: Vec<Part>) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(cfg: &GeminiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Deserialize)]
struct TextPart {
    text: Option<String>,
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, parts: Vec<Part>) -> anyhow::Result<String> {
        let parts: Vec<serde_json::Value> = parts
            .into_iter()
            .map(|p| match p {
                Part::Text(text) => json!({ "text": text }),
                Part::InlineData { mime_type, data } => json!({
                    "inline_data": {
                        "mime_type": mime_type,
                        "data": BASE64.encode(&data),
                    }
                }),
            })
            .collect();

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let resp = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "contents": [{ "parts": parts }] }))
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateResponse>()
            .await?;

        let text: String = resp
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();

        if text.is_empty() {
            anyhow::bail!("model returned no text");
        }
        Ok(text)
    }
}
