use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::interpreter::Completion;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request to generation service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not build generation client: {0}")]
    Client(String),
}

/// Text-completion service the kitchen asks when a dish isn't cached.
#[async_trait]
pub trait DishGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<Completion, GenerationError>;
}

// Sampling and safety knobs sent with every request
#[derive(Clone, Debug)]
pub struct GenerationSettings {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub safety_threshold: String,
    pub timeout: Duration,
}

impl GenerationSettings {
    fn request_body(&self, prompt: &str) -> Value {
        let safety: Vec<Value> = SAFETY_CATEGORIES
            .iter()
            .map(|category| json!({ "category": category, "threshold": self.safety_threshold }))
            .collect();

        json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": self.temperature,
                "topP": self.top_p,
                "topK": self.top_k,
                "maxOutputTokens": self.max_output_tokens,
            },
            "safetySettings": safety,
        })
    }
}

// Gemini generateContent over plain REST
pub struct GeminiClient {
    client: reqwest::Client,
    settings: GenerationSettings,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_base", &self.settings.api_base)
            .field("model", &self.settings.model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(settings: GenerationSettings) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| GenerationError::Client(e.to_string()))?;
        Ok(Self { client, settings })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.api_base.trim_end_matches('/'),
            self.settings.model
        )
    }
}

/// Pulls the reply text out of a generateContent body. A missing candidate
/// or a candidate with no text parts means the service declined to answer.
pub fn completion_from_body(body: &Value) -> Completion {
    let candidate = body["candidates"].as_array().and_then(|c| c.first());

    let text = candidate
        .and_then(|c| c["content"]["parts"].as_array())
        .map(|parts| {
            parts
                .iter()
                .filter(|p| !p["thought"].as_bool().unwrap_or(false))
                .filter_map(|p| p["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default();

    if !text.trim().is_empty() {
        return Completion::Text(text.trim().to_string());
    }

    let reason = body["promptFeedback"]["blockReason"]
        .as_str()
        .or_else(|| candidate.and_then(|c| c["finishReason"].as_str()))
        .unwrap_or("NO_CANDIDATES")
        .to_string();
    Completion::Blocked { reason }
}

#[async_trait]
impl DishGenerator for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<Completion, GenerationError> {
        debug!(model = %self.settings.model, "sending prompt");

        let res = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.settings.api_key)
            .json(&self.settings.request_body(prompt))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = res.json().await?;
        let completion = completion_from_body(&body);
        if let Completion::Text(text) = &completion {
            info!(raw = %text, "generation reply");
        }
        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(api_base: String) -> GenerationSettings {
        GenerationSettings {
            api_base,
            api_key: "test-key".into(),
            model: "gemini-test".into(),
            temperature: 0.6,
            top_p: 1.0,
            top_k: 1,
            max_output_tokens: 300,
            safety_threshold: "BLOCK_MEDIUM_AND_ABOVE".into(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn body_carries_generation_config_and_safety() {
        let body = settings("http://x".into()).request_body("cook this");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "cook this");
        assert_eq!(body["generationConfig"]["topK"], 1);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 300);
        assert_eq!(body["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(body["safetySettings"][0]["threshold"], "BLOCK_MEDIUM_AND_ABOVE");
    }

    #[test]
    fn thought_parts_are_skipped() {
        let body = json!({
            "candidates": [{ "content": { "parts": [
                { "text": "thinking...", "thought": true },
                { "text": "Name: Toast\n" },
                { "text": "Quality: Good" }
            ]}}]
        });
        assert_eq!(
            completion_from_body(&body),
            Completion::Text("Name: Toast\nQuality: Good".into())
        );
    }

    #[test]
    fn prompt_block_is_reported() {
        let body = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert_eq!(
            completion_from_body(&body),
            Completion::Blocked { reason: "SAFETY".into() }
        );
    }

    #[test]
    fn empty_candidate_uses_finish_reason() {
        let body = json!({ "candidates": [{ "finishReason": "RECITATION", "content": { "parts": [] } }] });
        assert_eq!(
            completion_from_body(&body),
            Completion::Blocked { reason: "RECITATION".into() }
        );
    }

    #[tokio::test]
    async fn complete_posts_to_generate_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-test:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"Name: Toast"}]}}]}"#)
            .create_async()
            .await;

        let client = GeminiClient::new(settings(server.url())).unwrap();
        let completion = client.complete("toast some bread").await.unwrap();

        assert_eq!(completion, Completion::Text("Name: Toast".into()));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-test:generateContent")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let client = GeminiClient::new(settings(server.url())).unwrap();
        let err = client.complete("anything").await.unwrap_err();

        assert!(matches!(err, GenerationError::Status { status: 503, .. }), "{err}");
    }
}
