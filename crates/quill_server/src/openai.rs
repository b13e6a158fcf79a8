//! OpenAI-compatible completions client (LM Studio, llama.cpp server, vLLM).

use crate::http;
use crate::sse::{DONE, SseEvent, token_stream};
use crate::{GenerationBackend, GenerationRequest, SamplerSettings, TokenStream};
use async_trait::async_trait;
use quill_core::Settings;
use quill_error::ServerError;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Completions endpoint path, relative to the base URL.
pub const COMPLETIONS_PATH: &str = "/v1/completions";

/// Request body for `/v1/completions` with streaming enabled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionPayload<'a> {
    /// Prompt text
    pub prompt: &'a str,
    /// Always `true`
    pub stream: bool,
    /// Token budget
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    pub temperature: f64,
    /// Min-p cutoff
    pub min_p: f64,
    /// Nucleus cutoff
    pub top_p: f64,
    /// Top-k cutoff, omitted when disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Repetition penalty
    pub repeat_penalty: f64,
    /// Stop sequences
    pub stop: &'a [String],
}

impl<'a> CompletionPayload<'a> {
    /// Combine a request with the client's sampler settings.
    pub fn new(request: &'a GenerationRequest, sampler: &'a SamplerSettings) -> Self {
        Self {
            prompt: request.prompt(),
            stream: true,
            max_tokens: *request.max_length(),
            temperature: *sampler.temperature(),
            min_p: *sampler.min_p(),
            top_p: *sampler.top_p(),
            top_k: sampler.top_k_param(),
            repeat_penalty: *sampler.rep_pen(),
            stop: request.stop_sequence_or(sampler.stop_sequences()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
}

/// Interpret one completions SSE payload.
pub fn parse_completion_event(data: &str) -> SseEvent {
    if data == DONE {
        return SseEvent::Done;
    }
    match serde_json::from_str::<CompletionChunk>(data) {
        Ok(chunk) => match chunk.choices.into_iter().next() {
            Some(choice) if !choice.text.is_empty() => SseEvent::Token(choice.text),
            _ => SseEvent::Skip,
        },
        Err(e) => {
            tracing::warn!(payload = %data, "Could not decode stream payload: {}", e);
            SseEvent::Skip
        }
    }
}

/// Client for any server exposing the OpenAI completions API.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    base_url: String,
    sampler: SamplerSettings,
    client: reqwest::Client,
}

impl OpenAiCompatibleClient {
    /// Create a client for `base_url` (scheme included).
    pub fn new(base_url: impl Into<String>, sampler: SamplerSettings) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::debug!(base_url = %base_url, "Creating OpenAI-compatible client");
        Self {
            base_url,
            sampler,
            client: reqwest::Client::new(),
        }
    }

    /// Create a client from the settings store.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.base_url_with_scheme(), SamplerSettings::from(settings))
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl GenerationBackend for OpenAiCompatibleClient {
    #[instrument(
        skip(self, request),
        fields(prompt_len = request.prompt().len(), max_tokens = ?request.max_length())
    )]
    async fn generate_stream(
        &self,
        request: &GenerationRequest,
    ) -> Result<TokenStream, ServerError> {
        let url = format!("{}{}", self.base_url, COMPLETIONS_PATH);
        let payload = CompletionPayload::new(request, &self.sampler);
        tracing::debug!(stop = ?payload.stop, "Sending streaming request to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| http::request_error(&url, e))?;

        let response = http::check_status(response).await?;
        tracing::debug!("Streaming request accepted, decoding SSE stream");
        Ok(token_stream(response.bytes_stream(), parse_completion_event))
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), ServerError> {
        http::health_check(&self.client, &self.base_url).await
    }

    fn provider_name(&self) -> &'static str {
        "openai_compatible"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_renames_openai_fields() {
        let mut settings = Settings::default();
        settings.top_k = 40;
        let sampler = SamplerSettings::from(&settings);
        let request = GenerationRequest::new("p");
        let value = serde_json::to_value(CompletionPayload::new(&request, &sampler)).unwrap();
        assert_eq!(value["stream"], json!(true));
        assert_eq!(value["top_k"], json!(40));
        assert_eq!(value["repeat_penalty"], json!(1.0));
        assert_eq!(value["stop"], json!(["[INST]", "[/INST]"]));
        assert!(value.get("max_tokens").is_none());
        assert!(value.get("rep_pen").is_none());
    }

    #[test]
    fn event_parsing() {
        assert_eq!(
            parse_completion_event(r#"{"choices":[{"text":"夜"}]}"#),
            SseEvent::Token("夜".into())
        );
        assert_eq!(parse_completion_event(r#"{"choices":[]}"#), SseEvent::Skip);
        assert_eq!(parse_completion_event("{"), SseEvent::Skip);
        assert_eq!(parse_completion_event(DONE), SseEvent::Done);
    }
}
