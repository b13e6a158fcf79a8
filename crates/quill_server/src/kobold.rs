//! KoboldCpp streaming client.

use crate::http;
use crate::sse::{DONE, SseEvent, token_stream};
use crate::{GenerationBackend, GenerationRequest, SamplerSettings, TokenStream};
use async_trait::async_trait;
use quill_core::Settings;
use quill_error::ServerError;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Streaming endpoint path, relative to the base URL.
pub const KOBOLD_STREAM_PATH: &str = "/api/extra/generate/stream";

/// Request body for the KoboldCpp streaming endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KoboldPayload<'a> {
    /// Prompt text
    pub prompt: &'a str,
    /// Token budget
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
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
    pub rep_pen: f64,
    /// Stop sequences
    pub stop_sequence: &'a [String],
}

impl<'a> KoboldPayload<'a> {
    /// Combine a request with the client's sampler settings.
    pub fn new(request: &'a GenerationRequest, sampler: &'a SamplerSettings) -> Self {
        Self {
            prompt: request.prompt(),
            max_length: *request.max_length(),
            temperature: *sampler.temperature(),
            min_p: *sampler.min_p(),
            top_p: *sampler.top_p(),
            top_k: sampler.top_k_param(),
            rep_pen: *sampler.rep_pen(),
            stop_sequence: request.stop_sequence_or(sampler.stop_sequences()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct KoboldChunk {
    #[serde(default)]
    token: String,
}

/// Interpret one KoboldCpp SSE payload.
pub fn parse_kobold_event(data: &str) -> SseEvent {
    if data == DONE {
        return SseEvent::Done;
    }
    match serde_json::from_str::<KoboldChunk>(data) {
        Ok(chunk) if !chunk.token.is_empty() => SseEvent::Token(chunk.token),
        Ok(_) => SseEvent::Skip,
        Err(e) => {
            tracing::warn!(payload = %data, "Could not decode stream payload: {}", e);
            SseEvent::Skip
        }
    }
}

/// Client for a KoboldCpp server.
#[derive(Debug, Clone)]
pub struct KoboldClient {
    base_url: String,
    sampler: SamplerSettings,
    client: reqwest::Client,
}

impl KoboldClient {
    /// Create a client for `base_url` (scheme included).
    pub fn new(base_url: impl Into<String>, sampler: SamplerSettings) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::debug!(base_url = %base_url, "Creating KoboldCpp client");
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

    /// Sampler settings sent with every request.
    pub fn sampler(&self) -> &SamplerSettings {
        &self.sampler
    }
}

#[async_trait]
impl GenerationBackend for KoboldClient {
    #[instrument(
        skip(self, request),
        fields(prompt_len = request.prompt().len(), max_length = ?request.max_length())
    )]
    async fn generate_stream(
        &self,
        request: &GenerationRequest,
    ) -> Result<TokenStream, ServerError> {
        let url = format!("{}{}", self.base_url, KOBOLD_STREAM_PATH);
        let payload = KoboldPayload::new(request, &self.sampler);
        tracing::debug!(stop = ?payload.stop_sequence, "Sending streaming request to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| http::request_error(&url, e))?;

        let response = http::check_status(response).await?;
        tracing::debug!("Streaming request accepted, decoding SSE stream");
        Ok(token_stream(response.bytes_stream(), parse_kobold_event))
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), ServerError> {
        http::health_check(&self.client, &self.base_url).await
    }

    fn provider_name(&self) -> &'static str {
        "kobold"
    }
}
