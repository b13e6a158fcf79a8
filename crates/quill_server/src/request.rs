//! Generation request and sampler parameters.

use quill_core::Settings;
use serde::{Deserialize, Serialize};

/// One call to the generation backend.
///
/// `max_length` and `stop_sequence` fall back to the client's sampler
/// settings when unset. An explicit stop list replaces the configured one
/// rather than extending it.
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(default, setter(into))]
pub struct GenerationRequest {
    /// Fully assembled prompt
    prompt: String,
    /// Maximum tokens to generate
    #[builder(setter(into, strip_option))]
    max_length: Option<u32>,
    /// Stop sequences overriding the configured defaults
    #[builder(setter(into, strip_option))]
    stop_sequence: Option<Vec<String>>,
}

impl GenerationRequest {
    /// Request for `prompt` with every other parameter defaulted.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Set the token budget.
    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Override the configured stop sequences, or keep them with `None`.
    pub fn with_stop_sequence(mut self, stop_sequence: Option<Vec<String>>) -> Self {
        self.stop_sequence = stop_sequence;
        self
    }

    /// Stop sequences to send: the explicit list if given, else `fallback`.
    pub fn stop_sequence_or<'a>(&'a self, fallback: &'a [String]) -> &'a [String] {
        self.stop_sequence.as_deref().unwrap_or(fallback)
    }
}

/// Sampling parameters shared by every request a client sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct SamplerSettings {
    temperature: f64,
    min_p: f64,
    top_p: f64,
    /// `0` disables top-k sampling
    top_k: u32,
    rep_pen: f64,
    stop_sequences: Vec<String>,
}

impl SamplerSettings {
    /// `top_k` as sent on the wire; zero is omitted.
    pub fn top_k_param(&self) -> Option<u32> {
        (self.top_k > 0).then_some(self.top_k)
    }
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for SamplerSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            temperature: settings.temperature,
            min_p: settings.min_p,
            top_p: settings.top_p,
            top_k: settings.top_k,
            rep_pen: settings.rep_pen,
            stop_sequences: settings.stop_sequences.clone(),
        }
    }
}
