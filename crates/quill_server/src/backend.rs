//! The generation backend seam.

use crate::{GenerationRequest, KoboldClient, OpenAiCompatibleClient};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use quill_core::{ClientType, Settings};
use quill_error::ServerError;
use std::pin::Pin;

/// Stream of generated tokens in arrival order.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, ServerError>> + Send>>;

/// A server that turns prompts into streamed text.
///
/// Implementations hold their own sampler settings; a [`GenerationRequest`]
/// only carries what changes per call.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Start generating and return the token stream.
    ///
    /// Errors before the first token (connection refused, non-success status)
    /// are returned here; errors mid-stream arrive as stream items.
    async fn generate_stream(&self, request: &GenerationRequest)
    -> Result<TokenStream, ServerError>;

    /// Generate and collect the whole response.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ServerError> {
        let mut stream = self.generate_stream(request).await?;
        let mut text = String::new();
        while let Some(token) = stream.next().await {
            text.push_str(&token?);
        }
        Ok(text)
    }

    /// Check that the server is reachable.
    async fn health_check(&self) -> Result<(), ServerError>;

    /// Short provider name for logs.
    fn provider_name(&self) -> &'static str;
}

#[async_trait]
impl<T: GenerationBackend + ?Sized> GenerationBackend for Box<T> {
    async fn generate_stream(
        &self,
        request: &GenerationRequest,
    ) -> Result<TokenStream, ServerError> {
        (**self).generate_stream(request).await
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ServerError> {
        (**self).generate(request).await
    }

    async fn health_check(&self) -> Result<(), ServerError> {
        (**self).health_check().await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }
}

/// Build the backend selected by `settings.client_type`.
#[tracing::instrument(skip(settings), fields(client_type = %settings.client_type))]
pub fn backend_from_settings(settings: &Settings) -> Box<dyn GenerationBackend> {
    match settings.client_type {
        ClientType::Kobold => Box::new(KoboldClient::from_settings(settings)),
        ClientType::OpenaiCompatible => Box::new(OpenAiCompatibleClient::from_settings(settings)),
    }
}
