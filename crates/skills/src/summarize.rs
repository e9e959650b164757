//! Query-focused summarization backed by a language model provider.
//!
//! One provider call per summarization. The model is told the token target
//! and the response is capped at it, but compliance stays best effort: the
//! fitter re-estimates whatever comes back.

use std::sync::Arc;

use async_trait::async_trait;
use ragskills_core::error::SummarizerError;
use ragskills_core::message::Message;
use ragskills_core::provider::{Provider, ProviderRequest};
use ragskills_core::summarizer::Summarizer;
use tracing::{debug, info};

const SUMMARIZATION_PROMPT: &str = "\
You condense retrieved passages so they fit in a limited context window.
Write a summary of the passages that keeps every fact needed to answer the \
user's question.

Rules:
- Only include facts explicitly stated in the passages. Do not infer or extrapolate.
- Preserve names, numbers, dates, and quoted terms verbatim.
- Drop material unrelated to the question.
- Stay under the token limit; every token must earn its place.";

/// A [`Summarizer`] that asks an LLM provider for a query-focused summary.
pub struct ProviderSummarizer {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
}

impl ProviderSummarizer {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
        }
    }

    /// Build from the `[summarizer]` section; `main_model` is used when no
    /// summarization model is configured.
    pub fn from_config(
        provider: Arc<dyn Provider>,
        config: &ragskills_config::SummarizerConfig,
        main_model: &str,
    ) -> Self {
        Self::new(provider, config.model_or(main_model)).with_temperature(config.temperature)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the (system, user) message pair for one summarization call.
    pub fn build_request(&self, query: &str, text: &str, target_tokens: usize) -> ProviderRequest {
        let system = format!("{SUMMARIZATION_PROMPT}\n\nToken limit: {target_tokens}");
        let user = format!("Question: {query}\n\nPassages:\n{text}");

        ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::system(system), Message::user(user)],
            temperature: self.temperature,
            max_tokens: Some(u32::try_from(target_tokens).unwrap_or(u32::MAX)),
            stop: vec![],
        }
    }
}

#[async_trait]
impl Summarizer for ProviderSummarizer {
    async fn summarize(
        &self,
        query: &str,
        text: &str,
        target_tokens: usize,
    ) -> Result<String, SummarizerError> {
        info!(
            provider = self.provider.name(),
            model = %self.model,
            target_tokens,
            input_len = text.len(),
            "Summarizing context"
        );

        let request = self.build_request(query, text, target_tokens);
        let response = self.provider.complete(request).await?;
        let summary = response.message.content.trim().to_string();

        debug!(summary_len = summary.len(), "Summary received");
        Ok(summary)
    }
}
