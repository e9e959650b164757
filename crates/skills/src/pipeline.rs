//! Retrieve → fit → answer, wired from the skills in this crate.
//!
//! # Flow
//!
//! 1. Retrieve the top-k chunks for the question
//! 2. Append the conversation history chunk, if any
//! 3. Derive the context budget from the window and the QA template, less
//!    the separators the fitter will insert
//! 4. Fit the chunks (summarizing or truncating on overflow)
//! 5. Render the QA prompt and make one completion call
//! 6. Return the answer with the fitted context and its sources

use std::collections::HashMap;
use std::sync::Arc;

use ragskills_core::chunk::{ContextChunk, FittedContext};
use ragskills_core::message::Message;
use ragskills_core::provider::{Provider, ProviderRequest};
use ragskills_core::retriever::Retriever;
use ragskills_core::summarizer::Summarizer;
use tracing::{debug, info};

use crate::context::fitter::{ContextFitter, FallbackPolicy};
use crate::memory::HISTORY_SOURCE;
use crate::prompt::{
    qa_template, ContextWindow, PromptTemplate, CONTEXT_VAR, QUESTION_VAR,
};
use crate::summarize::ProviderSummarizer;

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct RagAnswer {
    /// The generated answer.
    pub answer: String,
    /// The context the answer was grounded in.
    pub context: FittedContext,
    /// Source labels of the retrieved chunks, in retrieval order.
    pub sources: Vec<String>,
    /// Token budget the context was fitted to: the template's `{context}`
    /// slot less the separators between the fitted chunks.
    pub budget: usize,
}

/// A RAG question-answering pipeline.
pub struct RagPipeline {
    retriever: Arc<dyn Retriever>,
    provider: Arc<dyn Provider>,
    summarizer: Option<Arc<dyn Summarizer>>,
    fitter: ContextFitter,
    template: PromptTemplate,
    window: ContextWindow,
    model: String,
    temperature: f32,
    top_k: usize,
    fallback: FallbackPolicy,
}

impl RagPipeline {
    /// Create a pipeline with default fitting, template, and window.
    pub fn new(
        retriever: Arc<dyn Retriever>,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            retriever,
            provider,
            summarizer: None,
            fitter: ContextFitter::default(),
            template: qa_template(),
            window: ContextWindow::default(),
            model: model.into(),
            temperature: 0.0,
            top_k: 4,
            fallback: FallbackPolicy::default(),
        }
    }

    /// Build a pipeline from configuration. When summarization is enabled
    /// the answering provider doubles as the summarization backend.
    pub fn from_config(
        retriever: Arc<dyn Retriever>,
        provider: Arc<dyn Provider>,
        config: &ragskills_config::SkillsConfig,
    ) -> Self {
        let summarizer: Option<Arc<dyn Summarizer>> = if config.summarizer.enabled {
            Some(Arc::new(ProviderSummarizer::from_config(
                provider.clone(),
                &config.summarizer,
                &config.default_model,
            )))
        } else {
            None
        };

        Self {
            retriever,
            provider,
            summarizer,
            fitter: ContextFitter::from_config(&config.context),
            template: qa_template(),
            window: ContextWindow::from_config(&config.context),
            model: config.default_model.clone(),
            temperature: config.default_temperature,
            top_k: config.retrieval.top_k,
            fallback: config.context.fallback.into(),
        }
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_fitter(mut self, fitter: ContextFitter) -> Self {
        self.fitter = fitter;
        self
    }

    /// Use a custom answer template. It may only use `{context}` and
    /// `{question}`; history arrives inside `{context}`.
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_window(mut self, window: ContextWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Answer `question`, optionally with a conversation history chunk from
    /// either memory discipline.
    pub async fn answer(
        &self,
        question: &str,
        history: Option<ContextChunk>,
    ) -> Result<RagAnswer, ragskills_core::Error> {
        info!(model = %self.model, top_k = self.top_k, "RAG: starting retrieval");

        let mut chunks = self.retriever.retrieve(question, self.top_k).await?;
        let sources: Vec<String> = chunks
            .iter()
            .map(|c| c.source.clone().unwrap_or_else(|| "unknown".to_string()))
            .collect();
        debug!(chunks = chunks.len(), retriever = self.retriever.name(), "RAG: chunks retrieved");

        if let Some(history) = history {
            chunks.push(history);
        }

        let vars = HashMap::from([(QUESTION_VAR, question)]);
        let slot = self
            .window
            .context_budget(self.fitter.estimator(), &self.template, &vars)?;
        let budget = slot.saturating_sub(self.fitter.separator_overhead(chunks.len()));
        debug!(slot, budget, "RAG: context budget derived");

        let context = self
            .fitter
            .fit_with_fallback(
                question,
                &chunks,
                budget,
                self.summarizer.as_deref(),
                self.fallback,
            )
            .await?;

        let prompt = self.render_prompt(question, &context)?;

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            temperature: self.temperature,
            max_tokens: Some(u32::try_from(self.window.answer_reserve).unwrap_or(u32::MAX)),
            stop: vec![],
        };

        let response = self.provider.complete(request).await?;
        let answer = response.message.content;

        info!(
            budget,
            used = context.used_token_count,
            summarized = context.summarized,
            truncated = context.truncated,
            answer_len = answer.len(),
            "RAG: response generated"
        );

        Ok(RagAnswer {
            answer,
            context,
            sources,
            budget,
        })
    }

    fn render_prompt(
        &self,
        question: &str,
        context: &FittedContext,
    ) -> Result<String, ragskills_core::Error> {
        let vars = HashMap::from([(CONTEXT_VAR, context.text.as_str()), (QUESTION_VAR, question)]);
        Ok(self.template.render(&vars)?)
    }
}

/// Whether a chunk came from conversation memory rather than retrieval.
pub fn is_history_chunk(chunk: &ContextChunk) -> bool {
    chunk.source.as_deref() == Some(HISTORY_SOURCE)
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::token::{CharEstimator, TokenEstimator};
    use crate::memory::FullHistory;
    use crate::prompt::PromptError;
    use crate::test_helpers::*;
    use ragskills_core::error::{FitError, ProviderError};

    fn words(text: &str) -> usize {
        text.split_whitespace().count()
    }

    fn retriever() -> Arc<StaticRetriever> {
        Arc::new(StaticRetriever::new(vec![
            ContextChunk::new("Explorer 1 launched 1958", 4).with_source("nasa.txt"),
            ContextChunk::new("Earth from orbit looks blue", 5).with_source("orbit.txt"),
            ContextChunk::new("Unrelated trivia", 2),
        ]))
    }

    #[tokio::test]
    async fn answers_from_fitted_context() {
        let provider = Arc::new(SequentialMockProvider::single_text("It launched in 1958."));
        let pipeline = RagPipeline::new(retriever(), provider.clone(), "mock-model")
            .with_fitter(ContextFitter::new(words))
            .with_top_k(2);

        let result = pipeline
            .answer("When did Explorer 1 launch?", None)
            .await
            .unwrap();

        assert_eq!(result.answer, "It launched in 1958.");
        assert_eq!(result.sources, vec!["nasa.txt", "orbit.txt"]);
        assert_eq!(result.context.used_token_count, 9);
        assert!(!result.context.summarized);

        let prompt = &provider.requests()[0].messages[0].content;
        assert!(prompt.contains("Explorer 1 launched 1958\n\nEarth from orbit looks blue"));
        assert!(prompt.contains("Question: When did Explorer 1 launch?"));
    }

    #[tokio::test]
    async fn unlabelled_sources_are_reported_as_unknown() {
        let provider = Arc::new(SequentialMockProvider::single_text("ok"));
        let pipeline = RagPipeline::new(retriever(), provider, "mock-model").with_top_k(3);
        let result = pipeline.answer("q", None).await.unwrap();
        assert_eq!(result.sources[2], "unknown");
    }

    #[tokio::test]
    async fn history_chunk_is_fitted_after_retrieved_chunks() {
        let provider = Arc::new(SequentialMockProvider::single_text("ok"));
        let pipeline = RagPipeline::new(retriever(), provider.clone(), "mock-model")
            .with_fitter(ContextFitter::new(words))
            .with_top_k(1);

        let mut history = FullHistory::new();
        history.push_exchange("Tell me about rockets", "Sure.");
        let result = pipeline
            .answer("When?", history.to_chunk(&words))
            .await
            .unwrap();

        assert!(result.context.text.starts_with("Explorer 1 launched 1958\n\nUser:"));
        assert_eq!(result.sources.len(), 1);
    }

    #[tokio::test]
    async fn overflow_uses_summarizer() {
        let provider = Arc::new(SequentialMockProvider::single_text("ok"));
        let summarizer = Arc::new(ScriptedSummarizer::text("1958."));
        let window = ContextWindow {
            total: 120,
            answer_reserve: 10,
        };
        let pipeline = RagPipeline::new(retriever(), provider, "mock-model")
            .with_fitter(ContextFitter::new(words))
            .with_template(PromptTemplate::new("{question}\n{context}"))
            .with_window(window)
            .with_summarizer(summarizer.clone())
            .with_top_k(3);

        // Budget is 110 - 1 = 109 words; inflate the chunks past it.
        let big = Arc::new(StaticRetriever::new(vec![ContextChunk::new(
            words_text(200),
            200,
        )]));
        let pipeline = RagPipeline { retriever: big, ..pipeline };

        let result = pipeline.answer("When?", None).await.unwrap();
        assert_eq!(result.budget, 109);
        assert!(result.context.summarized);
        assert_eq!(result.context.text, "1958.");
        assert_eq!(summarizer.call_count(), 1);
    }

    #[tokio::test]
    async fn overflow_without_summarizer_truncates_under_truncate_policy() {
        let provider = Arc::new(SequentialMockProvider::single_text("ok"));
        let big = Arc::new(StaticRetriever::new(vec![ContextChunk::new(
            words_text(200),
            200,
        )]));
        let pipeline = RagPipeline::new(big, provider, "mock-model")
            .with_fitter(ContextFitter::new(words))
            .with_template(PromptTemplate::new("{context}"))
            .with_window(ContextWindow {
                total: 60,
                answer_reserve: 10,
            })
            .with_fallback(FallbackPolicy::Truncate);

        let result = pipeline.answer("q", None).await.unwrap();
        assert!(result.context.truncated);
        assert!(!result.context.summarized);
        assert_eq!(result.context.used_token_count, 50);
    }

    #[tokio::test]
    async fn overflow_without_summarizer_propagates_by_default() {
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let big = Arc::new(StaticRetriever::new(vec![ContextChunk::new(
            words_text(200),
            200,
        )]));
        let pipeline = RagPipeline::new(big, provider.clone(), "mock-model")
            .with_fitter(ContextFitter::new(words))
            .with_template(PromptTemplate::new("{context}"))
            .with_window(ContextWindow {
                total: 100,
                answer_reserve: 10,
            });

        let err = pipeline.answer("q", None).await.unwrap_err();
        assert!(matches!(
            err,
            ragskills_core::Error::Fit(FitError::SummarizationUnavailable { .. })
        ));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn exhausted_window_is_invalid_budget() {
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let pipeline = RagPipeline::new(retriever(), provider, "mock-model")
            .with_fitter(ContextFitter::new(words))
            .with_template(PromptTemplate::new("{question} {context}"))
            .with_window(ContextWindow {
                total: 3,
                answer_reserve: 2,
            });

        let err = pipeline
            .answer("a very long question indeed", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ragskills_core::Error::Fit(FitError::InvalidBudget { .. })
        ));
    }

    #[tokio::test]
    async fn many_small_chunks_keep_prompt_inside_window() {
        let provider = Arc::new(SequentialMockProvider::single_text("ok"));
        let tiny = Arc::new(StaticRetriever::new(
            (0..40).map(|_| ContextChunk::new("abcd", 1)).collect(),
        ));
        let window = ContextWindow {
            total: 60,
            answer_reserve: 10,
        };
        let pipeline = RagPipeline::new(tiny, provider.clone(), "mock-model")
            .with_template(PromptTemplate::new("{context}"))
            .with_window(window)
            .with_top_k(40)
            .with_fallback(FallbackPolicy::Truncate);

        let result = pipeline.answer("q", None).await.unwrap();
        // 50 slot tokens less 39 one-token separators.
        assert_eq!(result.budget, 11);
        assert!(result.context.truncated);

        let estimator = CharEstimator::default();
        let prompt = &provider.requests()[0].messages[0].content;
        assert!(estimator.estimate(prompt) <= window.prompt_tokens());
    }

    #[tokio::test]
    async fn broken_template_is_a_prompt_error() {
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let pipeline = RagPipeline::new(retriever(), provider, "mock-model")
            .with_template(PromptTemplate::new("{context} {history}"));
        let err = pipeline.answer("q", None).await.unwrap_err();
        assert!(matches!(
            err,
            ragskills_core::Error::Prompt(PromptError::MissingVariable(_))
        ));
    }

    #[tokio::test]
    async fn history_has_no_separate_prompt_section() {
        let provider = Arc::new(SequentialMockProvider::single_text("ok"));
        let pipeline = RagPipeline::new(retriever(), provider.clone(), "mock-model")
            .with_fitter(ContextFitter::new(words))
            .with_top_k(1);

        let mut history = FullHistory::new();
        history.push_exchange("Tell me about rockets", "Sure.");
        pipeline
            .answer("When?", history.to_chunk(&words))
            .await
            .unwrap();

        let prompt = &provider.requests()[0].messages[0].content;
        assert!(!prompt.contains("Conversation so far"));
        assert!(prompt.contains("User: Tell me about rockets"));
    }

    #[tokio::test]
    async fn provider_errors_surface() {
        let provider = Arc::new(SequentialMockProvider::single_error(ProviderError::Timeout(
            "60s".into(),
        )));
        let pipeline = RagPipeline::new(retriever(), provider, "mock-model");
        let err = pipeline.answer("q", None).await.unwrap_err();
        assert!(matches!(err, ragskills_core::Error::Provider(_)));
    }

    #[test]
    fn from_config_wires_summarizer_when_enabled() {
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let config = ragskills_config::SkillsConfig::default();
        let pipeline = RagPipeline::from_config(retriever(), provider.clone(), &config);
        assert!(pipeline.summarizer.is_some());
        assert_eq!(pipeline.top_k, config.retrieval.top_k);
        assert_eq!(pipeline.fallback, FallbackPolicy::Truncate);

        let mut disabled = ragskills_config::SkillsConfig::default();
        disabled.summarizer.enabled = false;
        let pipeline = RagPipeline::from_config(retriever(), provider, &disabled);
        assert!(pipeline.summarizer.is_none());
    }

    #[test]
    fn history_chunks_are_recognised() {
        let mut history = FullHistory::new();
        history.push_exchange("a", "b");
        assert!(is_history_chunk(&history.to_chunk(&words).unwrap()));
        assert!(!is_history_chunk(&ContextChunk::new("x", 1)));
    }
}
