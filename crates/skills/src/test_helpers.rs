//! Shared test helpers: scripted collaborators.

use async_trait::async_trait;
use ragskills_core::chunk::ContextChunk;
use ragskills_core::error::{ProviderError, RetrievalError, SummarizerError};
use ragskills_core::message::Message;
use ragskills_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use ragskills_core::retriever::Retriever;
use ragskills_core::summarizer::Summarizer;
use std::sync::Mutex;

/// One recorded summarizer invocation.
#[derive(Debug, Clone)]
pub struct SummarizeCall {
    pub query: String,
    pub text: String,
    pub target_tokens: usize,
}

/// A summarizer that always returns the same result and records its calls.
pub struct ScriptedSummarizer {
    result: Result<String, SummarizerError>,
    calls: Mutex<Vec<SummarizeCall>>,
}

impl ScriptedSummarizer {
    pub fn text(text: &str) -> Self {
        Self {
            result: Ok(text.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: SummarizerError) -> Self {
        Self {
            result: Err(err),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<SummarizeCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for ScriptedSummarizer {
    async fn summarize(
        &self,
        query: &str,
        text: &str,
        target_tokens: usize,
    ) -> Result<String, SummarizerError> {
        self.calls.lock().unwrap().push(SummarizeCall {
            query: query.to_string(),
            text: text.to_string(),
            target_tokens,
        });
        self.result.clone()
    }
}

/// A mock provider that returns a sequence of scripted responses and keeps
/// every request it saw.
///
/// Panics if more calls are made than responses provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that returns a single text response.
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![Ok(make_text_response(text))])
    }

    pub fn single_error(err: ProviderError) -> Self {
        Self::new(vec![Err(err)])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let index = requests.len();

        if index >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                index,
                responses.len()
            );
        }

        requests.push(request);
        responses[index].clone()
    }
}

/// A retriever that returns a fixed chunk list, capped at `top_k`.
pub struct StaticRetriever {
    chunks: Vec<ContextChunk>,
}

impl StaticRetriever {
    pub fn new(chunks: Vec<ContextChunk>) -> Self {
        Self { chunks }
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    fn name(&self) -> &str {
        "static"
    }

    async fn retrieve(&self, _query: &str, top_k: usize) -> Result<Vec<ContextChunk>, RetrievalError> {
        Ok(self.chunks.iter().take(top_k).cloned().collect())
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// `n` space-separated words.
pub fn words_text(n: usize) -> String {
    (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
}
