//! Summarizer trait — the text-shortening capability the fitter falls back on.
//!
//! Implementations are usually backed by a language model call. Length
//! compliance is best effort: the fitter re-estimates whatever comes back.

use async_trait::async_trait;
use crate::error::SummarizerError;

/// Shortens `text` toward `target_tokens`, keeping what matters for `query`.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        query: &str,
        text: &str,
        target_tokens: usize,
    ) -> std::result::Result<String, SummarizerError>;
}

/// Adapts a synchronous closure into a [`Summarizer`].
///
/// Handy for extractive summarizers and for tests.
pub struct FnSummarizer<F>(pub F);

impl<F> FnSummarizer<F>
where
    F: Fn(&str, &str, usize) -> std::result::Result<String, SummarizerError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> Summarizer for FnSummarizer<F>
where
    F: Fn(&str, &str, usize) -> std::result::Result<String, SummarizerError> + Send + Sync,
{
    async fn summarize(
        &self,
        query: &str,
        text: &str,
        target_tokens: usize,
    ) -> std::result::Result<String, SummarizerError> {
        (self.0)(query, text, target_tokens)
    }
}
