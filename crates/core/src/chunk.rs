//! Context chunk and fitted context value objects.
//!
//! A [`ContextChunk`] is what the retrieval collaborator (or a conversation
//! memory caller) hands to the fitter. A [`FittedContext`] is what comes
//! back: one string that fits the caller's token budget.

use serde::{Deserialize, Serialize};

/// A unit of text considered for inclusion in the prompt context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextChunk {
    /// The chunk text.
    pub text: String,

    /// Token estimate for `text`, computed by the caller's estimator.
    pub estimated_token_count: usize,

    /// Relevance score from the retriever, if it reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_relevance_score: Option<f32>,

    /// Human-readable source label (filename, URL, "history", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ContextChunk {
    /// Create a chunk with a precomputed token estimate.
    pub fn new(text: impl Into<String>, estimated_token_count: usize) -> Self {
        Self {
            text: text.into(),
            estimated_token_count,
            source_relevance_score: None,
            source: None,
        }
    }

    /// Attach a retrieval relevance score.
    pub fn with_score(mut self, score: f32) -> Self {
        self.source_relevance_score = Some(score);
        self
    }

    /// Attach a source label.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// The bounded context produced by a single fit call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FittedContext {
    /// The combined context text.
    pub text: String,
    /// Estimated tokens occupied by `text`. Never exceeds the budget.
    pub used_token_count: usize,
    /// Whether text was cut at the budget boundary.
    pub truncated: bool,
    /// Whether the summarization path ran.
    pub summarized: bool,
}

impl FittedContext {
    /// The empty context: valid output for an empty chunk set.
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            used_token_count: 0,
            truncated: false,
            summarized: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
