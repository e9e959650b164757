//! Token estimation utilities.
//!
//! The default estimator is a character heuristic: ~4 characters per token,
//! accurate within ~10% for BPE tokenizers on English text. Any pure
//! `Fn(&str) -> usize` can stand in for it, so callers with a real
//! tokenizer plug it in without touching the fitter.

use ragskills_core::chunk::ContextChunk;
use ragskills_core::message::Message;

/// Per-message overhead for role names and delimiters in chat wire formats.
pub const MESSAGE_OVERHEAD_TOKENS: usize = 4;

/// Estimates how many tokens a piece of text occupies.
///
/// The same estimator must be used for chunk sizing, the budget comparison,
/// and the post-summarization re-check. Truncation assumes the estimate of
/// a prefix never exceeds the estimate of the whole.
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> usize;
}

impl<F> TokenEstimator for F
where
    F: Fn(&str) -> usize + Send + Sync,
{
    fn estimate(&self, text: &str) -> usize {
        self(text)
    }
}

/// Character-count heuristic. Rounds up; empty text is zero tokens.
#[derive(Debug, Clone, Copy)]
pub struct CharEstimator {
    chars_per_token: f64,
}

impl CharEstimator {
    pub const DEFAULT_CHARS_PER_TOKEN: f64 = 4.0;

    /// Non-positive or non-finite ratios fall back to the default.
    pub fn new(chars_per_token: f64) -> Self {
        let chars_per_token = if chars_per_token.is_finite() && chars_per_token > 0.0 {
            chars_per_token
        } else {
            Self::DEFAULT_CHARS_PER_TOKEN
        };
        Self { chars_per_token }
    }

    pub fn chars_per_token(&self) -> f64 {
        self.chars_per_token
    }
}

impl Default for CharEstimator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CHARS_PER_TOKEN)
    }
}

impl TokenEstimator for CharEstimator {
    fn estimate(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        let chars = text.chars().count() as f64;
        (chars / self.chars_per_token).ceil() as usize
    }
}

/// Estimate the token count for a string with the default heuristic.
pub fn estimate_tokens(text: &str) -> usize {
    CharEstimator::default().estimate(text)
}

/// Build a chunk whose token count comes from `estimator`.
pub fn chunk_from_text(text: impl Into<String>, estimator: &dyn TokenEstimator) -> ContextChunk {
    let text = text.into();
    let tokens = estimator.estimate(&text);
    ContextChunk::new(text, tokens)
}

/// Estimate tokens for a slice of messages including per-message overhead.
pub fn estimate_messages(messages: &[Message], estimator: &dyn TokenEstimator) -> usize {
    messages
        .iter()
        .map(|m| MESSAGE_OVERHEAD_TOKENS + estimator.estimate(&m.content))
        .sum()
}
