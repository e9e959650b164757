//! Context fitting — merge retrieved chunks into one budget-bounded string.
//!
//! The fitter is the only component that makes budgeting decisions:
//!
//! 1. **Fits as-is** — chunk texts are joined in caller order.
//! 2. **Overflows** — the joined text goes through one summarizer call,
//!    focused on the user's query, targeting the budget.
//! 3. **Summary still too long** — the summary is cut at the last word
//!    boundary whose estimate fits.
//!
//! Conversation history, whether verbatim or pre-summarized, arrives as
//! ordinary chunks; there is no separate code path for it.
//!
//! # Determinism
//!
//! Given the same inputs and a deterministic summarizer, `fit` returns the
//! same output. The fitter keeps no state between calls.

use ragskills_core::chunk::{ContextChunk, FittedContext};
use ragskills_core::error::FitError;
use ragskills_core::summarizer::Summarizer;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::context::token::{CharEstimator, TokenEstimator};

/// Separator placed between chunk texts.
pub const DEFAULT_SEPARATOR: &str = "\n\n";

/// Summary estimates above `budget * DEFAULT_MISMATCH_FACTOR` are logged
/// as an estimator/summarizer disagreement.
pub const DEFAULT_MISMATCH_FACTOR: f64 = 2.0;

/// How [`ContextFitter::fit_with_fallback`] handles a failed or missing
/// summarization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Return the error unchanged.
    #[default]
    Propagate,
    /// Hard-truncate the raw concatenation at the budget.
    Truncate,
}

impl From<ragskills_config::FallbackMode> for FallbackPolicy {
    fn from(mode: ragskills_config::FallbackMode) -> Self {
        match mode {
            ragskills_config::FallbackMode::Propagate => Self::Propagate,
            ragskills_config::FallbackMode::Truncate => Self::Truncate,
        }
    }
}

/// The context fitter. Stateless; create one and reuse it.
pub struct ContextFitter {
    estimator: Box<dyn TokenEstimator>,
    separator: String,
    mismatch_factor: f64,
}

impl Default for ContextFitter {
    fn default() -> Self {
        Self::new(CharEstimator::default())
    }
}

impl std::fmt::Debug for ContextFitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextFitter")
            .field("separator", &self.separator)
            .field("mismatch_factor", &self.mismatch_factor)
            .finish_non_exhaustive()
    }
}

impl ContextFitter {
    /// Create a fitter around the estimator used for re-checks and truncation.
    pub fn new(estimator: impl TokenEstimator + 'static) -> Self {
        Self {
            estimator: Box::new(estimator),
            separator: DEFAULT_SEPARATOR.to_string(),
            mismatch_factor: DEFAULT_MISMATCH_FACTOR,
        }
    }

    /// Build a fitter from the `[context]` configuration section.
    pub fn from_config(config: &ragskills_config::ContextConfig) -> Self {
        Self::new(CharEstimator::new(config.chars_per_token))
            .with_separator(config.separator.clone())
            .with_mismatch_factor(config.mismatch_factor)
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_mismatch_factor(mut self, factor: f64) -> Self {
        self.mismatch_factor = factor.max(1.0);
        self
    }

    pub fn estimator(&self) -> &dyn TokenEstimator {
        self.estimator.as_ref()
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Estimated tokens the separators add when `chunk_count` chunks are
    /// joined. Chunk estimates exclude them, so callers fitting into a hard
    /// window subtract this from their budget first.
    pub fn separator_overhead(&self, chunk_count: usize) -> usize {
        self.estimator
            .estimate(&self.separator)
            .saturating_mul(chunk_count.saturating_sub(1))
    }

    /// Whether a summary of `summary_tokens` is far enough past `budget`
    /// to point at an estimator/summarizer disagreement.
    pub fn is_estimation_mismatch(&self, summary_tokens: usize, budget: usize) -> bool {
        summary_tokens as f64 > budget as f64 * self.mismatch_factor
    }

    /// Fit `chunks` into `budget` tokens.
    ///
    /// # Algorithm
    ///
    /// 1. `budget == 0` → [`FitError::InvalidBudget`], even for no chunks
    /// 2. No chunks → empty context
    /// 3. Sum of chunk estimates within budget → chunks joined in order
    /// 4. Overflow without a summarizer → [`FitError::SummarizationUnavailable`]
    /// 5. Overflow with a summarizer → one summarization call, re-estimated,
    ///    truncated at a word boundary if still over budget
    pub async fn fit(
        &self,
        query: &str,
        chunks: &[ContextChunk],
        budget: usize,
        summarizer: Option<&dyn Summarizer>,
    ) -> Result<FittedContext, FitError> {
        if budget == 0 {
            return Err(FitError::InvalidBudget { budget });
        }

        if chunks.is_empty() {
            debug!("No chunks to fit, returning empty context");
            return Ok(FittedContext::empty());
        }

        let total = total_tokens(chunks);
        let joined = self.join(chunks);

        if total <= budget {
            debug!(chunks = chunks.len(), total, budget, "Chunks fit without summarization");
            return Ok(FittedContext {
                text: joined,
                used_token_count: total,
                truncated: false,
                summarized: false,
            });
        }

        let Some(summarizer) = summarizer else {
            return Err(FitError::SummarizationUnavailable {
                required: total,
                budget,
            });
        };

        info!(
            chunks = chunks.len(),
            total,
            budget,
            "Context overflows budget, summarizing"
        );

        let summary = summarizer.summarize(query, &joined, budget).await?;
        let summary_tokens = self.estimator.estimate(&summary);

        if summary_tokens <= budget {
            debug!(summary_tokens, budget, "Summary fits budget");
            return Ok(FittedContext {
                text: summary,
                used_token_count: summary_tokens,
                truncated: false,
                summarized: true,
            });
        }

        if self.is_estimation_mismatch(summary_tokens, budget) {
            warn!(
                summary_tokens,
                budget,
                factor = self.mismatch_factor,
                "Estimation mismatch: summary far exceeds its target, truncating"
            );
        } else {
            debug!(summary_tokens, budget, "Summary over budget, truncating");
        }

        let (text, used_token_count) = self.truncate(&summary, budget);
        Ok(FittedContext {
            text,
            used_token_count,
            truncated: true,
            summarized: true,
        })
    }

    /// Like [`fit`](Self::fit), but recovers from a missing or failed
    /// summarizer according to `policy`.
    ///
    /// [`FitError::InvalidBudget`] is never recovered.
    pub async fn fit_with_fallback(
        &self,
        query: &str,
        chunks: &[ContextChunk],
        budget: usize,
        summarizer: Option<&dyn Summarizer>,
        policy: FallbackPolicy,
    ) -> Result<FittedContext, FitError> {
        match self.fit(query, chunks, budget, summarizer).await {
            Err(err @ FitError::InvalidBudget { .. }) => Err(err),
            Err(err) if policy == FallbackPolicy::Truncate => {
                warn!(error = %err, budget, "Falling back to raw truncation");
                Ok(self.truncate_raw(chunks, budget))
            }
            other => other,
        }
    }

    /// Hard-truncate the plain concatenation of `chunks` to `budget`.
    ///
    /// When the chunks' own estimates fit, the concatenation is returned
    /// untouched. Otherwise the joined text is re-estimated with this
    /// fitter's estimator and cut at the last word boundary that fits;
    /// `truncated` is set only if text was actually dropped.
    pub fn truncate_raw(&self, chunks: &[ContextChunk], budget: usize) -> FittedContext {
        let total = total_tokens(chunks);
        if total <= budget {
            return FittedContext {
                text: self.join(chunks),
                used_token_count: total,
                truncated: false,
                summarized: false,
            };
        }

        let joined = self.join(chunks);
        let (text, used_token_count) = self.truncate(&joined, budget);
        let truncated = text.len() < joined.trim_end().len();
        FittedContext {
            text,
            used_token_count,
            truncated,
            summarized: false,
        }
    }

    fn join(&self, chunks: &[ContextChunk]) -> String {
        chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(&self.separator)
    }

    /// Longest whitespace-bounded prefix of `text` whose estimate fits.
    ///
    /// Returns the prefix (trailing whitespace trimmed) and its estimate.
    /// If the first word alone is over budget the result is empty.
    fn truncate(&self, text: &str, budget: usize) -> (String, usize) {
        let boundaries = word_ends(text);
        let fitting = boundaries
            .partition_point(|&end| self.estimator.estimate(&text[..end]) <= budget);

        if fitting == 0 {
            return (String::new(), 0);
        }

        let prefix = text[..boundaries[fitting - 1]].trim_end().to_string();
        let tokens = self.estimator.estimate(&prefix);
        (prefix, tokens)
    }
}

/// Sum of the chunks' precomputed estimates.
pub fn total_tokens(chunks: &[ContextChunk]) -> usize {
    chunks
        .iter()
        .fold(0usize, |acc, c| acc.saturating_add(c.estimated_token_count))
}

/// Byte offsets just past each whitespace-delimited word, in order.
fn word_ends(text: &str) -> Vec<usize> {
    let mut ends = Vec::new();
    let mut in_word = false;
    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if in_word {
                ends.push(idx);
            }
            in_word = false;
        } else {
            in_word = true;
        }
    }
    if in_word {
        ends.push(text.len());
    }
    ends
}

// ── Tests ─────────────────────────────────────────────────────────────────
