//! Context fitting: token estimation and the budget-bounded fitter.
//!
//! | Situation | Outcome |
//! |-----------|---------|
//! | Chunks fit the budget | Joined in caller order |
//! | Overflow, summarizer present | One summarization call, truncated if still over |
//! | Overflow, no summarizer | `SummarizationUnavailable` (or raw truncation via fallback) |
//! | Budget of zero | `InvalidBudget` |

pub mod fitter;
pub mod token;

pub use fitter::{ContextFitter, FallbackPolicy, total_tokens};
pub use token::{CharEstimator, TokenEstimator, chunk_from_text, estimate_tokens};
