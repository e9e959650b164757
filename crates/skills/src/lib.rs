//! Prompt-assembly and context-management skills for RAG chatbots.
//!
//! The centre of the crate is [`ContextFitter`]: given a query, ranked
//! chunks, and a token budget, it returns one context string that fits.
//! Around it sit the skills a chatbot needs to use it:
//!
//! - [`context::token`] — token estimation
//! - [`prompt`] — templates and context budget derivation
//! - [`summarize`] — an LLM-backed query-focused summarizer
//! - [`memory`] — full and summarized conversation history as chunks
//! - [`pipeline`] — retrieve → fit → answer

pub mod context;
pub mod memory;
pub mod pipeline;
pub mod prompt;
pub mod summarize;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::{CharEstimator, ContextFitter, FallbackPolicy, TokenEstimator};
pub use memory::{FullHistory, SummarizedHistory};
pub use pipeline::{RagAnswer, RagPipeline};
pub use prompt::{ContextWindow, PromptError, PromptTemplate};
pub use summarize::ProviderSummarizer;

pub use ragskills_core::{ContextChunk, FittedContext, FitError, Summarizer};
