//! # RAG Skills Core
//!
//! Domain types, collaborator traits, and error definitions for the RAG
//! skills library. Nothing in here talks to a network or a model; it only
//! defines the shapes that flow between the context fitter and its
//! collaborators.
//!
//! ## Collaborators
//!
//! Every external capability is a trait here so callers can plug in a real
//! backend or a stub:
//! - [`Retriever`] returns ranked context chunks for a query
//! - [`Summarizer`] shortens text toward a token target, focused on a query
//! - [`Provider`] turns a prompt into a model completion

pub mod chunk;
pub mod error;
pub mod message;
pub mod provider;
pub mod retriever;
pub mod summarizer;

// Re-export key types at crate root for ergonomics
pub use chunk::{ContextChunk, FittedContext};
pub use error::{
    Error, FitError, PromptError, ProviderError, Result, RetrievalError, SummarizerError,
};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use retriever::Retriever;
pub use summarizer::{FnSummarizer, Summarizer};
