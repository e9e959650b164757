//! Error types for the RAG skills domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] wraps them all.

use thiserror::Error;

/// The top-level error type for all RAG skills operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Context fitting ---
    #[error("Context fitting error: {0}")]
    Fit(#[from] FitError),

    // --- Collaborators ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Summarizer error: {0}")]
    Summarizer(#[from] SummarizerError),

    // --- Prompt assembly ---
    #[error("Prompt template error: {0}")]
    Prompt(#[from] PromptError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures surfaced by the context fitter.
///
/// An estimator/summarizer disagreement is not represented here: it is
/// logged and the truncation fallback applies.
#[derive(Debug, Error)]
pub enum FitError {
    #[error("Token budget must be positive, got {budget}")]
    InvalidBudget { budget: usize },

    #[error(
        "Context needs {required} tokens but the budget is {budget}, and no summarizer is configured"
    )]
    SummarizationUnavailable { required: usize, budget: usize },

    #[error("Summarization failed: {0}")]
    SummarizationFailed(#[from] SummarizerError),
}

/// Failures while rendering a prompt template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("Missing template variable: {0}")]
    MissingVariable(String),

    #[error("Unclosed placeholder at byte {0}")]
    UnclosedPlaceholder(usize),
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Response blocked by content filter: {0}")]
    ContentFiltered(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum SummarizerError {
    #[error("Summarizer rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Summarizer timed out: {0}")]
    Timeout(String),

    #[error("Summary blocked by content filter: {0}")]
    ContentFiltered(String),

    #[error("Summarizer provider failed: {0}")]
    Provider(ProviderError),

    #[error("Summarizer failed: {0}")]
    Other(String),
}

impl From<ProviderError> for SummarizerError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::RateLimited { retry_after_secs } => Self::RateLimited { retry_after_secs },
            ProviderError::Timeout(msg) => Self::Timeout(msg),
            ProviderError::ContentFiltered(msg) => Self::ContentFiltered(msg),
            other => Self::Provider(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Retrieval backend unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),
}
