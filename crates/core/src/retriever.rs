//! Retriever trait — the boundary to the embedding/vector search backend.

use async_trait::async_trait;
use crate::chunk::ContextChunk;
use crate::error::RetrievalError;

/// Returns context chunks for a query, most relevant first.
///
/// Each chunk must carry a token estimate produced by the same estimator
/// the caller later hands to the context fitter.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// The backend name (e.g., "chroma", "qdrant").
    fn name(&self) -> &str;

    /// Fetch at most `top_k` chunks for `query`, ordered by relevance.
    async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> std::result::Result<Vec<ContextChunk>, RetrievalError>;
}
