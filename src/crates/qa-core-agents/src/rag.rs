//! RAG enrichment for the Analyzer agent, isolated behind a trait so the
//! absence (or failure) of a real retrieval backend degrades gracefully
//! instead of taking the analysis down with it.

use async_trait::async_trait;

/// A handful of retrieved documents relevant to a query, opaque beyond their
/// text — the Analyzer only folds them into its prompt and risk narrative.
#[derive(Debug, Clone, Default)]
pub struct RagContext {
    pub documents: Vec<String>,
}

impl RagContext {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Retrieval backend for API-analysis context. Grounded on
/// `original_source/.../api_analyzer_agent.py`'s R2R client wrapper, which
/// the original falls back to a mock when the client library is unavailable;
/// here that fallback is simply "no implementor registered".
#[async_trait]
pub trait RagClient: Send + Sync {
    async fn search(&self, query: &str) -> Result<RagContext, qa_core_utils::CoreError>;
}

/// Always degrades: used when no retrieval backend is configured.
pub struct NoRagClient;

#[async_trait]
impl RagClient for NoRagClient {
    async fn search(&self, _query: &str) -> Result<RagContext, qa_core_utils::CoreError> {
        Ok(RagContext::default())
    }
}
