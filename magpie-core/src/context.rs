//! Context retrieval seam
//!
//! The vector-store indexer lives elsewhere; the pipeline only depends on
//! this trait. Retrieval may come back empty at any time (index not built,
//! provider down) and the pipeline treats that as "no extra context", never
//! as fatal.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// A retrieved code or documentation snippet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snippet {
    pub path: String,
    pub content: String,
    pub score: f32,
}

/// Retrieval interface to the context store
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    /// Make sure the backing collection exists
    async fn ensure_collection(&self) -> Result<()>;

    /// Retrieve up to `k` snippets relevant to the query
    async fn retrieve(&self, repo_key: &str, query: &str, k: usize) -> Result<Vec<Snippet>>;
}

/// Retriever used when RAG is disabled or unconfigured
pub struct NullRetriever;

#[async_trait]
impl ContextRetriever for NullRetriever {
    async fn ensure_collection(&self) -> Result<()> {
        Ok(())
    }

    async fn retrieve(&self, _repo_key: &str, _query: &str, _k: usize) -> Result<Vec<Snippet>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_retriever_is_always_empty() {
        let retriever = NullRetriever;
        retriever.ensure_collection().await.unwrap();
        let snippets = retriever.retrieve("acme/widgets", "login flow", 5).await.unwrap();
        assert!(snippets.is_empty());
    }
}
