// LanceDB vector database module
// Handles vector storage and approximate nearest-neighbor search for job
// description embeddings.

pub mod vector_store;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Embedding record stored in the vector index.
///
/// Each record is owned by exactly one job row; `id` is the `vector_id`
/// carried on that row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub id: String,
    pub job_id: i64,
    /// The vector itself; dimension is pinned by deployment configuration.
    pub vector: Vec<f32>,
    pub created_at: String,
}

/// A ranked hit from a vector search. Carries the similarity score from the
/// index's own scoring metadata, never the stored vector.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    pub vector_id: String,
    pub job_id: i64,
    pub score: f32,
}

/// Narrow capability over the nearest-neighbor index.
///
/// `num_candidates` is the over-fetch budget handed to the approximate
/// search; the result is truncated to `limit` after ranking. Any backing
/// engine (a brute-force scan in tests, LanceDB in production) must rank
/// matches by non-increasing score and cap the result at `limit`.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn add_embedding(&self, record: EmbeddingRecord) -> Result<()>;

    async fn search(
        &self,
        query_vector: &[f32],
        num_candidates: usize,
        limit: usize,
    ) -> Result<Vec<VectorMatch>>;

    async fn remove_embedding(&self, vector_id: &str) -> Result<()>;
}
