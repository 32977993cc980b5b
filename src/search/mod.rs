//! Similarity search over job descriptions.
//!
//! A query text is embedded with the same pinned model used at ingest, the
//! vector index is over-fetched by the configured candidate multiplier, and
//! the surviving matches are hydrated back into full job records.


use itertools::Itertools;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::Config;
use crate::database::lancedb::VectorIndex;
use crate::database::sqlite::Database;
use crate::database::sqlite::models::Job;
use crate::embeddings::TextEmbedder;
use crate::{JobsError, Result};

/// A job record paired with its similarity score for the query. Serializes
/// without the job's vector handle.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarJob {
    #[serde(flatten)]
    pub job: Job,
    pub score: f32,
}

pub struct SimilaritySearch {
    database: Database,
    embedder: Arc<dyn TextEmbedder>,
    index: Arc<dyn VectorIndex>,
    candidate_multiplier: u32,
}

impl SimilaritySearch {
    #[inline]
    pub fn new(
        database: Database,
        embedder: Arc<dyn TextEmbedder>,
        index: Arc<dyn VectorIndex>,
        config: &Config,
    ) -> Self {
        Self {
            database,
            embedder,
            index,
            candidate_multiplier: config.search.candidate_multiplier,
        }
    }

    /// Find the `limit` stored jobs most similar to `text`, best match
    /// first. An empty result is a successful answer; provider and index
    /// failures propagate unmasked. The query text goes to the provider
    /// as-is, so whether an empty query embeds or fails is its call.
    #[inline]
    pub async fn find_similar(&self, text: &str, limit: usize) -> Result<Vec<SimilarJob>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(text)?;

        let num_candidates = limit.saturating_mul(self.candidate_multiplier as usize);
        let matches = self
            .index
            .search(&query_vector, num_candidates, num_candidates)
            .await?;

        debug!(
            "Index returned {} candidates for limit {}",
            matches.len(),
            limit
        );

        let mut results = Vec::with_capacity(matches.len().min(limit));
        for vector_match in matches {
            let job = self
                .database
                .get_job(vector_match.job_id)
                .await
                .map_err(|e| JobsError::Database(e.to_string()))?;

            match job {
                // Only the vector the row currently references may rank it;
                // anything else is stale index debris from a failed or
                // half-finished write.
                Some(job) if job.vector_id == vector_match.vector_id => {
                    results.push(SimilarJob {
                        job,
                        score: vector_match.score,
                    });
                }
                Some(job) => warn!(
                    "Skipping stale vector {} for job {} (current vector is {})",
                    vector_match.vector_id, job.id, job.vector_id
                ),
                None => warn!(
                    "Skipping orphaned vector {} (job {} no longer exists)",
                    vector_match.vector_id, vector_match.job_id
                ),
            }
        }

        let ranked: Vec<SimilarJob> = results
            .into_iter()
            .sorted_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .take(limit)
            .collect();

        Ok(ranked)
    }
}
