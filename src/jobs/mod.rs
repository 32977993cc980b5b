//! Job record operations and the embedding synchronization policy.
//!
//! The policy is an explicit pre-write rule, not a storage-layer hook: the
//! description is embedded *before* anything is persisted, so a provider
//! failure fails the whole create/update and leaves the store untouched.

#[cfg(test)]
mod tests;

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::lancedb::{EmbeddingRecord, VectorIndex};
use crate::database::sqlite::Database;
use crate::database::sqlite::models::{Job, JobFilters, JobUpdate, NewJob};
use crate::embeddings::TextEmbedder;
use crate::{JobsError, Result};

pub struct JobService {
    database: Database,
    embedder: Arc<dyn TextEmbedder>,
    index: Arc<dyn VectorIndex>,
}

impl JobService {
    #[inline]
    pub fn new(
        database: Database,
        embedder: Arc<dyn TextEmbedder>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            database,
            embedder,
            index,
        }
    }

    /// Create a job posting. The description is embedded synchronously before
    /// the record is persisted; the row and its vector are committed together
    /// or not at all.
    #[inline]
    pub async fn create_job(&self, new_job: NewJob) -> Result<Job> {
        validate_new_job(&new_job)?;

        let vector = self.embedder.embed(&new_job.description)?;
        let vector_id = Uuid::new_v4().to_string();

        let job = self
            .database
            .insert_job(&new_job, &vector_id)
            .await
            .map_err(|e| JobsError::Database(e.to_string()))?;

        let record = EmbeddingRecord {
            id: vector_id,
            job_id: job.id,
            vector,
            created_at: Utc::now().to_rfc3339(),
        };

        if let Err(e) = self.index.add_embedding(record).await {
            // Roll the row back so no job is visible without its vector
            if let Err(rollback) = self.database.delete_job(job.id).await {
                warn!(
                    "Failed to roll back job {} after vector write failure: {}",
                    job.id, rollback
                );
            }
            return Err(e);
        }

        info!("Created job {} ({})", job.id, job.title);
        Ok(job)
    }

    #[inline]
    pub async fn get_job(&self, id: i64) -> Result<Job> {
        self.database
            .get_job(id)
            .await
            .map_err(|e| JobsError::Database(e.to_string()))?
            .ok_or_else(|| JobsError::NotFound(format!("Job with id {} is unavailable", id)))
    }

    #[inline]
    pub async fn list_jobs(&self, filters: &JobFilters) -> Result<Vec<Job>> {
        self.database
            .list_jobs(filters)
            .await
            .map_err(|e| JobsError::Database(e.to_string()))
    }

    /// Apply a partial update. The embedding is recomputed only when the
    /// incoming description actually differs from the stored one; updates to
    /// other fields leave the existing vector byte-for-byte unchanged.
    #[inline]
    pub async fn update_job(&self, id: i64, update: JobUpdate) -> Result<Job> {
        validate_update(&update)?;

        let existing = self.get_job(id).await?;

        let description_changed = update
            .description
            .as_deref()
            .is_some_and(|description| description != existing.description);

        if !description_changed {
            let job = self
                .database
                .update_job(id, &update, None)
                .await
                .map_err(|e| JobsError::Database(e.to_string()))?
                .ok_or_else(|| {
                    JobsError::NotFound(format!("Job with id {} is unavailable", id))
                })?;
            return Ok(job);
        }

        debug!("Description changed for job {}, re-embedding", id);

        let description = update.description.as_deref().unwrap_or_default();
        let vector = self.embedder.embed(description)?;
        let vector_id = Uuid::new_v4().to_string();

        let record = EmbeddingRecord {
            id: vector_id.clone(),
            job_id: id,
            vector,
            created_at: Utc::now().to_rfc3339(),
        };
        self.index.add_embedding(record).await?;

        let updated = match self.database.update_job(id, &update, Some(&vector_id)).await {
            Ok(updated) => updated,
            Err(e) => {
                // The row never adopted the new vector; remove it so search
                // cannot surface a description the row does not carry.
                self.discard_unreferenced_vector(&vector_id).await;
                return Err(JobsError::Database(e.to_string()));
            }
        };

        let Some(job) = updated else {
            // The row vanished between the read and the write
            self.discard_unreferenced_vector(&vector_id).await;
            return Err(JobsError::NotFound(format!(
                "Job with id {} is unavailable",
                id
            )));
        };

        // The stale vector is no longer referenced by any row; a removal
        // failure leaves dead weight in the index, not an inconsistency.
        if let Err(e) = self.index.remove_embedding(&existing.vector_id).await {
            warn!(
                "Failed to remove stale vector {} for job {}: {}",
                existing.vector_id, id, e
            );
        }

        info!("Updated job {} with re-embedded description", id);
        Ok(job)
    }

    /// Remove a vector no job row references. Failure leaves dead weight in
    /// the index, not an inconsistency, so it is logged and swallowed.
    async fn discard_unreferenced_vector(&self, vector_id: &str) {
        if let Err(e) = self.index.remove_embedding(vector_id).await {
            warn!("Failed to remove unreferenced vector {}: {}", vector_id, e);
        }
    }

    /// Delete a job and its vector together; the vector has no independent
    /// lifecycle.
    #[inline]
    pub async fn delete_job(&self, id: i64) -> Result<Job> {
        let job = self.get_job(id).await?;

        let deleted = self
            .database
            .delete_job(id)
            .await
            .map_err(|e| JobsError::Database(e.to_string()))?;

        if !deleted {
            return Err(JobsError::NotFound(format!(
                "Job with id {} is unavailable",
                id
            )));
        }

        if let Err(e) = self.index.remove_embedding(&job.vector_id).await {
            warn!(
                "Failed to remove vector {} for deleted job {}: {}",
                job.vector_id, id, e
            );
        }

        info!("Deleted job {} ({})", job.id, job.title);
        Ok(job)
    }
}

/// Required job attributes, rejected before any embedding or persistence
/// work.
fn validate_new_job(new_job: &NewJob) -> Result<()> {
    require_non_empty("title", &new_job.title)?;
    require_non_empty("company", &new_job.company)?;
    require_non_empty("job_url", &new_job.job_url)?;
    require_non_empty("description", &new_job.description)?;

    if new_job.experience < 0 {
        return Err(JobsError::Validation(
            "experience cannot be negative".to_string(),
        ));
    }

    Ok(())
}

fn validate_update(update: &JobUpdate) -> Result<()> {
    for (field, value) in [
        ("title", &update.title),
        ("company", &update.company),
        ("job_url", &update.job_url),
        ("description", &update.description),
    ] {
        if let Some(value) = value {
            require_non_empty(field, value)?;
        }
    }

    if update.experience.is_some_and(|experience| experience < 0) {
        return Err(JobsError::Validation(
            "experience cannot be negative".to_string(),
        ));
    }

    Ok(())
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(JobsError::Validation(format!(
            "{} must be provided",
            field
        )));
    }
    Ok(())
}
