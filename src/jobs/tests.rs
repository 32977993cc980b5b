use super::*;
use crate::database::lancedb::VectorMatch;
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

const DIMS: usize = 8;

/// Deterministic word-bucket embedder; the real provider is non-deterministic
/// and network-dependent, so tests substitute this fake.
struct FakeEmbedder {
    calls: AtomicUsize,
    fail: bool,
}

impl FakeEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn bucket_vector(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0_f32; DIMS];
    for word in text.split_whitespace() {
        let mut hash: usize = 0;
        for byte in word.bytes() {
            hash = hash.wrapping_mul(31).wrapping_add(byte as usize);
        }
        vector[hash % DIMS] += 1.0;
    }
    vector
}

impl TextEmbedder for FakeEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(JobsError::Provider("provider unavailable".to_string()));
        }
        Ok(bucket_vector(text))
    }

    fn dimensions(&self) -> usize {
        DIMS
    }
}

/// Brute-force cosine index satisfying the same contract as the LanceDB
/// store.
struct MemoryVectorIndex {
    records: Mutex<Vec<EmbeddingRecord>>,
    fail_writes: bool,
}

impl MemoryVectorIndex {
    fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail_writes: false,
        }
    }

    fn failing_writes() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail_writes: true,
        }
    }

    fn len(&self) -> usize {
        self.records.lock().expect("lock poisoned").len()
    }

    fn vector_for(&self, vector_id: &str) -> Option<Vec<f32>> {
        self.records
            .lock()
            .expect("lock poisoned")
            .iter()
            .find(|r| r.id == vector_id)
            .map(|r| r.vector.clone())
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn add_embedding(&self, record: EmbeddingRecord) -> Result<()> {
        if self.fail_writes {
            return Err(JobsError::Index("index unavailable".to_string()));
        }
        self.records.lock().expect("lock poisoned").push(record);
        Ok(())
    }

    async fn search(
        &self,
        query_vector: &[f32],
        num_candidates: usize,
        limit: usize,
    ) -> Result<Vec<VectorMatch>> {
        let records = self.records.lock().expect("lock poisoned");
        let mut matches: Vec<VectorMatch> = records
            .iter()
            .map(|record| VectorMatch {
                vector_id: record.id.clone(),
                job_id: record.job_id,
                score: cosine(query_vector, &record.vector),
            })
            .collect();
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(num_candidates);
        matches.truncate(limit);
        Ok(matches)
    }

    async fn remove_embedding(&self, vector_id: &str) -> Result<()> {
        self.records
            .lock()
            .expect("lock poisoned")
            .retain(|record| record.id != vector_id);
        Ok(())
    }
}

async fn setup() -> (TempDir, JobService, Arc<FakeEmbedder>, Arc<MemoryVectorIndex>) {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let database = Database::new(temp_dir.path().join("jobs.db"))
        .await
        .expect("should create database");
    let embedder = Arc::new(FakeEmbedder::new());
    let index = Arc::new(MemoryVectorIndex::new());
    let service = JobService::new(
        database,
        Arc::clone(&embedder) as Arc<dyn TextEmbedder>,
        Arc::clone(&index) as Arc<dyn VectorIndex>,
    );
    (temp_dir, service, embedder, index)
}

fn engineer_job() -> NewJob {
    NewJob {
        title: "Engineer".to_string(),
        company: "Acme".to_string(),
        job_url: "http://x".to_string(),
        description: "build distributed systems".to_string(),
        ..NewJob::default()
    }
}

#[tokio::test]
async fn create_embeds_and_persists_together() {
    let (_temp_dir, service, embedder, index) = setup().await;

    let job = service
        .create_job(engineer_job())
        .await
        .expect("create should succeed");

    assert_eq!(embedder.call_count(), 1);
    assert_eq!(index.len(), 1);

    let vector = index
        .vector_for(&job.vector_id)
        .expect("vector should be stored under the job's vector id");
    assert_eq!(vector.len(), DIMS);
    assert_eq!(vector, bucket_vector("build distributed systems"));
}

#[tokio::test]
async fn validation_rejects_before_any_provider_work() {
    let (_temp_dir, service, embedder, index) = setup().await;

    let invalid = NewJob {
        title: String::new(),
        ..engineer_job()
    };

    let result = service.create_job(invalid).await;
    assert!(matches!(result, Err(JobsError::Validation(_))));
    assert_eq!(embedder.call_count(), 0, "no provider call for invalid input");
    assert_eq!(index.len(), 0);
    assert!(service.list_jobs(&JobFilters::default()).await.expect("list").is_empty());
}

#[tokio::test]
async fn provider_failure_fails_create_without_partial_state() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let database = Database::new(temp_dir.path().join("jobs.db"))
        .await
        .expect("should create database");
    let index = Arc::new(MemoryVectorIndex::new());
    let service = JobService::new(
        database.clone(),
        Arc::new(FakeEmbedder::failing()),
        Arc::clone(&index) as Arc<dyn VectorIndex>,
    );

    let result = service.create_job(engineer_job()).await;
    assert!(matches!(result, Err(JobsError::Provider(_))));
    assert_eq!(database.count_jobs().await.expect("count"), 0);
    assert_eq!(index.len(), 0);
}

#[tokio::test]
async fn index_failure_rolls_back_the_row() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let database = Database::new(temp_dir.path().join("jobs.db"))
        .await
        .expect("should create database");
    let service = JobService::new(
        database.clone(),
        Arc::new(FakeEmbedder::new()),
        Arc::new(MemoryVectorIndex::failing_writes()),
    );

    let result = service.create_job(engineer_job()).await;
    assert!(matches!(result, Err(JobsError::Index(_))));
    assert_eq!(database.count_jobs().await.expect("count"), 0);
}

#[tokio::test]
async fn update_without_description_change_keeps_embedding() {
    let (_temp_dir, service, embedder, index) = setup().await;
    let job = service
        .create_job(engineer_job())
        .await
        .expect("create should succeed");
    let original_vector = index.vector_for(&job.vector_id).expect("vector stored");

    let update = JobUpdate {
        company: Some("Initech".to_string()),
        ..JobUpdate::default()
    };
    let updated = service
        .update_job(job.id, update)
        .await
        .expect("update should succeed");

    assert_eq!(updated.company, "Initech");
    assert_eq!(updated.vector_id, job.vector_id);
    assert_eq!(
        index.vector_for(&updated.vector_id).expect("vector stored"),
        original_vector,
        "embedding is byte-for-byte unchanged"
    );
    assert_eq!(embedder.call_count(), 1, "no re-embedding happened");
}

#[tokio::test]
async fn update_with_same_description_does_not_reembed() {
    let (_temp_dir, service, embedder, _index) = setup().await;
    let job = service
        .create_job(engineer_job())
        .await
        .expect("create should succeed");

    let update = JobUpdate {
        description: Some("build distributed systems".to_string()),
        ..JobUpdate::default()
    };
    let updated = service
        .update_job(job.id, update)
        .await
        .expect("update should succeed");

    assert_eq!(updated.vector_id, job.vector_id);
    assert_eq!(embedder.call_count(), 1);
}

#[tokio::test]
async fn update_with_new_description_reembeds_and_drops_stale_vector() {
    let (_temp_dir, service, embedder, index) = setup().await;
    let job = service
        .create_job(engineer_job())
        .await
        .expect("create should succeed");

    let update = JobUpdate {
        description: Some("herd borrow checkers all day".to_string()),
        ..JobUpdate::default()
    };
    let updated = service
        .update_job(job.id, update)
        .await
        .expect("update should succeed");

    assert_ne!(updated.vector_id, job.vector_id);
    assert_eq!(embedder.call_count(), 2);
    assert_eq!(index.len(), 1, "stale vector was removed");
    assert_eq!(
        index.vector_for(&updated.vector_id).expect("vector stored"),
        bucket_vector("herd borrow checkers all day"),
        "stored vector corresponds to the current description"
    );
}

#[tokio::test]
async fn provider_failure_fails_update_without_partial_state() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let database = Database::new(temp_dir.path().join("jobs.db"))
        .await
        .expect("should create database");
    let good_embedder = Arc::new(FakeEmbedder::new());
    let index = Arc::new(MemoryVectorIndex::new());
    let service = JobService::new(
        database.clone(),
        Arc::clone(&good_embedder) as Arc<dyn TextEmbedder>,
        Arc::clone(&index) as Arc<dyn VectorIndex>,
    );
    let job = service
        .create_job(engineer_job())
        .await
        .expect("create should succeed");

    // Swap in a failing provider for the update path
    let failing_service = JobService::new(
        database.clone(),
        Arc::new(FakeEmbedder::failing()),
        Arc::clone(&index) as Arc<dyn VectorIndex>,
    );

    let update = JobUpdate {
        description: Some("completely new description".to_string()),
        ..JobUpdate::default()
    };
    let result = failing_service.update_job(job.id, update).await;
    assert!(matches!(result, Err(JobsError::Provider(_))));

    let unchanged = service.get_job(job.id).await.expect("job still exists");
    assert_eq!(unchanged.description, "build distributed systems");
    assert_eq!(unchanged.vector_id, job.vector_id);
    assert_eq!(index.len(), 1);
}

#[tokio::test]
async fn update_missing_job_is_not_found() {
    let (_temp_dir, service, _embedder, _index) = setup().await;

    let update = JobUpdate {
        company: Some("Initech".to_string()),
        ..JobUpdate::default()
    };
    let result = service.update_job(9999, update).await;
    assert!(matches!(result, Err(JobsError::NotFound(_))));
}

#[tokio::test]
async fn delete_removes_row_and_vector_together() {
    let (_temp_dir, service, _embedder, index) = setup().await;
    let job = service
        .create_job(engineer_job())
        .await
        .expect("create should succeed");

    let deleted = service
        .delete_job(job.id)
        .await
        .expect("delete should succeed");

    assert_eq!(deleted.id, job.id);
    assert_eq!(index.len(), 0);
    assert!(matches!(
        service.get_job(job.id).await,
        Err(JobsError::NotFound(_))
    ));
}

#[tokio::test]
async fn delete_missing_job_is_not_found() {
    let (_temp_dir, service, _embedder, _index) = setup().await;

    let result = service.delete_job(9999).await;
    assert!(matches!(result, Err(JobsError::NotFound(_))));
}
