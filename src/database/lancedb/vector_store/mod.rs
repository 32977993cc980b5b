
use super::{EmbeddingRecord, VectorIndex, VectorMatch};
use crate::config::Config;
use crate::{JobsError, Result};
use arrow::array::{Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatchIterator, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::{
    Connection,
    query::{ExecutableQuery, QueryBase},
};
use std::sync::Arc;
use tracing::{debug, info};

/// Vector database store using LanceDB for similarity search.
///
/// The vector dimension is fixed at construction from the pinned embedding
/// model configuration; records of any other dimension are rejected. Mixing
/// models in one index is a deployment error, not something resolved here.
pub struct VectorStore {
    connection: Connection,
    table_name: String,
    vector_dimension: usize,
}

impl VectorStore {
    #[inline]
    pub async fn new(config: &Config) -> Result<Self> {
        let db_path = config.vector_database_path();
        debug!("Initializing LanceDB at path: {:?}", db_path);

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                JobsError::Database(format!("Failed to create vector database directory: {}", e))
            })?;
        }

        let uri = format!("file://{}", db_path.display());

        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| JobsError::Database(format!("Failed to connect to LanceDB: {}", e)))?;

        let store = Self {
            connection,
            table_name: "job_embeddings".to_string(),
            vector_dimension: config.openai.dimensions as usize,
        };

        store.initialize_table().await?;

        info!(
            "Vector store initialized with {} dimensions",
            store.vector_dimension
        );
        Ok(store)
    }

    /// Create the embeddings table with the pinned-dimension schema if it
    /// does not exist yet.
    async fn initialize_table(&self) -> Result<()> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| JobsError::Database(format!("Failed to list tables: {}", e)))?;

        if table_names.contains(&self.table_name) {
            debug!("Embeddings table already exists");
            return Ok(());
        }

        let schema = self.create_schema();

        self.connection
            .create_empty_table(&self.table_name, schema)
            .execute()
            .await
            .map_err(|e| JobsError::Database(format!("Failed to create table: {}", e)))?;

        debug!(
            "Embeddings table created with {} dimensions",
            self.vector_dimension
        );
        Ok(())
    }

    fn create_schema(&self) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    self.vector_dimension as i32,
                ),
                false,
            ),
            Field::new("job_id", DataType::Int64, false),
            Field::new("created_at", DataType::Utf8, false),
        ]))
    }

    fn create_record_batch(&self, record: &EmbeddingRecord) -> Result<RecordBatch> {
        let values_array = Float32Array::from(record.vector.clone());
        let field = Arc::new(Field::new("item", DataType::Float32, false));
        let vector_array = FixedSizeListArray::try_new(
            field,
            self.vector_dimension as i32,
            Arc::new(values_array),
            None,
        )
        .map_err(|e| JobsError::Database(format!("Failed to create vector array: {}", e)))?;

        let arrays: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from(vec![record.id.as_str()])),
            Arc::new(vector_array),
            Arc::new(Int64Array::from(vec![record.job_id])),
            Arc::new(StringArray::from(vec![record.created_at.as_str()])),
        ];

        RecordBatch::try_new(self.create_schema(), arrays)
            .map_err(|e| JobsError::Database(format!("Failed to create record batch: {}", e)))
    }

    async fn open_table(&self) -> Result<lancedb::Table> {
        self.connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| JobsError::Database(format!("Failed to open table: {}", e)))
    }

    fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<VectorMatch>> {
        let mut matches = Vec::new();

        let ids = batch
            .column_by_name("id")
            .ok_or_else(|| JobsError::Index("Missing id column".to_string()))?
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| JobsError::Index("Invalid id column type".to_string()))?;

        let job_ids = batch
            .column_by_name("job_id")
            .ok_or_else(|| JobsError::Index("Missing job_id column".to_string()))?
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(|| JobsError::Index("Invalid job_id column type".to_string()))?;

        let distances = batch
            .column_by_name("_distance")
            .ok_or_else(|| {
                JobsError::Index("Search results carry no distance metadata".to_string())
            })?
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or_else(|| JobsError::Index("Invalid _distance column type".to_string()))?;

        for row in 0..batch.num_rows() {
            if distances.is_null(row) {
                return Err(JobsError::Index(format!(
                    "Match {} carries no distance",
                    ids.value(row)
                )));
            }

            // Convert distance to similarity score (higher is better)
            matches.push(VectorMatch {
                vector_id: ids.value(row).to_string(),
                job_id: job_ids.value(row),
                score: 1.0 - distances.value(row),
            });
        }

        Ok(matches)
    }

    /// Get the total number of embeddings stored
    #[inline]
    pub async fn count_embeddings(&self) -> Result<u64> {
        let table = self.open_table().await?;

        let count = table
            .count_rows(None)
            .await
            .map_err(|e| JobsError::Database(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    /// Optimize the vector database by compacting and reorganizing data
    #[inline]
    pub async fn optimize(&self) -> Result<()> {
        debug!("Optimizing vector database");

        let table = self.open_table().await?;

        table
            .optimize(lancedb::table::OptimizeAction::All)
            .await
            .map_err(|e| JobsError::Database(format!("Failed to optimize table: {}", e)))?;

        info!("Vector database optimization completed");
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for VectorStore {
    #[inline]
    async fn add_embedding(&self, record: EmbeddingRecord) -> Result<()> {
        if record.vector.len() != self.vector_dimension {
            return Err(JobsError::Index(format!(
                "Vector dimension {} does not match the configured dimension {}",
                record.vector.len(),
                self.vector_dimension
            )));
        }

        debug!("Storing embedding {} for job {}", record.id, record.job_id);

        let record_batch = self.create_record_batch(&record)?;
        let table = self.open_table().await?;

        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| JobsError::Database(format!("Failed to insert embedding: {}", e)))?;

        Ok(())
    }

    #[inline]
    async fn search(
        &self,
        query_vector: &[f32],
        num_candidates: usize,
        limit: usize,
    ) -> Result<Vec<VectorMatch>> {
        if query_vector.len() != self.vector_dimension {
            return Err(JobsError::Index(format!(
                "Query vector dimension {} does not match the configured dimension {}",
                query_vector.len(),
                self.vector_dimension
            )));
        }

        debug!(
            "Searching {} candidates for top {} matches",
            num_candidates, limit
        );

        let table = self.open_table().await?;

        let query = table
            .vector_search(query_vector)
            .map_err(|e| JobsError::Index(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .limit(num_candidates.max(limit));

        let mut results = query
            .execute()
            .await
            .map_err(|e| JobsError::Index(format!("Failed to execute search: {}", e)))?;

        let mut matches = Vec::new();
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| JobsError::Index(format!("Failed to read result stream: {}", e)))?
        {
            matches.extend(Self::parse_search_batch(&batch)?);
        }

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(limit);

        debug!("Search returned {} matches", matches.len());
        Ok(matches)
    }

    #[inline]
    async fn remove_embedding(&self, vector_id: &str) -> Result<()> {
        debug!("Deleting embedding {}", vector_id);

        let table = self.open_table().await?;

        let predicate = format!("id = '{}'", vector_id.replace('\'', "''"));
        table
            .delete(&predicate)
            .await
            .map_err(|e| JobsError::Database(format!("Failed to delete embedding: {}", e)))?;

        Ok(())
    }
}
