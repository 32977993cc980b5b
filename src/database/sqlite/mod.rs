use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};

use crate::database::sqlite::models::{Job, JobFilters, JobUpdate, NewJob};
use crate::database::sqlite::queries::JobQueries;

#[cfg(test)]
mod tests;

pub mod models;
pub mod queries;

pub type DbPool = Pool<Sqlite>;

#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    #[inline]
    pub async fn new<P: AsRef<Path>>(database_url: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_url)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    #[inline]
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("src/database/sqlite/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run schema migration")?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    #[inline]
    pub async fn initialize_from_config_dir(config_dir: &Path) -> Result<Self> {
        let db_path = config_dir.join("jobs.db");
        let db_url = db_path.to_string_lossy();

        std::fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        Self::new(db_url.as_ref()).await
    }

    // Job record operations
    #[inline]
    pub async fn insert_job(&self, new_job: &NewJob, vector_id: &str) -> Result<Job> {
        JobQueries::create(&self.pool, new_job, vector_id).await
    }

    #[inline]
    pub async fn get_job(&self, id: i64) -> Result<Option<Job>> {
        JobQueries::get_by_id(&self.pool, id).await
    }

    #[inline]
    pub async fn list_jobs(&self, filters: &JobFilters) -> Result<Vec<Job>> {
        JobQueries::list(&self.pool, filters).await
    }

    #[inline]
    pub async fn update_job(
        &self,
        id: i64,
        update: &JobUpdate,
        vector_id: Option<&str>,
    ) -> Result<Option<Job>> {
        JobQueries::update(&self.pool, id, update, vector_id).await
    }

    #[inline]
    pub async fn delete_job(&self, id: i64) -> Result<bool> {
        JobQueries::delete(&self.pool, id).await
    }

    #[inline]
    pub async fn count_jobs(&self) -> Result<i64> {
        JobQueries::count(&self.pool).await
    }

    /// Optimize database performance by running VACUUM and ANALYZE
    #[inline]
    pub async fn optimize(&self) -> Result<()> {
        info!("Optimizing database performance");

        sqlx::query("VACUUM")
            .execute(&self.pool)
            .await
            .context("Failed to vacuum database")?;

        sqlx::query("ANALYZE")
            .execute(&self.pool)
            .await
            .context("Failed to analyze database")?;

        debug!("Database optimization completed");
        Ok(())
    }
}
