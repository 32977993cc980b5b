
use super::models::{Job, JobFilters, JobUpdate, NewJob};
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

/// Hard cap on list results, matching the original backend's page size.
pub const LIST_LIMIT: i64 = 100;

const JOB_COLUMNS: &str = "id, title, company, location, skills, experience, compensation, \
     company_logo, applications, job_url, posted_date, description, vector_id";

pub struct JobQueries;

impl JobQueries {
    #[inline]
    pub async fn create(pool: &SqlitePool, new_job: &NewJob, vector_id: &str) -> Result<Job> {
        let now = Utc::now().naive_utc();
        let skills = serde_json::to_string(&new_job.skills)
            .context("Failed to serialize skills for storage")?;

        let id = sqlx::query(
            "INSERT INTO jobs (title, company, location, skills, experience, compensation, \
             company_logo, applications, job_url, posted_date, description, vector_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new_job.title)
        .bind(&new_job.company)
        .bind(&new_job.location)
        .bind(&skills)
        .bind(new_job.experience)
        .bind(&new_job.compensation)
        .bind(&new_job.company_logo)
        .bind(new_job.applications)
        .bind(&new_job.job_url)
        .bind(now)
        .bind(&new_job.description)
        .bind(vector_id)
        .execute(pool)
        .await
        .context("Failed to create job")?
        .last_insert_rowid();

        Self::get_by_id(pool, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created job"))
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get job by id")?;

        Ok(job)
    }

    /// List jobs matching the given filters, newest first, LinkedIn-sourced
    /// postings after all other sources.
    #[inline]
    pub async fn list(pool: &SqlitePool, filters: &JobFilters) -> Result<Vec<Job>> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(title) = &filters.title {
            conditions.push("title LIKE '%' || ? || '%' COLLATE NOCASE");
            values.push(title.clone());
        }

        if let Some(company) = &filters.company {
            conditions.push("company LIKE '%' || ? || '%' COLLATE NOCASE");
            values.push(company.clone());
        }

        if let Some(location) = &filters.location {
            conditions.push("location LIKE '%' || ? || '%' COLLATE NOCASE");
            values.push(location.clone());
        }

        // Skills are stored as a JSON array of strings; every requested skill
        // must appear as a quoted entry.
        for skill in &filters.skills {
            conditions.push(r#"skills LIKE '%"' || ? || '"%'"#);
            values.push(skill.clone());
        }

        if let Some(max_experience) = filters.max_experience {
            conditions.push("experience <= ?");
            values.push(max_experience.to_string());
        }

        if let Some(days_old) = filters.days_old {
            let cutoff = Utc::now().naive_utc() - chrono::Duration::days(days_old);
            conditions.push("posted_date >= ?");
            values.push(cutoff.to_string());
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let query_str = format!(
            "SELECT {JOB_COLUMNS} FROM jobs{where_clause} \
             ORDER BY (job_url LIKE '%linkedin.com%') ASC, posted_date DESC \
             LIMIT {LIST_LIMIT}"
        );

        debug!("Listing jobs with {} filter conditions", conditions.len());

        let mut query = sqlx::query_as::<_, Job>(&query_str);
        for value in values {
            query = query.bind(value);
        }

        let jobs = query
            .fetch_all(pool)
            .await
            .context("Failed to list jobs")?;

        Ok(jobs)
    }

    /// Apply a partial update. The caller decides whether `vector_id` changes;
    /// it must be updated in the same statement as the description it belongs
    /// to.
    #[inline]
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        update: &JobUpdate,
        vector_id: Option<&str>,
    ) -> Result<Option<Job>> {
        let mut query_parts: Vec<&str> = Vec::new();
        let mut query_values: Vec<String> = Vec::new();

        if let Some(title) = &update.title {
            query_parts.push("title = ?");
            query_values.push(title.clone());
        }

        if let Some(company) = &update.company {
            query_parts.push("company = ?");
            query_values.push(company.clone());
        }

        if let Some(location) = &update.location {
            query_parts.push("location = ?");
            query_values.push(location.clone());
        }

        if let Some(skills) = &update.skills {
            query_parts.push("skills = ?");
            query_values
                .push(serde_json::to_string(skills).context("Failed to serialize skills")?);
        }

        if let Some(experience) = update.experience {
            query_parts.push("experience = ?");
            query_values.push(experience.to_string());
        }

        if let Some(compensation) = &update.compensation {
            query_parts.push("compensation = ?");
            query_values.push(compensation.clone());
        }

        if let Some(company_logo) = &update.company_logo {
            query_parts.push("company_logo = ?");
            query_values.push(company_logo.clone());
        }

        if let Some(applications) = update.applications {
            query_parts.push("applications = ?");
            query_values.push(applications.to_string());
        }

        if let Some(job_url) = &update.job_url {
            query_parts.push("job_url = ?");
            query_values.push(job_url.clone());
        }

        if let Some(description) = &update.description {
            query_parts.push("description = ?");
            query_values.push(description.clone());
        }

        if let Some(vector_id) = vector_id {
            query_parts.push("vector_id = ?");
            query_values.push(vector_id.to_string());
        }

        if query_parts.is_empty() {
            return Self::get_by_id(pool, id).await;
        }

        let query_str = format!("UPDATE jobs SET {} WHERE id = ?", query_parts.join(", "));

        let mut query = sqlx::query(&query_str);
        for value in query_values {
            query = query.bind(value);
        }
        query = query.bind(id);

        query.execute(pool).await.context("Failed to update job")?;

        Self::get_by_id(pool, id).await
    }

    #[inline]
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to delete job")?;

        Ok(result.rows_affected() > 0)
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs")
            .fetch_one(pool)
            .await
            .context("Failed to count jobs")?;

        Ok(count.0)
    }
}
