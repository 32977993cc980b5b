
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// A persisted job posting.
///
/// `vector_id` is the handle to the embedding record in the vector store. It
/// is internal plumbing and never serialized into caller-facing payloads, so
/// no response ever carries the raw embedding or a way to fetch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub skills: Json<Vec<String>>,
    pub experience: i64,
    pub compensation: Option<String>,
    pub company_logo: Option<String>,
    pub applications: Option<i64>,
    pub job_url: String,
    pub posted_date: NaiveDateTime,
    pub description: String,
    #[serde(skip_serializing)]
    pub vector_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: i64,
    pub compensation: Option<String>,
    pub company_logo: Option<String>,
    pub applications: Option<i64>,
    pub job_url: String,
    pub description: String,
}

/// Partial update to an existing job. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct JobUpdate {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience: Option<i64>,
    pub compensation: Option<String>,
    pub company_logo: Option<String>,
    pub applications: Option<i64>,
    pub job_url: Option<String>,
    pub description: Option<String>,
}

/// Attribute filters for listing jobs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobFilters {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub skills: Vec<String>,
    pub max_experience: Option<i64>,
    pub days_old: Option<i64>,
}

impl Job {
    #[inline]
    pub fn skills(&self) -> &[String] {
        &self.skills.0
    }
}

impl JobUpdate {
    #[inline]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl JobFilters {
    #[inline]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
