use super::*;
use tempfile::TempDir;

async fn create_test_database() -> (TempDir, Database) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("jobs.db");
    let database = Database::new(&db_path)
        .await
        .expect("Failed to create database");
    (temp_dir, database)
}

#[tokio::test]
async fn initialization_runs_migrations() {
    let (_temp_dir, database) = create_test_database().await;

    // The jobs table exists and is empty after migrations
    let count = database.count_jobs().await.expect("count should succeed");
    assert_eq!(count, 0);
}

#[tokio::test]
async fn insert_and_fetch_round_trip() {
    let (_temp_dir, database) = create_test_database().await;

    let new_job = NewJob {
        title: "Engineer".to_string(),
        company: "Acme".to_string(),
        job_url: "http://x".to_string(),
        description: "build distributed systems".to_string(),
        ..NewJob::default()
    };

    let created = database
        .insert_job(&new_job, "vec-1")
        .await
        .expect("insert should succeed");

    let fetched = database
        .get_job(created.id)
        .await
        .expect("get should succeed")
        .expect("job should exist");

    assert_eq!(fetched, created);
}

#[tokio::test]
async fn initialize_from_config_dir_creates_directories() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let nested = temp_dir.path().join("nested").join("config");

    let database = Database::initialize_from_config_dir(&nested)
        .await
        .expect("initialization should create directories");

    assert!(nested.join("jobs.db").exists());
    assert_eq!(database.count_jobs().await.expect("count"), 0);
}

#[tokio::test]
async fn optimize_succeeds_on_fresh_database() {
    let (_temp_dir, database) = create_test_database().await;
    database.optimize().await.expect("optimize should succeed");
}
