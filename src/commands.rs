//! CLI command implementations.
//!
//! Each command wires the configured stores and provider client together,
//! runs one operation, and prints the result. Records are printed as pretty
//! JSON so output can be piped into `jq`.

use anyhow::{Context, Result, bail};
use console::style;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::database::lancedb::vector_store::VectorStore;
use crate::database::sqlite::Database;
use crate::database::sqlite::models::{JobFilters, JobUpdate, NewJob};
use crate::embeddings::openai::OpenAiClient;
use crate::jobs::JobService;
use crate::search::SimilaritySearch;

struct AppContext {
    config: Config,
    service: JobService,
    search: SimilaritySearch,
}

async fn init_context() -> Result<AppContext> {
    let config = Config::load().context("Failed to load configuration")?;

    let database = Database::new(config.database_path())
        .await
        .context("Failed to open job database")?;

    let embedder = Arc::new(OpenAiClient::new(&config)?);
    let index = Arc::new(VectorStore::new(&config).await?);

    let service = JobService::new(
        database.clone(),
        Arc::clone(&embedder) as _,
        Arc::clone(&index) as _,
    );
    let search = SimilaritySearch::new(database, embedder, index, &config);

    Ok(AppContext {
        config,
        service,
        search,
    })
}

fn print_record<T: serde::Serialize>(record: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(record).context("Failed to serialize record")?;
    println!("{json}");
    Ok(())
}

#[inline]
pub async fn add_job(new_job: NewJob) -> Result<()> {
    let ctx = init_context().await?;

    let job = ctx.service.create_job(new_job).await?;

    eprintln!(
        "{} job {} ({})",
        style("✓ Added").green(),
        style(job.id).cyan(),
        job.title
    );
    print_record(&job)
}

#[inline]
pub async fn get_job(id: i64) -> Result<()> {
    let ctx = init_context().await?;

    let job = ctx.service.get_job(id).await?;
    print_record(&job)
}

#[inline]
pub async fn list_jobs(filters: JobFilters) -> Result<()> {
    let ctx = init_context().await?;

    let jobs = ctx.service.list_jobs(&filters).await?;

    if jobs.is_empty() {
        eprintln!("{}", style("No jobs match the given filters.").yellow());
        return Ok(());
    }

    eprintln!("{} {} job(s)", style("Found").green(), jobs.len());
    print_record(&jobs)
}

#[inline]
pub async fn update_job(id: i64, update: JobUpdate) -> Result<()> {
    if update.is_empty() {
        bail!("No fields to update; pass at least one field flag");
    }

    let ctx = init_context().await?;

    let job = ctx.service.update_job(id, update).await?;

    eprintln!("{} job {}", style("✓ Updated").green(), style(job.id).cyan());
    print_record(&job)
}

#[inline]
pub async fn delete_job(id: i64) -> Result<()> {
    let ctx = init_context().await?;

    let job = ctx.service.delete_job(id).await?;

    eprintln!(
        "{} job {} ({})",
        style("✓ Deleted").green(),
        style(job.id).cyan(),
        job.title
    );
    Ok(())
}

/// Find stored jobs similar to a resume or free-form query text.
#[inline]
pub async fn match_jobs(
    text: Option<String>,
    file: Option<PathBuf>,
    limit: Option<usize>,
) -> Result<()> {
    let query = match (text, file) {
        (Some(text), None) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read query file: {}", path.display()))?,
        (Some(_), Some(_)) => bail!("Pass either --text or --file, not both"),
        (None, None) => bail!("Pass the query as --text or --file"),
    };

    let ctx = init_context().await?;
    let limit = limit.unwrap_or(ctx.config.search.default_limit);

    info!("Matching against stored jobs (limit {})", limit);
    let results = ctx.search.find_similar(&query, limit).await?;

    if results.is_empty() {
        eprintln!("{}", style("No similar jobs found.").yellow());
        return Ok(());
    }

    eprintln!("{} {} match(es)", style("Found").green(), results.len());
    print_record(&results)
}

/// Report configuration, store counts, and provider reachability.
#[inline]
pub async fn status() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    eprintln!("{}", style("📊 Jobmatch Status").bold().cyan());
    eprintln!();
    eprintln!("Config file:     {}", config.config_file_path().display());
    eprintln!("Job database:    {}", config.database_path().display());
    eprintln!("Vector store:    {}", config.vector_database_path().display());
    eprintln!(
        "Embedding model: {} ({} dimensions)",
        config.openai.model, config.openai.dimensions
    );
    eprintln!();

    let database = Database::new(config.database_path())
        .await
        .context("Failed to open job database")?;
    let job_count = database.count_jobs().await?;
    eprintln!("Jobs stored:     {}", style(job_count).cyan());

    let store = VectorStore::new(&config).await?;
    let embedding_count = store.count_embeddings().await?;
    eprintln!("Vectors stored:  {}", style(embedding_count).cyan());

    if embedding_count != job_count as u64 {
        eprintln!(
            "{}",
            style("⚠ Job and vector counts differ; the index may hold stale entries").yellow()
        );
    }

    eprintln!();
    match OpenAiClient::new(&config) {
        Ok(client) => match client.health_check() {
            Ok(()) => eprintln!("Provider:        {}", style("reachable, model available").green()),
            Err(e) => eprintln!("Provider:        {}", style(format!("unavailable ({e})")).red()),
        },
        Err(e) => eprintln!("Provider:        {}", style(format!("not configured ({e})")).red()),
    }

    Ok(())
}

/// Compact both stores.
#[inline]
pub async fn optimize() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    let database = Database::new(config.database_path())
        .await
        .context("Failed to open job database")?;
    database.optimize().await?;

    let store = VectorStore::new(&config).await?;
    store.optimize().await?;

    eprintln!("{}", style("✓ Stores optimized").green());
    Ok(())
}
