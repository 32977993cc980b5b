use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use jobmatch::commands;
use jobmatch::config::interactive::{run_interactive_config, show_config};
use jobmatch::database::sqlite::models::{JobFilters, JobUpdate, NewJob};

#[derive(Parser)]
#[command(name = "jobmatch")]
#[command(about = "Job posting store with embedding-based similarity matching")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedding provider and search settings
    Config {
        /// Show the current configuration instead of editing it
        #[arg(long)]
        show: bool,
    },
    /// Add a job posting (its description is embedded on the way in)
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        company: String,
        #[arg(long)]
        location: Option<String>,
        /// Required skill; repeat the flag for several
        #[arg(long = "skill")]
        skills: Vec<String>,
        /// Years of experience required
        #[arg(long, default_value_t = 0)]
        experience: i64,
        #[arg(long)]
        compensation: Option<String>,
        #[arg(long)]
        company_logo: Option<String>,
        #[arg(long)]
        applications: Option<i64>,
        #[arg(long)]
        job_url: String,
        #[arg(long)]
        description: String,
    },
    /// Fetch one job by id
    Get {
        id: i64,
    },
    /// List jobs, optionally filtered by attributes
    List {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// Required skill; repeat the flag for several
        #[arg(long = "skill")]
        skills: Vec<String>,
        /// Only jobs requiring at most this many years of experience
        #[arg(long)]
        max_experience: Option<i64>,
        /// Only jobs posted within the last N days
        #[arg(long)]
        days_old: Option<i64>,
    },
    /// Update fields of an existing job
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// Replacement skill list; repeat the flag for several
        #[arg(long = "skill")]
        skills: Option<Vec<String>>,
        #[arg(long)]
        experience: Option<i64>,
        #[arg(long)]
        compensation: Option<String>,
        #[arg(long)]
        company_logo: Option<String>,
        #[arg(long)]
        applications: Option<i64>,
        #[arg(long)]
        job_url: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a job and its embedding
    Delete {
        id: i64,
    },
    /// Find stored jobs similar to a resume or query text
    Match {
        /// Query text given inline
        #[arg(long)]
        text: Option<String>,
        /// Read the query text from a file
        #[arg(long)]
        file: Option<PathBuf>,
        /// Maximum number of matches to return
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show store counts and provider reachability
    Status,
    /// Compact the job database and vector store
    Optimize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Add {
            title,
            company,
            location,
            skills,
            experience,
            compensation,
            company_logo,
            applications,
            job_url,
            description,
        } => {
            commands::add_job(NewJob {
                title,
                company,
                location,
                skills,
                experience,
                compensation,
                company_logo,
                applications,
                job_url,
                description,
            })
            .await?;
        }
        Commands::Get { id } => {
            commands::get_job(id).await?;
        }
        Commands::List {
            title,
            company,
            location,
            skills,
            max_experience,
            days_old,
        } => {
            commands::list_jobs(JobFilters {
                title,
                company,
                location,
                skills,
                max_experience,
                days_old,
            })
            .await?;
        }
        Commands::Update {
            id,
            title,
            company,
            location,
            skills,
            experience,
            compensation,
            company_logo,
            applications,
            job_url,
            description,
        } => {
            commands::update_job(
                id,
                JobUpdate {
                    title,
                    company,
                    location,
                    skills,
                    experience,
                    compensation,
                    company_logo,
                    applications,
                    job_url,
                    description,
                },
            )
            .await?;
        }
        Commands::Delete { id } => {
            commands::delete_job(id).await?;
        }
        Commands::Match { text, file, limit } => {
            commands::match_jobs(text, file, limit).await?;
        }
        Commands::Status => {
            commands::status().await?;
        }
        Commands::Optimize => {
            commands::optimize().await?;
        }
    }

    Ok(())
}
