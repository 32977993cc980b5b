use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input};

use super::{Config, OpenAiConfig, SearchConfig, settings::API_KEY_ENV};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔧 Jobmatch Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Embedding Provider").bold().yellow());
    eprintln!("Configure the OpenAI embeddings endpoint used for job descriptions.");
    eprintln!(
        "The API key itself is read from the {} environment variable.",
        style(API_KEY_ENV).cyan()
    );
    eprintln!();

    configure_openai(&mut config.openai)?;

    eprintln!();
    eprintln!("{}", style("Similarity Search").bold().yellow());
    configure_search(&mut config.search)?;

    eprintln!();
    if config.openai.api_key().is_err() {
        eprintln!(
            "{}",
            style(format!("⚠ Warning: {} is not set", API_KEY_ENV)).yellow()
        );
        eprintln!("You can continue, but embedding calls will fail until it is exported.");
        eprintln!();
    }

    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("OpenAI Settings:").bold().yellow());
    eprintln!("  API Base: {}", style(&config.openai.api_base).cyan());
    eprintln!("  Model: {}", style(&config.openai.model).cyan());
    eprintln!("  Dimensions: {}", style(config.openai.dimensions).cyan());
    eprintln!(
        "  API Key: {}",
        if config.openai.api_key().is_ok() {
            style("set").green()
        } else {
            style("not set").red()
        }
    );

    eprintln!();
    eprintln!("{}", style("Search Settings:").bold().yellow());
    eprintln!(
        "  Candidate Multiplier: {}",
        style(config.search.candidate_multiplier).cyan()
    );
    eprintln!(
        "  Default Result Limit: {}",
        style(config.search.default_limit).cyan()
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    Config::load().map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Ok(Config::default())
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_openai(openai: &mut OpenAiConfig) -> Result<()> {
    let api_base: String = Input::new()
        .with_prompt("API base URL")
        .default(openai.api_base.clone())
        .interact_text()?;
    openai
        .set_api_base(api_base)
        .context("Invalid API base URL")?;

    let model: String = Input::new()
        .with_prompt("Embedding model")
        .default(openai.model.clone())
        .interact_text()?;
    openai.set_model(model).context("Invalid model name")?;

    let dimensions: u32 = Input::new()
        .with_prompt("Embedding dimensions")
        .default(openai.dimensions)
        .interact_text()?;
    openai
        .set_dimensions(dimensions)
        .context("Invalid embedding dimensions")?;

    Ok(())
}

fn configure_search(search: &mut SearchConfig) -> Result<()> {
    let multiplier: u32 = Input::new()
        .with_prompt("Candidate over-fetch multiplier")
        .default(search.candidate_multiplier)
        .interact_text()?;
    search
        .set_candidate_multiplier(multiplier)
        .context("Invalid candidate multiplier")?;

    let limit: usize = Input::new()
        .with_prompt("Default result limit")
        .default(search.default_limit)
        .interact_text()?;
    search
        .set_default_limit(limit)
        .context("Invalid result limit")?;

    Ok(())
}
