// Configuration management module
// Handles TOML configuration management and settings

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{Config, ConfigError, OpenAiConfig, SearchConfig};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("jobmatch"))
        .ok_or(ConfigError::DirectoryError)
}
