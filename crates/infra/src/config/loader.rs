//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables (`.env` files are
//!    honored via dotenvy)
//! 2. If incomplete, falls back to loading from file
//! 3. Probes `./config.toml` and `./rootline.toml`
//!
//! ## Environment Variables
//! - `ROOTLINE_API_URL`: Base URL of the tree service
//! - `ROOTLINE_USERNAME`: Username for the token endpoint
//! - `ROOTLINE_PASSWORD`: Password for the token endpoint
//! - `ROOTLINE_TREE_ID`: Default family tree identifier
//! - `ROOTLINE_TASK_TIMEOUT_SECS`: Optional task polling budget

use std::path::{Path, PathBuf};

use rootline_domain::{Config, PollingConfig, Result, RootlineError, ServiceConfig};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `RootlineError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    dotenvy::dotenv().ok();

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// All required environment variables must be present. Returns an error
/// if any are missing.
///
/// # Errors
/// Returns `RootlineError::Config` if required variables are missing or
/// have invalid values.
pub fn load_from_env() -> Result<Config> {
    let api_url = env_var("ROOTLINE_API_URL")?;
    let username = env_var("ROOTLINE_USERNAME")?;
    let password = env_var("ROOTLINE_PASSWORD")?;
    let tree_id = env_var("ROOTLINE_TREE_ID")?;

    let polling = match std::env::var("ROOTLINE_TASK_TIMEOUT_SECS") {
        Ok(raw) => {
            let task_timeout_secs = raw.parse::<u64>().map_err(|e| {
                RootlineError::Config(format!("Invalid task timeout: {e}"))
            })?;
            PollingConfig { task_timeout_secs }
        }
        Err(_) => PollingConfig::default(),
    };

    Ok(Config {
        service: ServiceConfig { api_url, username, password, tree_id },
        polling,
    })
}

/// Load configuration from a TOML file
///
/// When no path is given, probes `./config.toml` then `./rootline.toml`.
///
/// # Errors
/// Returns `RootlineError::Config` when no file is found or the file does
/// not parse.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let path = match path {
        Some(path) => path,
        None => probe_default_paths()
            .ok_or_else(|| RootlineError::Config("No configuration file found".to_string()))?,
    };

    let contents = std::fs::read_to_string(&path).map_err(|e| {
        RootlineError::Config(format!("Failed to read {}: {e}", path.display()))
    })?;

    let config: Config = toml::from_str(&contents).map_err(|e| {
        RootlineError::Config(format!("Invalid configuration in {}: {e}", path.display()))
    })?;

    tracing::info!(path = %path.display(), "Configuration loaded from file");
    Ok(config)
}

fn probe_default_paths() -> Option<PathBuf> {
    ["config.toml", "rootline.toml"]
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| RootlineError::Config(format!("Missing required environment variable: {name}")))
}
