use crate::error::{ErrorContext, Result};
use crate::types::{Config, UserFinderError};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Keys accepted in the TOML config file. Everything is optional and overrides the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    timeout_secs: Option<u64>,
    rate_limit_secs: Option<f64>,
    concurrency: Option<usize>,
    proxy: Option<String>,
    user_agents: Option<Vec<String>>,
    sites_file: Option<PathBuf>,
    categories: Option<Vec<String>>,
}

/// Build the configuration from defaults, an optional TOML file and `USERFINDER_*` variables.
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let mut config = Config::default();

    if let Some(path_str) = config_path {
        let path = Path::new(path_str);
        if !path.exists() {
            return Err(UserFinderError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        apply_file_config(&mut config, &contents)?;
    }

    apply_env_overrides(&mut config)?;
    validate_config(&config)?;

    Ok(config)
}

fn apply_file_config(config: &mut Config, contents: &str) -> Result<()> {
    let file: FileConfig =
        toml::from_str(contents).with_context(|| "Failed to parse config file".to_string())?;

    if let Some(secs) = file.timeout_secs {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = file.rate_limit_secs {
        config.rate_limit = seconds_to_duration(secs)?;
    }
    if let Some(concurrency) = file.concurrency {
        config.concurrency = concurrency;
    }
    if file.proxy.is_some() {
        config.proxy = file.proxy;
    }
    if let Some(user_agents) = file.user_agents {
        config.user_agents = user_agents;
    }
    if file.sites_file.is_some() {
        config.sites_file = file.sites_file;
    }
    if let Some(categories) = file.categories {
        config.categories = categories;
    }
    Ok(())
}

fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Ok(value) = env::var("USERFINDER_TIMEOUT") {
        let secs: u64 = value
            .trim()
            .parse()
            .with_context(|| format!("Invalid USERFINDER_TIMEOUT '{}'", value))?;
        config.timeout = Duration::from_secs(secs);
    }
    if let Ok(value) = env::var("USERFINDER_RATE_LIMIT") {
        let secs: f64 = value
            .trim()
            .parse()
            .with_context(|| format!("Invalid USERFINDER_RATE_LIMIT '{}'", value))?;
        config.rate_limit = seconds_to_duration(secs)?;
    }
    if let Ok(value) = env::var("USERFINDER_CONCURRENCY") {
        config.concurrency = value
            .trim()
            .parse()
            .with_context(|| format!("Invalid USERFINDER_CONCURRENCY '{}'", value))?;
    }
    if let Ok(proxy) = env::var("USERFINDER_PROXY") {
        if !proxy.trim().is_empty() {
            config.proxy = Some(proxy.trim().to_string());
        }
    }
    Ok(())
}

/// Convert a fractional number of seconds, rejecting negative and non-finite values.
pub fn seconds_to_duration(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .with_context(|| format!("Invalid delay of {} seconds", secs))
}

pub fn validate_config(config: &Config) -> Result<()> {
    if config.timeout.is_zero() {
        return Err(UserFinderError::ConfigError("Timeout must be greater than 0".to_string()));
    }
    if config.concurrency == 0 {
        return Err(UserFinderError::ConfigError("Concurrency must be greater than 0".to_string()));
    }
    if config.user_agents.iter().all(|ua| ua.trim().is_empty()) {
        return Err(UserFinderError::ConfigError("At least one User-Agent is required".to_string()));
    }
    Ok(())
}
