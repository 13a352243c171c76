// src/types.rs
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub timeout: Duration,
    /// Minimum spacing between two request dispatches.
    pub rate_limit: Duration,
    /// Maximum number of requests in flight at once.
    pub concurrency: usize,
    pub user_agents: Vec<String>,
    pub proxy: Option<String>,
    pub sites_file: Option<PathBuf>,
    pub categories: Vec<String>,
    pub site_names: Vec<String>,
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            rate_limit: Duration::from_millis(500),
            concurrency: 20,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
            proxy: None,
            sites_file: None,
            categories: Vec::new(),
            site_names: Vec::new(),
            output: OutputConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub export: Option<ExportFormat>,
    pub export_dir: Option<PathBuf>,
    pub show_all: bool,
    pub silent: bool,
    pub progress: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Table,
            export: None,
            export_dir: None,
            show_all: false,
            silent: false,
            progress: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Txt,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DetectionType {
    StatusCode,
    MessageBody,
}

/// One platform entry from the sites catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    pub url_template: String,
    pub detection_type: DetectionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_check: Option<String>,
    #[serde(skip)]
    pub username_pattern: Option<Regex>,
}

impl Site {
    pub fn new(name: &str, url_template: &str, detection_type: DetectionType) -> Self {
        Self {
            name: name.to_string(),
            url_template: url_template.to_string(),
            detection_type,
            error_message: None,
            category: None,
            regex_check: None,
            username_pattern: None,
        }
    }

    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = Some(message.to_string());
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    /// Whether the site accepts this username format. Sites without a pattern accept anything.
    pub fn accepts_username(&self, username: &str) -> bool {
        self.username_pattern
            .as_ref()
            .map_or(true, |re| re.is_match(username))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    Found,
    NotFound,
    Unknown,
    Error,
}

impl ProbeStatus {
    /// Unknown and error outcomes both land in the error bucket.
    pub fn is_error(&self) -> bool {
        matches!(self, ProbeStatus::Unknown | ProbeStatus::Error)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    pub site: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub status: ProbeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl ProbeResult {
    pub fn new(site: &Site, url: String, status: ProbeStatus) -> Self {
        Self {
            site: site.name.clone(),
            url,
            category: site.category.clone(),
            status,
            http_status: None,
            error: None,
            elapsed_ms: 0,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScanStats {
    pub total_sites: usize,
    pub found: usize,
    pub not_found: usize,
    pub errors: usize,
    pub duration: Duration,
}

impl ScanStats {
    pub fn from_results(results: &[ProbeResult], duration: Duration) -> Self {
        let mut stats = Self {
            total_sites: results.len(),
            duration,
            ..Default::default()
        };
        for result in results {
            match result.status {
                ProbeStatus::Found => stats.found += 1,
                ProbeStatus::NotFound => stats.not_found += 1,
                ProbeStatus::Unknown | ProbeStatus::Error => stats.errors += 1,
            }
        }
        stats
    }

    pub fn absorb(&mut self, other: &ScanStats) {
        self.total_sites += other.total_sites;
        self.found += other.found;
        self.not_found += other.not_found;
        self.errors += other.errors;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub username: String,
    pub results: Vec<ProbeResult>,
    pub stats: ScanStats,
    pub timestamp: String,
}

impl ScanReport {
    pub fn found(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter().filter(|r| r.status == ProbeStatus::Found)
    }

    pub fn not_found(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter().filter(|r| r.status == ProbeStatus::NotFound)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter().filter(|r| r.status.is_error())
    }
}

#[derive(Debug, Error)]
pub enum UserFinderError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Catalog error: {0}")]
    CatalogError(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    OutputError(String),

    #[error("Unknown error: {0}")]
    Unknown(#[from] anyhow::Error),
}
