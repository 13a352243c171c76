use crate::types::ExportFormat;
use clap::Parser;
use std::path::PathBuf;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_TIME"),
    ")"
);

#[derive(Parser, Debug, Clone)]
#[command(
    name = "userfinder",
    version,
    long_version = LONG_VERSION,
    about = "Check whether a username exists across web platforms",
    long_about = "userfinder sends one HTTP request per platform from a sites catalog and reports\nwhere a username is registered. Results are heuristic: a site may change its pages at any time.",
    after_help = "Examples:\n  userfinder johndoe\n  userfinder johndoe --export json\n  userfinder johndoe --timeout 15 --rate-limit 1.0\n  cat names.txt | userfinder --silent"
)]
pub struct Args {
    /// Username(s) to search for
    #[arg(value_name = "USERNAME")]
    pub usernames: Vec<String>,

    /// File containing one username per line
    #[arg(short = 'l', long = "list", value_name = "FILE")]
    pub usernames_file: Option<PathBuf>,

    /// Sites catalog (JSON). Defaults to ./sites.json, then the builtin catalog
    #[arg(short = 's', long = "sites", value_name = "FILE")]
    pub sites_file: Option<PathBuf>,

    /// Configuration file path (TOML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_path: Option<String>,

    /// Request timeout in seconds [default: 10]
    #[arg(short = 't', long = "timeout", value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Minimum delay between request dispatches in seconds [default: 0.5]
    #[arg(short = 'r', long = "rate-limit", value_name = "SECS")]
    pub rate_limit: Option<f64>,

    /// Maximum number of requests in flight [default: 20]
    #[arg(short = 'j', long = "concurrency", value_name = "N")]
    pub concurrency: Option<usize>,

    /// Only check sites in these categories (comma-separated)
    #[arg(long = "category", value_delimiter = ',')]
    pub categories: Vec<String>,

    /// Only check these sites by name (comma-separated)
    #[arg(long = "site", value_delimiter = ',')]
    pub site_names: Vec<String>,

    /// Export results to a file
    #[arg(short = 'e', long = "export", value_enum)]
    pub export: Option<ExportFormat>,

    /// Directory for exported files
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print the full report as JSON
    #[arg(long = "json")]
    pub json: bool,

    /// Also list sites where the username was not found or the check failed
    #[arg(short = 'a', long = "all")]
    pub all: bool,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Silent mode (only print found URLs)
    #[arg(long = "silent")]
    pub silent: bool,

    /// Verbose mode
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// List the sites in the catalog and exit
    #[arg(long = "list-sites")]
    pub list_sites: bool,

    /// HTTP or SOCKS proxy URL
    #[arg(long = "proxy", value_name = "URL")]
    pub proxy: Option<String>,
}

impl Args {
    /// Check if we should read usernames from stdin
    pub fn use_stdin(&self) -> bool {
        self.usernames.is_empty() && self.usernames_file.is_none() && !atty::is(atty::Stream::Stdin)
    }
}
