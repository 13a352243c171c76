use crate::catalog;
use crate::cli::Args;
use crate::config;
use crate::output::OutputManager;
use crate::probe::{HttpProber, Prober};
use crate::session::{dispatch_limiter, Session};
use crate::types::{
    Config, OutputFormat, ProbeResult, ProbeStatus, ScanReport, ScanStats, Site, UserFinderError,
};
use crate::utils::{render_url, validate_username};
use futures::stream::{FuturesUnordered, StreamExt};
use governor::DefaultDirectRateLimiter;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

pub struct UserFinderEngine {
    config: Config,
    sites: Vec<Site>,
    prober: Arc<dyn Prober>,
    output_manager: OutputManager,
}

impl UserFinderEngine {
    pub async fn new(args: &Args) -> Result<Self, UserFinderError> {
        let config = Self::config_from_args(args)?;
        let sites = catalog::resolve_sites(&config)?;
        let session = Session::new(&config)?;
        let prober: Arc<dyn Prober> = Arc::new(HttpProber::new(session));

        Ok(Self::with_prober(config, sites, prober))
    }

    /// Load file and environment settings, then apply command line flags on top.
    pub fn config_from_args(args: &Args) -> Result<Config, UserFinderError> {
        let mut config = config::load_config(args.config_path.as_deref())?;

        // Command line flags win over file and environment settings
        if let Some(sites) = &args.sites_file {
            config.sites_file = Some(sites.clone());
        }
        if let Some(secs) = args.timeout {
            config.timeout = std::time::Duration::from_secs(secs);
        }
        if let Some(secs) = args.rate_limit {
            config.rate_limit = config::seconds_to_duration(secs)?;
        }
        if let Some(concurrency) = args.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(proxy) = &args.proxy {
            config.proxy = Some(proxy.clone());
        }
        if !args.categories.is_empty() {
            config.categories = args.categories.clone();
        }
        if !args.site_names.is_empty() {
            config.site_names = args.site_names.clone();
        }
        if args.json {
            config.output.format = OutputFormat::Json;
        }
        config.output.export = args.export;
        config.output.export_dir = args.output_dir.clone();
        config.output.show_all = args.all;
        config.output.silent = args.silent;
        config.output.progress = !args.silent && !args.json;

        config::validate_config(&config)?;
        Ok(config)
    }

    /// Assemble an engine from already-resolved parts.
    pub fn with_prober(config: Config, sites: Vec<Site>, prober: Arc<dyn Prober>) -> Self {
        let output_manager = OutputManager::new(config.output.clone());
        Self {
            config,
            sites,
            prober,
            output_manager,
        }
    }

    /// Scan every username in order, printing and exporting each report.
    pub async fn run(&self, usernames: Vec<String>) -> Result<ScanStats, UserFinderError> {
        if usernames.is_empty() {
            return Err(UserFinderError::ConfigError("No usernames provided".to_string()));
        }

        info!(
            "Checking {} username(s) against {} sites",
            usernames.len(),
            self.sites.len()
        );
        let start_time = Instant::now();
        let mut totals = ScanStats::default();

        for username in usernames {
            match self.scan_username(&username).await {
                Ok(report) => {
                    totals.absorb(&report.stats);
                    self.output_manager.write_report(&report)?;
                    info!(
                        "Completed {}: found on {} of {} sites",
                        report.username, report.stats.found, report.stats.total_sites
                    );
                }
                Err(e @ UserFinderError::InvalidUsername(_)) => {
                    warn!("Skipping username: {}", e);
                }
                Err(e) => {
                    error!("Failed to scan {}: {}", username, e);
                    return Err(e);
                }
            }
        }

        totals.duration = start_time.elapsed();
        Ok(totals)
    }

    /// Probe every site for one username under the concurrency cap and dispatch pacing.
    pub async fn scan_username(&self, username: &str) -> Result<ScanReport, UserFinderError> {
        let username = validate_username(username)?;
        info!("Scanning username: {}", username);

        let start_time = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let limiter = dispatch_limiter(self.config.rate_limit);
        let progress = self.progress_bar(self.sites.len() as u64);

        let mut results = Vec::with_capacity(self.sites.len());
        {
            let mut futures: FuturesUnordered<_> = self
                .sites
                .iter()
                .map(|site| {
                    probe_with_limits(
                        Arc::clone(&self.prober),
                        Arc::clone(&semaphore),
                        limiter.clone(),
                        site,
                        &username,
                    )
                })
                .collect();

            while let Some(result) = futures.next().await {
                if result.status == ProbeStatus::Found {
                    progress.println(format!("[+] {}: {}", result.site, result.url));
                }
                progress.inc(1);
                results.push(result);
            }
        }
        progress.finish_and_clear();

        results.sort_by_cached_key(|r| r.site.to_lowercase());
        let stats = ScanStats::from_results(&results, start_time.elapsed());

        Ok(ScanReport {
            username,
            results,
            stats,
            timestamp: chrono::Utc::now().to_rfc3339(),
        })
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.config.output.progress || self.config.output.format == OutputFormat::Json {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} Checking sites [{bar:30.cyan/blue}] {pos}/{len} ({percent}%)",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
        bar.set_style(style);
        bar
    }
}

/// Hold a concurrency permit for the whole check, and wait for the dispatch slot once holding it.
async fn probe_with_limits(
    prober: Arc<dyn Prober>,
    semaphore: Arc<Semaphore>,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
    site: &Site,
    username: &str,
) -> ProbeResult {
    let _permit = match semaphore.acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => {
            return ProbeResult::new(site, render_url(&site.url_template, username), ProbeStatus::Error)
                .with_error(format!("Failed to acquire semaphore: {}", e));
        }
    };

    if let Some(limiter) = limiter {
        limiter.until_ready().await;
    }

    prober.probe(site, username).await
}
