// src/session.rs
use crate::types::{Config, UserFinderError, DEFAULT_USER_AGENTS};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::Client;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

pub const MAX_REDIRECTS: usize = 10;

#[derive(Clone)]
pub struct Session {
    pub client: Client,
    user_agents: Arc<Vec<String>>,
}

impl Session {
    pub fn new(config: &Config) -> Result<Self, UserFinderError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let mut client_builder = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(Duration::from_secs(10)))
            .default_headers(headers)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .gzip(true)
            .deflate(true)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(config.concurrency.min(20));

        if let Some(proxy_url) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| UserFinderError::ConfigError(format!("Invalid proxy URL: {}", e)))?;
            client_builder = client_builder.proxy(proxy);
        }

        let client = client_builder
            .build()
            .map_err(|e| UserFinderError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        let user_agents: Vec<String> = config
            .user_agents
            .iter()
            .map(|ua| ua.trim().to_string())
            .filter(|ua| !ua.is_empty())
            .collect();

        Ok(Session {
            client,
            user_agents: Arc::new(user_agents),
        })
    }

    /// A User-Agent picked at random from the configured pool.
    pub fn random_user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(DEFAULT_USER_AGENTS[0])
    }

    pub async fn get(&self, url: &str) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .get(url)
            .header(USER_AGENT, self.random_user_agent())
            .send()
            .await
    }
}

/// Limiter that spaces consecutive dispatches at least `delay` apart.
/// A zero delay disables pacing entirely.
pub fn dispatch_limiter(delay: Duration) -> Option<Arc<DefaultDirectRateLimiter>> {
    Quota::with_period(delay)
        .map(|quota| Arc::new(RateLimiter::direct(quota.allow_burst(NonZeroU32::MIN))))
}
