// src/probe.rs
use crate::session::Session;
use crate::types::{DetectionType, ProbeResult, ProbeStatus, Site};
use crate::utils::render_url;
use async_trait::async_trait;
use log::debug;
use std::time::Instant;

/// Checks a single site for a username. Failures are folded into the returned result.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, site: &Site, username: &str) -> ProbeResult;
}

/// Turn an HTTP status (and, for body detection, the page text) into an outcome.
pub fn classify(site: &Site, http_status: u16, body: Option<&str>) -> (ProbeStatus, Option<String>) {
    match site.detection_type {
        DetectionType::StatusCode => match http_status {
            200 => (ProbeStatus::Found, None),
            404 => (ProbeStatus::NotFound, None),
            other => (ProbeStatus::Unknown, Some(format!("Unexpected status: {}", other))),
        },
        DetectionType::MessageBody => match http_status {
            200 => {
                let marker = site
                    .error_message
                    .as_deref()
                    .map(str::trim)
                    .filter(|m| !m.is_empty());
                match (marker, body) {
                    (Some(marker), Some(body))
                        if body.to_lowercase().contains(&marker.to_lowercase()) =>
                    {
                        (ProbeStatus::NotFound, None)
                    }
                    _ => (ProbeStatus::Found, None),
                }
            }
            404 => (ProbeStatus::NotFound, None),
            other => (ProbeStatus::Unknown, Some(format!("Status: {}", other))),
        },
    }
}

/// Short, stable description of a transport failure.
pub fn describe_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "Timeout".to_string()
    } else if err.is_connect() {
        "Connection failed".to_string()
    } else if err.is_redirect() {
        "Too many redirects".to_string()
    } else if err.is_body() || err.is_decode() {
        format!("Failed to read response body: {}", err)
    } else {
        err.to_string()
    }
}

#[derive(Clone)]
pub struct HttpProber {
    session: Session,
}

impl HttpProber {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, site: &Site, username: &str) -> ProbeResult {
        let url = render_url(&site.url_template, username);

        if !site.accepts_username(username) {
            return ProbeResult::new(site, url, ProbeStatus::NotFound)
                .with_error("Username format not accepted by site");
        }

        let start = Instant::now();
        let mut result = match self.session.get(&url).await {
            Ok(response) => {
                let http_status = response.status().as_u16();
                let body = match site.detection_type {
                    DetectionType::MessageBody if http_status == 200 => {
                        match response.text().await {
                            Ok(text) => Some(text),
                            Err(e) => {
                                let mut failed = ProbeResult::new(site, url, ProbeStatus::Error)
                                    .with_error(describe_error(&e));
                                failed.http_status = Some(http_status);
                                failed.elapsed_ms = start.elapsed().as_millis() as u64;
                                return failed;
                            }
                        }
                    }
                    _ => None,
                };

                let (status, error) = classify(site, http_status, body.as_deref());
                let mut result = ProbeResult::new(site, url, status);
                result.http_status = Some(http_status);
                result.error = error;
                result
            }
            Err(e) => ProbeResult::new(site, url, ProbeStatus::Error).with_error(describe_error(&e)),
        };
        result.elapsed_ms = start.elapsed().as_millis() as u64;

        debug!(
            "{}: {:?} in {}ms{}",
            site.name,
            result.status,
            result.elapsed_ms,
            result.error.as_deref().map(|e| format!(" ({})", e)).unwrap_or_default()
        );
        result
    }
}
