// src/catalog.rs
use crate::error::{ErrorContext, Result};
use crate::types::{Config, DetectionType, Site, UserFinderError};
use crate::utils::{render_url, USERNAME_PLACEHOLDER};
use log::{debug, info, warn};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use url::Url;

const BUILTIN_SITES: &str = include_str!("../sites.json");
const LOCAL_SITES_FILE: &str = "sites.json";

#[derive(Deserialize)]
#[serde(untagged)]
enum SitesDocument {
    Wrapped { sites: Vec<Site> },
    Bare(Vec<Site>),
}

/// Load and validate a sites catalog from disk.
pub fn load_sites(path: &Path) -> Result<Vec<Site>> {
    let contents = fs::read_to_string(path)
        .with_catalog_context(|| format!("Failed to read {}", path.display()))?;
    let sites = parse_sites(&contents)
        .map_err(|e| UserFinderError::CatalogError(format!("{}: {}", path.display(), e)))?;
    info!("Loaded {} sites from {}", sites.len(), path.display());
    Ok(sites)
}

pub fn parse_sites(contents: &str) -> Result<Vec<Site>> {
    let document: SitesDocument = serde_json::from_str(contents)
        .with_catalog_context(|| "Invalid sites JSON".to_string())?;
    let raw = match document {
        SitesDocument::Wrapped { sites } => sites,
        SitesDocument::Bare(sites) => sites,
    };
    validate_sites(raw)
}

/// The catalog compiled into the binary.
pub fn builtin_sites() -> Result<Vec<Site>> {
    parse_sites(BUILTIN_SITES)
}

/// Pick the catalog for this run: explicit file, then `./sites.json`, then the builtin list.
pub fn resolve_sites(config: &Config) -> Result<Vec<Site>> {
    let sites = match &config.sites_file {
        Some(path) => {
            if !path.exists() {
                return Err(UserFinderError::CatalogError(format!(
                    "Sites file not found: {}",
                    path.display()
                )));
            }
            load_sites(path)?
        }
        None if Path::new(LOCAL_SITES_FILE).exists() => load_sites(Path::new(LOCAL_SITES_FILE))?,
        None => {
            debug!("Using builtin sites catalog");
            builtin_sites()?
        }
    };

    filter_sites(sites, &config.categories, &config.site_names)
}

/// Keep sites matching any of the categories and any of the names. Empty filters keep everything.
pub fn filter_sites(sites: Vec<Site>, categories: &[String], names: &[String]) -> Result<Vec<Site>> {
    if categories.is_empty() && names.is_empty() {
        return Ok(sites);
    }

    let selected: Vec<Site> = sites
        .into_iter()
        .filter(|site| {
            categories.is_empty()
                || site
                    .category
                    .as_deref()
                    .map_or(false, |c| categories.iter().any(|f| f.eq_ignore_ascii_case(c)))
        })
        .filter(|site| names.is_empty() || names.iter().any(|n| n.eq_ignore_ascii_case(&site.name)))
        .collect();

    if selected.is_empty() {
        return Err(UserFinderError::ConfigError(
            "No sites match the requested categories/names".to_string(),
        ));
    }
    Ok(selected)
}

fn validate_sites(raw: Vec<Site>) -> Result<Vec<Site>> {
    let mut seen = HashSet::new();
    let mut sites = Vec::with_capacity(raw.len());

    for mut site in raw {
        site.name = site.name.trim().to_string();
        if site.name.is_empty() {
            return Err(UserFinderError::CatalogError("Site with empty name".to_string()));
        }
        if !seen.insert(site.name.to_lowercase()) {
            warn!("Duplicate site '{}' ignored", site.name);
            continue;
        }

        validate_template(&site)?;

        if site.detection_type == DetectionType::MessageBody
            && site.error_message.as_deref().map_or(true, |m| m.trim().is_empty())
        {
            warn!(
                "{}: message_body detection without error_message, every 200 counts as found",
                site.name
            );
        }

        if let Some(pattern) = &site.regex_check {
            let re = Regex::new(pattern)
                .with_catalog_context(|| format!("{}: invalid regex_check", site.name))?;
            site.username_pattern = Some(re);
        }

        sites.push(site);
    }

    Ok(sites)
}

fn validate_template(site: &Site) -> Result<()> {
    if !site.url_template.contains(USERNAME_PLACEHOLDER) {
        return Err(UserFinderError::CatalogError(format!(
            "{}: url_template is missing {}",
            site.name, USERNAME_PLACEHOLDER
        )));
    }

    let sample = render_url(&site.url_template, "username");
    let url = Url::parse(&sample)
        .with_catalog_context(|| format!("{}: invalid url_template", site.name))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UserFinderError::CatalogError(format!(
            "{}: unsupported scheme '{}'",
            site.name,
            url.scheme()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "sites": [
            {"name": "GitHub", "url_template": "https://github.com/{username}", "detection_type": "status_code", "category": "development"},
            {"name": "Steam", "url_template": "https://steamcommunity.com/id/{username}", "detection_type": "message_body", "error_message": "could not be found", "category": "gaming"},
            {"name": "github", "url_template": "https://other.example/{username}", "detection_type": "status_code"}
        ]
    }"#;

    #[test]
    fn test_parse_wrapped_catalog_drops_duplicates() {
        let sites = parse_sites(CATALOG).unwrap();
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].url_template, "https://github.com/{username}");
        assert_eq!(sites[1].detection_type, DetectionType::MessageBody);
    }

    #[test]
    fn test_parse_bare_array() {
        let sites = parse_sites(
            r#"[{"name": "Lichess", "url_template": "https://lichess.org/@/{username}", "detection_type": "status_code"}]"#,
        )
        .unwrap();
        assert_eq!(sites.len(), 1);
        assert!(sites[0].category.is_none());
    }

    #[test]
    fn test_template_without_placeholder_is_rejected() {
        let err = parse_sites(
            r#"[{"name": "Broken", "url_template": "https://example.com/user", "detection_type": "status_code"}]"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing {username}"));
    }

    #[test]
    fn test_non_http_template_is_rejected() {
        let err = parse_sites(
            r#"[{"name": "Ftp", "url_template": "ftp://example.com/{username}", "detection_type": "status_code"}]"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_invalid_regex_check_is_rejected() {
        let result = parse_sites(
            r#"[{"name": "Bad", "url_template": "https://example.com/{username}", "detection_type": "status_code", "regex_check": "(["}]"#,
        );
        assert!(matches!(result, Err(UserFinderError::CatalogError(_))));
    }

    #[test]
    fn test_regex_check_is_compiled() {
        let sites = parse_sites(
            r#"[{"name": "Short", "url_template": "https://example.com/{username}", "detection_type": "status_code", "regex_check": "^[a-z]{1,5}$"}]"#,
        )
        .unwrap();
        assert!(sites[0].accepts_username("alice"));
        assert!(!sites[0].accepts_username("alice_long"));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(parse_sites("{not json"), Err(UserFinderError::CatalogError(_))));
    }

    #[test]
    fn test_filter_sites() {
        let sites = parse_sites(CATALOG).unwrap();

        let gaming = filter_sites(sites.clone(), &["GAMING".to_string()], &[]).unwrap();
        assert_eq!(gaming.len(), 1);
        assert_eq!(gaming[0].name, "Steam");

        let named = filter_sites(sites.clone(), &[], &["github".to_string()]).unwrap();
        assert_eq!(named[0].name, "GitHub");

        let everything = filter_sites(sites.clone(), &[], &[]).unwrap();
        assert_eq!(everything.len(), 2);

        assert!(filter_sites(sites, &["music".to_string()], &[]).is_err());
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        let sites = builtin_sites().unwrap();
        assert!(sites.len() > 20);
        assert!(sites.iter().any(|s| s.name == "GitHub"));
    }

    #[test]
    fn test_load_sites_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sites.json");
        fs::write(&path, CATALOG).unwrap();
        assert_eq!(load_sites(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_explicit_missing_sites_file_fails() {
        let config = Config {
            sites_file: Some("/no/such/sites.json".into()),
            ..Config::default()
        };
        let err = resolve_sites(&config).unwrap_err();
        assert!(err.to_string().contains("Sites file not found"));
    }
}
