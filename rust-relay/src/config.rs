//! Configuration module for environment variable parsing.
//!
//! Everything is read once at startup into an immutable [`Config`] that is
//! shared read-only with the request handlers.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;

use crate::dispatch::DispatchTarget;

/// Default GitHub REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default `event_type` sent with every repository dispatch.
pub const DEFAULT_EVENT_TYPE: &str = "webhook-relay";

/// Default timeout for a single outbound dispatch.
pub const DEFAULT_DISPATCH_TIMEOUT_MS: u64 = 5000;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Shared secret GitHub signs webhook bodies with
    pub webhook_secret: String,

    /// Bearer token for the repository dispatch API
    pub github_token: Option<String>,

    /// `event_type` identifier for outbound dispatches
    pub event_type: String,

    /// Repositories that receive a dispatch for every main-branch push
    pub targets: Vec<DispatchTarget>,

    /// Base URL of the GitHub REST API
    pub api_url: String,

    /// Timeout for a single outbound dispatch, in milliseconds
    pub dispatch_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let webhook_secret = non_empty(&lookup, "WEBHOOK_SECRET")
            .context("WEBHOOK_SECRET must be set to verify webhook signatures")?;

        // A zero timeout would fail every dispatch immediately
        let dispatch_timeout_ms =
            match parse_or(&lookup, "DISPATCH_TIMEOUT_MS", DEFAULT_DISPATCH_TIMEOUT_MS) {
                0 => {
                    warn!(env_var = "DISPATCH_TIMEOUT_MS", value = 0, "Invalid numeric value, using default");
                    DEFAULT_DISPATCH_TIMEOUT_MS
                }
                ms => ms,
            };

        Ok(Config {
            port: parse_or(&lookup, "PORT", 5000),

            webhook_secret,

            github_token: non_empty(&lookup, "GITHUB_TOKEN"),

            event_type: non_empty(&lookup, "EVENT_TYPE")
                .unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string()),

            targets: parse_targets(&lookup),

            api_url: non_empty(&lookup, "GITHUB_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),

            dispatch_timeout_ms,
        })
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms)
    }
}

/// Read a variable, treating blank values as unset.
fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a numeric variable, falling back to `default` when unset or invalid.
fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = match non_empty(lookup, name) {
        Some(v) => v,
        None => return default,
    };

    match raw.parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid numeric value, using default");
            default
        }
    }
}

/// Resolve the dispatch targets.
///
/// `REPOS` holds a comma-separated `owner/name` list. When it is unset the
/// single-repository form `REPO_OWNER` + `REPO_NAME` is used instead.
fn parse_targets<F>(lookup: &F) -> Vec<DispatchTarget>
where
    F: Fn(&str) -> Option<String>,
{
    let targets: Vec<DispatchTarget> = if let Some(raw) = non_empty(lookup, "REPOS") {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(DispatchTarget::parse)
            .collect()
    } else {
        let owner = non_empty(lookup, "REPO_OWNER");
        let name = non_empty(lookup, "REPO_NAME");
        if owner.is_none() && name.is_none() {
            warn!("No dispatch targets configured; main-branch pushes will be dropped");
            return Vec::new();
        }
        vec![DispatchTarget::new(
            owner.unwrap_or_default(),
            name.unwrap_or_default(),
        )]
    };

    for target in targets.iter().filter(|t| !t.is_complete()) {
        warn!(repo = %target, "Incomplete dispatch target, it will be skipped");
    }

    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        assert!(load(&[]).is_err());
        assert!(load(&[("WEBHOOK_SECRET", "   ")]).is_err());
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("WEBHOOK_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.github_token, None);
        assert_eq!(config.event_type, DEFAULT_EVENT_TYPE);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.dispatch_timeout(), Duration::from_secs(5));
        assert!(config.targets.is_empty());
    }

    #[test]
    fn test_repos_list() {
        let config = load(&[
            ("WEBHOOK_SECRET", "s3cret"),
            ("REPOS", "octo/one, octo/two,,octo/three "),
            ("REPO_OWNER", "ignored"),
            ("REPO_NAME", "ignored"),
        ])
        .unwrap();

        let names: Vec<String> = config.targets.iter().map(|t| t.to_string()).collect();
        assert_eq!(names, vec!["octo/one", "octo/two", "octo/three"]);
    }

    #[test]
    fn test_single_repo_fallback() {
        let config = load(&[
            ("WEBHOOK_SECRET", "s3cret"),
            ("REPO_OWNER", "octo"),
            ("REPO_NAME", "solo"),
        ])
        .unwrap();

        assert_eq!(config.targets, vec![DispatchTarget::new("octo", "solo")]);
    }

    #[test]
    fn test_single_repo_missing_name_kept_for_skip() {
        let config = load(&[("WEBHOOK_SECRET", "s3cret"), ("REPO_OWNER", "octo")]).unwrap();

        assert_eq!(config.targets.len(), 1);
        assert!(!config.targets[0].is_complete());
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = load(&[
            ("WEBHOOK_SECRET", "s3cret"),
            ("PORT", "not-a-port"),
            ("DISPATCH_TIMEOUT_MS", "-1"),
            ("GITHUB_API_URL", "http://localhost:9000/"),
        ])
        .unwrap();

        assert_eq!(config.port, 5000);
        assert_eq!(config.dispatch_timeout_ms, 5000);
        assert_eq!(config.api_url, "http://localhost:9000");
    }

    #[test]
    fn test_zero_timeout_falls_back() {
        let config = load(&[("WEBHOOK_SECRET", "s3cret"), ("DISPATCH_TIMEOUT_MS", "0")]).unwrap();

        assert_eq!(config.dispatch_timeout_ms, DEFAULT_DISPATCH_TIMEOUT_MS);
    }

    #[test]
    fn test_nested_repo_entry_kept_for_skip() {
        let config = load(&[("WEBHOOK_SECRET", "s3cret"), ("REPOS", "octo/one,octo/app/extra")]).unwrap();

        assert_eq!(config.targets.len(), 2);
        assert!(config.targets[0].is_complete());
        assert!(!config.targets[1].is_complete());
    }
}
