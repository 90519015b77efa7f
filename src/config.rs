//! Configuration for the scholarship console.
//!
//! Configuration is read from environment variables:
//! - `SCHOLARSHIP_BACKEND_URL` - Optional. Admin API base. Defaults to `http://127.0.0.1:8000/api`.
//! - `SCHOLARSHIP_ENGINE_URL` - Optional. Scraping engine base. Defaults to `http://127.0.0.1:8000/api/v1`.
//! - `REQUEST_TIMEOUT_SECS` - Optional. Default per-request timeout. Defaults to `30`.
//! - `LAUNCH_TIMEOUT_SECS` - Optional. Timeout for maintenance launches. Defaults to `120`.
//! - `POLL_INTERVAL_MS` - Optional. Delay between status polls. Defaults to `2000`.
//! - `POLL_TRANSIENT_RETRIES` - Optional. Consecutive transient poll failures tolerated. Defaults to `0`.
//! - `SCHOLARSHIP_TOKEN_FILE` - Optional. Where the admin token is kept. Defaults to `$HOME/.scholarship-console/adminToken`.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::jobs::PollPolicy;
use crate::util::home_dir;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_ENGINE_URL: &str = "http://127.0.0.1:8000/api/v1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Console configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Admin backend base URL (jobs, maintenance, enrichment, login)
    pub backend_url: String,

    /// Scraping engine base URL (moderation queue)
    pub engine_url: String,

    /// Default timeout applied to every request
    pub request_timeout: Duration,

    /// Timeout for long-running maintenance launches
    pub launch_timeout: Duration,

    /// Poll interval and transient retry budget
    pub poll: PollPolicy,

    /// File holding the admin bearer token
    pub token_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            engine_url: DEFAULT_ENGINE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            launch_timeout: Duration::from_secs(120),
            poll: PollPolicy::default(),
            token_file: default_token_file(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let backend_url = match get("SCHOLARSHIP_BACKEND_URL") {
            Some(raw) => parse_base_url("SCHOLARSHIP_BACKEND_URL", &raw)?,
            None => DEFAULT_BACKEND_URL.to_string(),
        };
        let engine_url = match get("SCHOLARSHIP_ENGINE_URL") {
            Some(raw) => parse_base_url("SCHOLARSHIP_ENGINE_URL", &raw)?,
            None => DEFAULT_ENGINE_URL.to_string(),
        };

        let request_timeout =
            Duration::from_secs(parse_number(&get, "REQUEST_TIMEOUT_SECS", 30u64)?);
        let launch_timeout = Duration::from_secs(parse_number(&get, "LAUNCH_TIMEOUT_SECS", 120u64)?);
        for (name, timeout) in [
            ("REQUEST_TIMEOUT_SECS", request_timeout),
            ("LAUNCH_TIMEOUT_SECS", launch_timeout),
        ] {
            if timeout.is_zero() {
                return Err(ConfigError::InvalidValue(
                    name.to_string(),
                    "must be greater than zero".to_string(),
                ));
            }
        }

        let interval_ms: u64 = parse_number(&get, "POLL_INTERVAL_MS", 2000u64)?;
        if interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "POLL_INTERVAL_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let poll = PollPolicy {
            interval: Duration::from_millis(interval_ms),
            max_transient_retries: parse_number(&get, "POLL_TRANSIENT_RETRIES", 0u32)?,
        };

        let token_file = get("SCHOLARSHIP_TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(default_token_file);

        Ok(Self {
            backend_url,
            engine_url,
            request_timeout,
            launch_timeout,
            poll,
            token_file,
        })
    }
}

fn default_token_file() -> PathBuf {
    PathBuf::from(home_dir())
        .join(".scholarship-console")
        .join("adminToken")
}

fn parse_number<T, G>(get: &G, name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        None => Ok(default),
    }
}

/// Base URLs must be absolute http(s). Trailing slashes are dropped.
fn parse_base_url(name: &str, raw: &str) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("unsupported scheme '{}'", parsed.scheme()),
        ));
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.engine_url, DEFAULT_ENGINE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.launch_timeout, Duration::from_secs(120));
        assert_eq!(config.poll.interval, Duration::from_millis(2000));
        assert_eq!(config.poll.max_transient_retries, 0);
        assert!(config.token_file.ends_with(".scholarship-console/adminToken"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("SCHOLARSHIP_BACKEND_URL", "https://admin.example.se/api/"),
            ("POLL_INTERVAL_MS", "500"),
            ("POLL_TRANSIENT_RETRIES", "3"),
            ("SCHOLARSHIP_TOKEN_FILE", "/tmp/token"),
        ])
        .unwrap();
        assert_eq!(config.backend_url, "https://admin.example.se/api");
        assert_eq!(config.poll.interval, Duration::from_millis(500));
        assert_eq!(config.poll.max_transient_retries, 3);
        assert_eq!(config.token_file, PathBuf::from("/tmp/token"));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = load(&[("SCHOLARSHIP_ENGINE_URL", "  ")]).unwrap();
        assert_eq!(config.engine_url, DEFAULT_ENGINE_URL);
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = load(&[("REQUEST_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref name, _) if name == "REQUEST_TIMEOUT_SECS"));

        let err = load(&[("LAUNCH_TIMEOUT_SECS", "0")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue(
                "LAUNCH_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string()
            )
        );

        let err = load(&[("POLL_INTERVAL_MS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref name, _) if name == "POLL_INTERVAL_MS"));

        let err = load(&[("SCHOLARSHIP_ENGINE_URL", "ftp://files.example.se")]).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));

        let err = load(&[("SCHOLARSHIP_BACKEND_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref name, _) if name == "SCHOLARSHIP_BACKEND_URL"));
    }
}
