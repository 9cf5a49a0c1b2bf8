//! Environment driven settings for the selections load test.
//!
//! Goose parses its own run-time options (`--host`, `--users`, `--run-time`, ...) from
//! the command line. The handful of settings specific to this load test are instead read
//! once from the environment when the load test starts, and never change afterward.

use reqwest::header::{self, HeaderMap, HeaderValue};
use std::env;
use std::time::Duration;

use crate::SelectionsError;

/// Environment variable naming the path to request.
pub const TARGET_PATH: &str = "TARGET_PATH";
/// Environment variable holding the per-request timeout, in seconds.
pub const REQUEST_TIMEOUT_S: &str = "REQUEST_TIMEOUT_S";
/// Environment variable holding the `Authorization` header value.
pub const AUTH_HEADER: &str = "AUTH_HEADER";
/// Environment variable holding the fixed pause between iterations, in seconds.
pub const WAIT_S: &str = "WAIT_S";
/// Environment variable naming the JSON report file.
pub const REPORT_PATH: &str = "REPORT_PATH";
/// Environment variable naming the optional Markdown summary file.
pub const REPORT_MD_PATH: &str = "REPORT_MD_PATH";
/// Environment variable holding the optional minimum selection rate.
pub const MIN_SELECTION_RATE: &str = "MIN_SELECTION_RATE";

const DEFAULT_TARGET_PATH: &str = "/";
const DEFAULT_REQUEST_TIMEOUT_S: f64 = 30.0;
const DEFAULT_REPORT_PATH: &str = "locust-custom-report.json";

/// Settings for one run of the load test.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Path requested by every transaction, relative to the Goose `--host`.
    pub target_path: String,
    /// Timeout applied to each request, must be greater than zero.
    pub request_timeout: Duration,
    /// Sent as the `Authorization` header when set.
    pub auth_header: Option<String>,
    /// Fixed pause between each user's iterations, zero to disable.
    pub wait_time: Duration,
    /// Where the JSON report is written at the end of the load test.
    pub report_path: String,
    /// Where the Markdown summary is written, if anywhere.
    pub markdown_report_path: Option<String>,
    /// Selection rate (0.0 to 1.0) the load test must reach, if any.
    pub min_selection_rate: Option<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            target_path: DEFAULT_TARGET_PATH.to_string(),
            request_timeout: Duration::from_secs_f64(DEFAULT_REQUEST_TIMEOUT_S),
            auth_header: None,
            wait_time: Duration::ZERO,
            report_path: DEFAULT_REPORT_PATH.to_string(),
            markdown_report_path: None,
            min_selection_rate: None,
        }
    }
}

impl Config {
    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Config, SelectionsError> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    /// Load the configuration from any source of key/value pairs. Keys that are not
    /// found keep their default value.
    ///
    /// ```rust
    /// use goose_selections::config::Config;
    ///
    /// let config = Config::from_lookup(|key| match key {
    ///     "TARGET_PATH" => Some("/api/v1/selections".to_string()),
    ///     "WAIT_S" => Some("0.25".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    /// assert_eq!(config.target_path, "/api/v1/selections");
    /// assert_eq!(config.wait_time.as_millis(), 250);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Config, SelectionsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(target_path) = lookup(TARGET_PATH) {
            config.target_path = target_path;
        }

        if let Some(value) = lookup(REQUEST_TIMEOUT_S) {
            let seconds = parse_seconds(REQUEST_TIMEOUT_S, &value)?;
            if seconds <= 0.0 {
                return Err(SelectionsError::InvalidOption {
                    option: REQUEST_TIMEOUT_S.to_string(),
                    value,
                    detail: "the request timeout must be greater than 0 seconds.".to_string(),
                });
            }
            config.request_timeout = Duration::from_secs_f64(seconds);
        }

        // An empty value is the same as no value.
        if let Some(auth_header) = lookup(AUTH_HEADER).filter(|v| !v.is_empty()) {
            if HeaderValue::from_str(&auth_header).is_err() {
                return Err(SelectionsError::InvalidOption {
                    option: AUTH_HEADER.to_string(),
                    value: "(redacted)".to_string(),
                    detail: "not a valid HTTP header value.".to_string(),
                });
            }
            config.auth_header = Some(auth_header);
        }

        if let Some(value) = lookup(WAIT_S) {
            let seconds = parse_seconds(WAIT_S, &value)?;
            if seconds < 0.0 {
                return Err(SelectionsError::InvalidOption {
                    option: WAIT_S.to_string(),
                    value,
                    detail: "the wait time must not be negative.".to_string(),
                });
            }
            config.wait_time = Duration::from_secs_f64(seconds);
        }

        if let Some(report_path) = lookup(REPORT_PATH).filter(|v| !v.is_empty()) {
            config.report_path = report_path;
        }

        if let Some(markdown_report_path) = lookup(REPORT_MD_PATH).filter(|v| !v.is_empty()) {
            config.markdown_report_path = Some(markdown_report_path);
        }

        if let Some(value) = lookup(MIN_SELECTION_RATE).filter(|v| !v.is_empty()) {
            let rate = parse_float(MIN_SELECTION_RATE, &value)?;
            if !(0.0..=1.0).contains(&rate) {
                return Err(SelectionsError::InvalidOption {
                    option: MIN_SELECTION_RATE.to_string(),
                    value,
                    detail: "the minimum selection rate must be between 0.0 and 1.0.".to_string(),
                });
            }
            config.min_selection_rate = Some(rate);
        }

        Ok(config)
    }

    /// Headers sent with every request: `Accept: application/json`, plus
    /// `Authorization` when configured.
    pub fn request_headers(&self) -> Result<HeaderMap, SelectionsError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(auth_header) = &self.auth_header {
            let mut value =
                HeaderValue::from_str(auth_header).map_err(|_| SelectionsError::InvalidOption {
                    option: AUTH_HEADER.to_string(),
                    value: "(redacted)".to_string(),
                    detail: "not a valid HTTP header value.".to_string(),
                })?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Each setting as a name and a printable value, for logging when the load test
    /// starts. The `Authorization` value is never included, only whether one is sent.
    pub fn settings(&self) -> Vec<(&'static str, String)> {
        vec![
            ("target_path", self.target_path.clone()),
            (
                "request_timeout",
                format!("{}s", self.request_timeout.as_secs_f64()),
            ),
            (
                "authorization",
                if self.auth_header.is_some() {
                    "enabled".to_string()
                } else {
                    "disabled".to_string()
                },
            ),
            ("wait_time", format!("{}s", self.wait_time.as_secs_f64())),
            ("report_path", self.report_path.clone()),
            (
                "markdown_report_path",
                self.markdown_report_path
                    .clone()
                    .unwrap_or_else(|| "(none)".to_string()),
            ),
            (
                "min_selection_rate",
                self.min_selection_rate
                    .map_or_else(|| "(none)".to_string(), |rate| rate.to_string()),
            ),
        ]
    }
}

// Parse a float, rejecting NaN and infinity.
fn parse_float(option: &str, value: &str) -> Result<f64, SelectionsError> {
    match value.trim().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(SelectionsError::InvalidOption {
            option: option.to_string(),
            value: value.to_string(),
            detail: "expected a finite number.".to_string(),
        }),
    }
}

// Seconds are floats so sub-second values such as `0.5` work.
fn parse_seconds(option: &str, value: &str) -> Result<f64, SelectionsError> {
    let seconds = parse_float(option, value)?;
    // Duration::from_secs_f64 panics on overflow.
    if seconds >= u64::MAX as f64 {
        return Err(SelectionsError::InvalidOption {
            option: option.to_string(),
            value: value.to_string(),
            detail: "too many seconds.".to_string(),
        });
    }
    Ok(seconds)
}
