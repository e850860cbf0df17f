//! Process-wide configuration, read once at startup and shared read-only.

use crate::{Error, Result};
use std::time::Duration;

pub const DEFAULT_DESCRIPTION_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GENERATION_MODEL: &str = "imagen-3.0-generate-002";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// 4 MiB before base64 expansion keeps requests under a 6 MiB body ceiling.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 4 * 1024 * 1024;
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 6 * 1024 * 1024;

pub const DEFAULT_DESCRIPTION_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct Config {
    /// Checked per invocation, so a server without a key still answers with
    /// a proper error envelope.
    pub api_key: Option<String>,
    pub description_model: String,
    pub generation_model: String,
    pub gemini_base_url: String,
    pub description_timeout: Duration,
    pub generation_timeout: Duration,
    pub max_upload_bytes: usize,
    pub max_request_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            description_model: DEFAULT_DESCRIPTION_MODEL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            description_timeout: Duration::from_secs(DEFAULT_DESCRIPTION_TIMEOUT_SECS),
            generation_timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            api_key: get("GEMINI_API_KEY"),
            description_model: get("DESCRIPTION_MODEL").unwrap_or(defaults.description_model),
            generation_model: get("GENERATION_MODEL").unwrap_or(defaults.generation_model),
            gemini_base_url: get("GEMINI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.gemini_base_url),
            description_timeout: match get("DESCRIPTION_TIMEOUT_SECS") {
                Some(raw) => Duration::from_secs(parse_number("DESCRIPTION_TIMEOUT_SECS", &raw)?),
                None => defaults.description_timeout,
            },
            generation_timeout: match get("GENERATION_TIMEOUT_SECS") {
                Some(raw) => Duration::from_secs(parse_number("GENERATION_TIMEOUT_SECS", &raw)?),
                None => defaults.generation_timeout,
            },
            max_upload_bytes: match get("MAX_UPLOAD_BYTES") {
                Some(raw) => parse_number("MAX_UPLOAD_BYTES", &raw)?,
                None => defaults.max_upload_bytes,
            },
            max_request_bytes: match get("MAX_REQUEST_BYTES") {
                Some(raw) => parse_number("MAX_REQUEST_BYTES", &raw)?,
                None => defaults.max_request_bytes,
            },
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Timeouts and size limits of zero would fail every request, so zero is rejected too.
fn parse_number<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr + Default + PartialEq,
{
    match raw.trim().parse::<T>() {
        Ok(value) if value != T::default() => Ok(value),
        _ => Err(Error::Config(format!(
            "{} must be a positive integer, got '{}'",
            key, raw
        ))),
    }
}
