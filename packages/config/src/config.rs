// ABOUTME: Typed runtime configuration loaded from environment variables
// ABOUTME: Validates ports, durations and scopes and supplies defaults for everything optional

use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::constants::*;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid number for {name}: {source}")]
    InvalidNumber {
        name: &'static str,
        #[source]
        source: ParseIntError,
    },
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("Invalid API URL: {0}")]
    InvalidApiUrl(String),
    #[error("Could not determine home directory")]
    NoHomeDirectory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub http_timeout: Duration,
    pub client_id: Option<String>,
    pub tenant_id: String,
    pub redirect_port: u16,
    pub api_scopes: Vec<String>,
    pub token_expiry_buffer: Duration,
    pub data_dir: PathBuf,
    pub retention: Duration,
    pub max_cache_entries: Option<usize>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = non_empty(CLOUDLENS_API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidApiUrl(api_url));
        }
        let api_url = api_url.trim_end_matches('/').to_string();

        let http_timeout = Duration::from_secs(positive(
            CLOUDLENS_HTTP_TIMEOUT_SECS,
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?);

        let client_id = non_empty(CLOUDLENS_CLIENT_ID);
        let tenant_id =
            non_empty(CLOUDLENS_TENANT_ID).unwrap_or_else(|| DEFAULT_TENANT_ID.to_string());

        let redirect_port = match non_empty(CLOUDLENS_REDIRECT_PORT) {
            Some(raw) => raw.parse::<u16>().map_err(|source| ConfigError::InvalidNumber {
                name: CLOUDLENS_REDIRECT_PORT,
                source,
            })?,
            None => DEFAULT_REDIRECT_PORT,
        };
        if redirect_port == 0 {
            return Err(ConfigError::PortOutOfRange(redirect_port));
        }

        // Scopes may be space or comma separated; the default mirrors the
        // "user_impersonation" scope exposed by the backend app registration.
        let api_scopes = match non_empty(CLOUDLENS_API_SCOPES) {
            Some(raw) => split_scopes(&raw),
            None => client_id
                .as_ref()
                .map(|id| vec![format!("api://{}/user_impersonation", id)])
                .unwrap_or_default(),
        };

        // Zero is allowed here: it disables the buffer entirely.
        let token_expiry_buffer = Duration::from_secs(number(
            CLOUDLENS_TOKEN_EXPIRY_BUFFER_SECS,
            DEFAULT_TOKEN_EXPIRY_BUFFER_SECS,
        )?);

        let data_dir = match non_empty(CLOUDLENS_DATA_DIR) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir()
                .ok_or(ConfigError::NoHomeDirectory)?
                .join(DATA_DIR_NAME),
        };

        let retention_days = positive(CLOUDLENS_RETENTION_DAYS, DEFAULT_RETENTION_DAYS)?;
        let retention = Duration::from_secs(retention_days * 24 * 60 * 60);

        let max_cache_entries = match non_empty(CLOUDLENS_MAX_CACHE_ENTRIES) {
            Some(raw) => {
                let cap = raw
                    .parse::<usize>()
                    .map_err(|source| ConfigError::InvalidNumber {
                        name: CLOUDLENS_MAX_CACHE_ENTRIES,
                        source,
                    })?;
                (cap > 0).then_some(cap)
            }
            None => None,
        };

        let gemini_api_key = non_empty(GEMINI_API_KEY);
        let gemini_model =
            non_empty(GEMINI_MODEL).unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

        debug!(
            "Loaded configuration: api_url={}, tenant={}, data_dir={}",
            api_url,
            tenant_id,
            data_dir.display()
        );

        Ok(Self {
            api_url,
            http_timeout,
            client_id,
            tenant_id,
            redirect_port,
            api_scopes,
            token_expiry_buffer,
            data_dir,
            retention,
            max_cache_entries,
            gemini_api_key,
            gemini_model,
        })
    }

    /// Path of the SQLite file backing the snapshot cache
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE_NAME)
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn number(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match non_empty(name) {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|source| ConfigError::InvalidNumber { name, source }),
        None => Ok(default),
    }
}

fn positive(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    let value = number(name, default)?;
    if value == 0 {
        return Err(ConfigError::ZeroDuration(name));
    }
    Ok(value)
}

fn split_scopes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_scopes_mixed_separators() {
        assert_eq!(
            split_scopes("api://a/read, api://a/write  openid"),
            vec!["api://a/read", "api://a/write", "openid"]
        );
    }

    #[test]
    fn test_split_scopes_empty() {
        assert!(split_scopes(" , ").is_empty());
    }
}
