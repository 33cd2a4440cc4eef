//! Harness configuration, read from the environment.
//!
//! A `.env` file in the working directory is loaded first when present.
//! Only `BASE_URL` is mandatory.

use std::path::PathBuf;

use chrono::Duration;
use thiserror::Error;

use crate::api::is_insecure_dev_host;
use crate::auth::{strip_header_name, DEFAULT_AUTH_DIR, DEFAULT_BUFFER_MINUTES};

const MANDATORY_VARS: &[&str] = &["BASE_URL"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing env variables: {}", .0.join(","))]
    MissingEnv(Vec<String>),

    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Application base URL, without the API prefix
    pub base_url: String,
    /// Bare `x-rh-identity` value
    pub identity_header: Option<String>,
    pub db_connection_string: Option<String>,
    pub coverage: bool,
    pub ci: bool,
    pub proxy: Option<String>,
    pub auth_dir: PathBuf,
    pub token_refresh_buffer: Duration,
    pub workers: usize,
    pub worker_index: usize,
}

impl HarnessConfig {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let missing: Vec<String> = MANDATORY_VARS
            .iter()
            .filter(|var| get(**var).is_none())
            .map(|var| var.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingEnv(missing));
        }

        let base_url = get("BASE_URL").unwrap_or_default();
        let buffer_minutes =
            parse_or(&get, "TOKEN_REFRESH_BUFFER_MINUTES", DEFAULT_BUFFER_MINUTES)?;
        let workers = parse_or(&get, "CS_E2E_WORKERS", 1usize)?.max(1);
        let worker_index = parse_or(&get, "CS_E2E_WORKER_INDEX", 0usize)?;
        if worker_index >= workers {
            return Err(ConfigError::InvalidValue {
                var: "CS_E2E_WORKER_INDEX".to_string(),
                value: worker_index.to_string(),
            });
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            identity_header: get("IDENTITY_HEADER").map(|h| strip_header_name(&h).to_string()),
            db_connection_string: get("DB_CONNECTION_STRING"),
            coverage: get("COVERAGE").as_deref() == Some("true"),
            ci: get("CI").is_some_and(|v| v != "false" && v != "0"),
            proxy: get("PROXY"),
            auth_dir: get("CS_E2E_AUTH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_AUTH_DIR)),
            token_refresh_buffer: Duration::minutes(buffer_minutes),
            workers,
            worker_index,
        })
    }

    /// Certificate checks are skipped only for direct connections to dev hosts
    pub fn accept_invalid_certs(&self) -> bool {
        self.proxy.is_none() && is_insecure_dev_host(&self.base_url)
    }
}

fn parse_or<T, G>(get: &G, var: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
            var: var.to_string(),
            value,
        }),
    }
}
