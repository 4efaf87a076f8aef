// Runtime configuration, read from the environment (and `.env` via dotenv).
//
// **Environment Variables:**
// - `GOOGLE_SERVICE_ACCOUNT_KEY` - Path to the service account JSON key (default `service_key.json`)
// - `CONVERTIO_WORK_DIR` - Scratch directory for converted files (default `convertio`)
// - `CONVERTIO_DUPLICATE_POLICY` - `fail-open` (default) or `fail-closed`
// - `CONVERTIO_PAGE_SIZE` - Files per listing page, 1..=1000 (default 100)

use std::path::PathBuf;

use thiserror::Error;

use crate::core::conversion::DuplicatePolicy;
use crate::infra::google_drive::drive_client::DEFAULT_PAGE_SIZE;

const DEFAULT_KEY_FILE: &str = "service_key.json";
const DEFAULT_WORK_DIR: &str = "convertio";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub key_file: PathBuf,
    pub work_dir: PathBuf,
    pub duplicate_policy: DuplicatePolicy,
    pub page_size: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the config from any variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let duplicate_policy = match get("CONVERTIO_DUPLICATE_POLICY") {
            Some(value) => value.parse::<DuplicatePolicy>().map_err(|reason| ConfigError::Invalid {
                var: "CONVERTIO_DUPLICATE_POLICY",
                reason,
            })?,
            None => DuplicatePolicy::default(),
        };

        let page_size = match get("CONVERTIO_PAGE_SIZE") {
            Some(value) => parse_page_size(&value)?,
            None => DEFAULT_PAGE_SIZE,
        };

        Ok(Self {
            key_file: get("GOOGLE_SERVICE_ACCOUNT_KEY")
                .unwrap_or_else(|| DEFAULT_KEY_FILE.to_string())
                .into(),
            work_dir: get("CONVERTIO_WORK_DIR")
                .unwrap_or_else(|| DEFAULT_WORK_DIR.to_string())
                .into(),
            duplicate_policy,
            page_size,
        })
    }
}

fn parse_page_size(value: &str) -> Result<u32, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        var: "CONVERTIO_PAGE_SIZE",
        reason,
    };
    let size: u32 = value
        .trim()
        .parse()
        .map_err(|e| invalid(format!("'{}' is not a number ({})", value, e)))?;
    if !(1..=1000).contains(&size) {
        return Err(invalid(format!("{} is outside 1..=1000", size)));
    }
    Ok(size)
}
