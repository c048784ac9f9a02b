use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::{Error, Result};

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

pub const DEFAULT_DELAY_SECS: u64 = 1;
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Get the base data directory (~/.yt-rank-sheet/)
pub fn data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(|| {
        std::env::var("YT_RANK_SHEET_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".yt-rank-sheet")
            })
    })
}

/// Get the .env file path
pub fn env_file_path() -> PathBuf {
    data_dir().join(".env")
}

/// Load environment variables from the data directory's .env file
pub fn load_env() {
    let env_path = env_file_path();
    if env_path.exists() {
        let _ = dotenvy::from_path(&env_path);
    } else {
        // Try current directory as fallback
        let _ = dotenvy::dotenv();
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Get the YouTube Data API key
pub fn youtube_api_key() -> Option<String> {
    non_empty_var("YOUTUBE_API_KEY").or_else(|| non_empty_var("API_KEY"))
}

/// Where the Sheets API credential comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetsCredential {
    /// Pre-resolved OAuth bearer token, used as is
    AccessToken(String),
    /// Service-account key JSON content
    ServiceAccountJson(String),
    /// Path to a service-account key file
    ServiceAccountFile(PathBuf),
}

/// Pick the Sheets credential: an explicit access token wins, then the
/// service-account JSON, then a key file path
pub fn select_sheets_credential(
    access_token: Option<String>,
    service_account_json: Option<String>,
    service_account_file: Option<String>,
) -> Result<SheetsCredential> {
    if let Some(token) = access_token {
        return Ok(SheetsCredential::AccessToken(token));
    }
    if let Some(json) = service_account_json {
        return Ok(SheetsCredential::ServiceAccountJson(json));
    }
    if let Some(path) = service_account_file {
        return Ok(SheetsCredential::ServiceAccountFile(PathBuf::from(path)));
    }
    Err(Error::Config(
        "no Sheets credential set (SERVICE_ACCOUNT, SERVICE_ACCOUNT_FILE or SHEETS_ACCESS_TOKEN)"
            .to_string(),
    ))
}

/// Read the Sheets credential from the environment
pub fn sheets_credential() -> Result<SheetsCredential> {
    select_sheets_credential(
        non_empty_var("SHEETS_ACCESS_TOKEN"),
        non_empty_var("SERVICE_ACCOUNT"),
        non_empty_var("SERVICE_ACCOUNT_FILE"),
    )
}

/// Create the data directory if it doesn't exist
pub fn ensure_directories() -> Result<()> {
    std::fs::create_dir_all(data_dir())?;
    Ok(())
}

/// Resolve a required value given on the command line or through the environment
pub fn require(value: Option<String>, what: &str, var: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::Config(format!("{} not set (use --{} or {})", what, flag_name(var), var)))
}

fn flag_name(var: &str) -> String {
    match var {
        "SPREADSHEET_ID" => "spreadsheet".to_string(),
        "CHANNEL_ID" => "channel".to_string(),
        other => other.to_lowercase().replace('_', "-"),
    }
}

/// Rate limiting and retry tuning shared by the fetch and publish stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    /// Fixed pause between successive network calls
    pub delay: Duration,
    /// Base unit for exponential backoff
    pub backoff_unit: Duration,
    pub max_retries: u32,
}

impl Throttle {
    pub fn new(delay_secs: u64, max_retries: u32) -> Self {
        Self {
            delay: Duration::from_secs(delay_secs),
            backoff_unit: Duration::from_secs(1),
            max_retries: max_retries.max(1),
        }
    }

    /// No pauses at all; used by tests
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            delay: Duration::ZERO,
            backoff_unit: Duration::ZERO,
            max_retries: max_retries.max(1),
        }
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY_SECS, DEFAULT_MAX_RETRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_throttle_matches_rate_limits() {
        let throttle = Throttle::default();
        assert_eq!(throttle.delay, Duration::from_secs(1));
        assert_eq!(throttle.backoff_unit, Duration::from_secs(1));
        assert_eq!(throttle.max_retries, 3);
    }

    #[test]
    fn zero_retries_still_allows_one_attempt() {
        assert_eq!(Throttle::new(0, 0).max_retries, 1);
        assert_eq!(Throttle::immediate(0).max_retries, 1);
    }

    #[test]
    fn access_token_overrides_service_account() {
        let credential = select_sheets_credential(
            Some("ya29.token".to_string()),
            Some("{}".to_string()),
            Some("/keys/sa.json".to_string()),
        )
        .unwrap();
        assert_eq!(credential, SheetsCredential::AccessToken("ya29.token".to_string()));
    }

    #[test]
    fn service_account_json_preferred_over_file() {
        let credential = select_sheets_credential(
            None,
            Some("{\"type\": \"service_account\"}".to_string()),
            Some("sa.json".to_string()),
        )
        .unwrap();
        assert!(matches!(credential, SheetsCredential::ServiceAccountJson(_)));

        let credential = select_sheets_credential(None, None, Some("sa.json".to_string())).unwrap();
        assert_eq!(credential, SheetsCredential::ServiceAccountFile(PathBuf::from("sa.json")));
    }

    #[test]
    fn missing_sheets_credential_is_a_config_error() {
        let err = select_sheets_credential(None, None, None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("SERVICE_ACCOUNT"));
    }

    #[test]
    fn require_rejects_blank_values() {
        assert_eq!(
            require(Some("abc".to_string()), "Spreadsheet ID", "SPREADSHEET_ID").unwrap(),
            "abc"
        );

        let err = require(Some("  ".to_string()), "Spreadsheet ID", "SPREADSHEET_ID").unwrap_err();
        assert!(err.to_string().contains("--spreadsheet"));

        let err = require(None, "Channel ID", "CHANNEL_ID").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("CHANNEL_ID"));
    }
}
