use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://ai-dsmatchmaker-production-aa72.up.railway.app";
pub const REPOSITORY_URL: &str = "https://github.com/ItayAvioz/AI-DS_matchmaker";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub log_file: Option<PathBuf>,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            log_file: None,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Loads `.env.local` and `.env` (if present) and then reads the process
    /// environment.
    pub fn load() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let api_base_url = lookup("MATCHMAKER_API_URL")
            .map(|val| val.trim().trim_end_matches('/').to_string())
            .filter(|val| !val.is_empty())
            .unwrap_or(defaults.api_base_url);
        let timeout_secs = lookup("MATCHMAKER_TIMEOUT_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(1, 300);
        let log_file = lookup("MATCHMAKER_LOG_FILE")
            .map(|val| val.trim().to_string())
            .filter(|val| !val.is_empty())
            .map(PathBuf::from);
        let log_level = lookup("LOG_LEVEL")
            .map(|val| val.trim().to_string())
            .filter(|val| !val.is_empty())
            .unwrap_or(defaults.log_level);

        Self {
            api_base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            log_file,
            log_level,
        }
    }

    pub fn docs_url(&self) -> String {
        format!("{}/docs", self.api_base_url)
    }
}
