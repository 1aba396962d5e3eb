use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
    pub session: SessionConfig,
}

/// Backend API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the PCF backend, without a trailing slash.
    pub base_url: String,
}

/// Client state persistence configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Path of the JSON file holding tokens, the selected company and
    /// tour-completion state.
    pub state_path: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout_ms: u64,
}

/// Token-lifecycle configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Period of the background refresh task. Defaults to 45 minutes
    /// against the backend's 60-minute access-token lifetime.
    pub refresh_interval_secs: u64,
    /// Tokens expiring within this many seconds are treated as already
    /// expired, so a request never departs with a token about to lapse.
    pub expiry_leeway_secs: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api = ApiConfig {
            base_url: env::var("PCF_BASE_URL")
                .map_err(|_| AppError::Config {
                    message: "PCF_BASE_URL is required".to_string(),
                })?
                .trim_end_matches('/')
                .to_string(),
        };

        let storage = StorageConfig {
            state_path: PathBuf::from(
                env::var("PCF_STATE_PATH").unwrap_or_else(|_| "./data/pcf-state.json".to_string()),
            ),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30000),
        };

        let session = SessionConfig {
            refresh_interval_secs: env::var("TOKEN_REFRESH_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(45 * 60),
            expiry_leeway_secs: env::var("TOKEN_EXPIRY_LEEWAY_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        };

        Ok(Config {
            api,
            storage,
            logging,
            request,
            session,
        })
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self { timeout_ms: 30000 }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 45 * 60,
            expiry_leeway_secs: 30,
        }
    }
}
