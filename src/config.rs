use std::env;
use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_NOTIFY_MS: u64 = 3000;

pub const API_URL_ENV: &str = "EDUPORTAL_API_URL";
pub const NOTIFY_MS_ENV: &str = "EDUPORTAL_NOTIFY_MS";

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub notify_duration: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            notify_duration: Duration::from_millis(DEFAULT_NOTIFY_MS),
        }
    }
}

impl ApiConfig {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            ..Self::default()
        })
    }

    /// Reads `.env` (if present) and then the process environment.
    pub fn new_from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_vars(env::var(API_URL_ENV).ok(), env::var(NOTIFY_MS_ENV).ok())
    }

    pub fn from_vars(api_url: Option<String>, notify_ms: Option<String>) -> Result<Self, AppError> {
        let base_url = normalize_base_url(api_url.as_deref().unwrap_or(DEFAULT_API_URL))?;

        let notify_ms = match notify_ms {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                AppError::Config(format!("{} must be a number of milliseconds, got {:?}", NOTIFY_MS_ENV, raw))
            })?,
            None => DEFAULT_NOTIFY_MS,
        };

        Ok(Self {
            base_url,
            notify_duration: Duration::from_millis(notify_ms),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, AppError> {
        self.base_url = normalize_base_url(base_url)?;
        Ok(self)
    }
}

fn normalize_base_url(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(AppError::Config(format!(
            "API url must start with http:// or https://, got {:?}",
            raw
        )));
    }
    Ok(trimmed.to_string())
}
