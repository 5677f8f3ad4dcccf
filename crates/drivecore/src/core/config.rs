//! Runtime configuration
//!
//! Values come from (lowest to highest priority) an optional
//! `drivedrop.toml` next to the binary, then environment variables. The
//! binary loads `.env` with dotenvy before calling [`Config::load`].

use std::path::PathBuf;
use std::time::Duration;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use secrecy::SecretString;
use serde::Deserialize;

use crate::core::error::ConfigError;

/// Optional config file consulted before the environment
pub const CONFIG_FILE: &str = "drivedrop.toml";

/// Drive resumable uploads require chunks in multiples of 256 KiB
pub const UPLOAD_CHUNK_GRANULARITY: usize = 256 * 1024;

/// Environment variables read verbatim (lowercased into config keys)
const ENV_KEYS: &[&str] = &[
    "TELEGRAM_TOKEN",
    "GOOGLE_TOKEN_B64",
    "GOOGLE_CREDS_B64",
    "DOWNLOAD_DIR",
    "PORT",
    "BOT_API_URL",
    "DRIVE_API_URL",
    "REQUEST_TIMEOUT_SECS",
    "UPLOAD_CHUNK_SIZE",
    "UPLOAD_RESUME_ATTEMPTS",
    "LOG_FILE_PATH",
];

pub mod defaults {
    /// Scratch directory for downloaded files
    pub const DOWNLOAD_DIR: &str = "/tmp";

    /// Liveness endpoint port
    pub const PORT: u16 = 8080;

    /// Google APIs root
    pub const DRIVE_API_URL: &str = "https://www.googleapis.com";

    /// HTTP timeout for Telegram and Drive requests (in seconds).
    /// Large uploads go out in chunks, so this bounds a single chunk.
    pub const REQUEST_TIMEOUT_SECS: u64 = 300;

    /// Resumable upload chunk size (8 MiB)
    pub const UPLOAD_CHUNK_SIZE: usize = 8 * 1024 * 1024;

    /// How many times an interrupted upload session is resumed
    pub const UPLOAD_RESUME_ATTEMPTS: u32 = 3;
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    telegram_token: Option<String>,
    google_token_b64: Option<String>,
    google_creds_b64: Option<String>,
    download_dir: Option<PathBuf>,
    port: Option<u16>,
    bot_api_url: Option<String>,
    drive_api_url: Option<String>,
    request_timeout_secs: Option<u64>,
    upload_chunk_size: Option<usize>,
    upload_resume_attempts: Option<u32>,
    log_file_path: Option<PathBuf>,
}

/// Fully resolved configuration
#[derive(Debug)]
pub struct Config {
    /// Bot token (TELEGRAM_TOKEN, BOT_TOKEN or TELOXIDE_TOKEN)
    pub telegram_token: SecretString,
    /// Base64 authorized-user JSON (GOOGLE_TOKEN_B64)
    pub google_token_b64: Option<SecretString>,
    /// Base64 OAuth client JSON (GOOGLE_CREDS_B64)
    pub google_creds_b64: Option<SecretString>,
    pub download_dir: PathBuf,
    pub port: u16,
    /// Custom Bot API server (e.g. a local telegram-bot-api)
    pub bot_api_url: Option<url::Url>,
    pub drive_api_url: url::Url,
    pub request_timeout: Duration,
    pub upload_chunk_size: usize,
    pub upload_resume_attempts: u32,
    pub log_file_path: Option<PathBuf>,
}

impl Config {
    /// Layered provider. Exposed so tests can extract from a jailed environment.
    pub fn figment() -> Figment {
        let token_alias = |var: &'static str| Env::raw().only(&[var]).map(|_| "telegram_token".into());

        Figment::new()
            .merge(Toml::file(CONFIG_FILE))
            .merge(token_alias("TELOXIDE_TOKEN"))
            .merge(token_alias("BOT_TOKEN"))
            .merge(Env::raw().only(ENV_KEYS))
    }

    /// Loads configuration from the default providers.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let raw: RawConfig = figment.extract()?;

        let telegram_token = raw
            .telegram_token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ConfigError::Invalid("TELEGRAM_TOKEN is not set".to_string()))?;

        let bot_api_url = raw
            .bot_api_url
            .filter(|u| !u.trim().is_empty())
            .map(|u| url::Url::parse(&u).map_err(|e| ConfigError::Invalid(format!("BOT_API_URL: {}", e))))
            .transpose()?;

        let drive_api_url = url::Url::parse(raw.drive_api_url.as_deref().unwrap_or(defaults::DRIVE_API_URL))
            .map_err(|e| ConfigError::Invalid(format!("DRIVE_API_URL: {}", e)))?;

        let upload_chunk_size = raw.upload_chunk_size.unwrap_or(defaults::UPLOAD_CHUNK_SIZE);
        if upload_chunk_size == 0 || upload_chunk_size % UPLOAD_CHUNK_GRANULARITY != 0 {
            return Err(ConfigError::Invalid(format!(
                "UPLOAD_CHUNK_SIZE must be a positive multiple of {} bytes, got {}",
                UPLOAD_CHUNK_GRANULARITY, upload_chunk_size
            )));
        }

        Ok(Self {
            telegram_token: SecretString::from(telegram_token),
            google_token_b64: raw.google_token_b64.filter(|v| !v.is_empty()).map(SecretString::from),
            google_creds_b64: raw.google_creds_b64.filter(|v| !v.is_empty()).map(SecretString::from),
            download_dir: raw
                .download_dir
                .unwrap_or_else(|| PathBuf::from(defaults::DOWNLOAD_DIR)),
            port: raw.port.unwrap_or(defaults::PORT),
            bot_api_url,
            drive_api_url,
            request_timeout: Duration::from_secs(raw.request_timeout_secs.unwrap_or(defaults::REQUEST_TIMEOUT_SECS)),
            upload_chunk_size,
            upload_resume_attempts: raw.upload_resume_attempts.unwrap_or(defaults::UPLOAD_RESUME_ATTEMPTS),
            log_file_path: raw.log_file_path,
        })
    }
}
