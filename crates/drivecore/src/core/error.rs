use thiserror::Error;

/// Errors raised by the messaging gateway (chat transport).
///
/// A gateway failure while fetching a file is reported to the user as a
/// failed download; a failure while replying is only logged.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The transport rejected or failed the request
    #[error("Telegram request failed: {0}")]
    Request(String),

    /// Writing the downloaded bytes to local disk failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "telegram")]
impl From<teloxide::RequestError> for GatewayError {
    fn from(err: teloxide::RequestError) -> Self {
        GatewayError::Request(err.to_string())
    }
}

#[cfg(feature = "telegram")]
impl From<teloxide::DownloadError> for GatewayError {
    fn from(err: teloxide::DownloadError) -> Self {
        GatewayError::Request(err.to_string())
    }
}

/// Errors raised while obtaining a Google access token.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// A required environment value is absent
    #[error("Missing credential: {0}")]
    Missing(&'static str),

    /// The stored blob is not valid base64
    #[error("Credential decoding failed: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded blob is not the expected JSON document
    #[error("Credential JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),

    /// The token endpoint could not be reached
    #[error("Token refresh request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The stored credentials could not be loaded at startup
    #[error("Credentials unavailable: {0}")]
    Unavailable(String),

    /// The token endpoint answered with an error
    #[error("Token refresh rejected ({status}): {message}")]
    Refresh { status: reqwest::StatusCode, message: String },
}

/// Errors raised by the storage service (Google Drive).
#[derive(Error, Debug)]
pub enum StorageError {
    /// Network-level failure talking to the API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Drive API error ({status}): {message}")]
    Api { status: reqwest::StatusCode, message: String },

    /// A successful response did not carry the expected object id
    #[error("Drive API response is missing the {0} id")]
    MissingId(&'static str),

    /// The resumable session could not be opened
    #[error("Drive API did not return an upload session location")]
    MissingUploadLocation,

    /// The resumable session stopped accepting bytes
    #[error("Upload interrupted at byte {offset} of {total}")]
    Interrupted { offset: u64, total: u64 },

    /// Reading the local file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No usable access token
    #[error("Invalid Google credentials: {0}")]
    Credentials(#[from] CredentialError),
}

/// Configuration extraction errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Extract(#[from] Box<figment::Error>),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Extract(Box::new(err))
    }
}

/// Centralized error type for the application
///
/// Library-level errors convert into this enum so the binary can report
/// them uniformly.
///
/// # Example
///
/// ```no_run
/// use drivecore::core::error::AppResult;
/// use drivecore::core::Config;
///
/// fn scratch_dir() -> AppResult<std::path::PathBuf> {
///     Ok(Config::load()?.download_dir)
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client construction
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
