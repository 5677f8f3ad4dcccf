//! Configuration, errors and logging shared by the library and the bot

pub mod config;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use config::Config;
pub use error::{AppError, AppResult, ConfigError, CredentialError, GatewayError, StorageError};
pub use logging::init_logger;
