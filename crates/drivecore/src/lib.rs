//! drivecore - everything drivedrop does that is not Telegram
//!
//! A chat picks a Google Drive folder by name, then every file it sends is
//! downloaded, uploaded into that folder and answered with a view link.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors and logging
//! - `session`: per-chat folder selection
//! - `gateway`: the chat transport seam
//! - `credentials`: Google OAuth access tokens
//! - `storage`: the storage seam and the Drive REST client
//! - `relay`: the per-file upload run

pub mod core;
pub mod credentials;
pub mod gateway;
pub mod relay;
pub mod session;
pub mod storage;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult, Config};
pub use gateway::{FileLocation, MessagingGateway};
pub use relay::{InboundFile, RunOutcome, UploadOrchestrator};
pub use session::{SessionKey, SessionStore};
pub use storage::{DriveClient, StorageService};
