//! Chat transport seam used by the orchestrator.
//!
//! The orchestrator never sees Telegram types: it asks the gateway where a
//! file lives, has it written to a local path and sends plain-text replies.
//! The bot crate implements this on top of teloxide; tests use a recorder.

use std::path::Path;

use async_trait::async_trait;

use crate::core::error::GatewayError;
use crate::session::SessionKey;

/// Where the transport keeps a file, as returned by the lookup step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLocation {
    /// Transport-specific path used for the download request
    pub path: String,
    /// Size reported by the transport, when known
    pub size: Option<u64>,
}

#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Resolves a remote file id to a downloadable location.
    async fn file_location(&self, remote_file_id: &str) -> Result<FileLocation, GatewayError>;

    /// Writes the file at `location` to `local_path`, returning the byte count.
    async fn download(&self, location: &FileLocation, local_path: &Path) -> Result<u64, GatewayError>;

    /// Sends a plain-text reply to the session's chat.
    async fn send_text(&self, session: SessionKey, text: &str) -> Result<(), GatewayError>;
}
