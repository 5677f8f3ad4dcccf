//! Handler types and dependencies

use std::sync::Arc;

use drivecore::relay::UploadOrchestrator;
use drivecore::session::{SessionKey, SessionStore};
use teloxide::types::Message;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub sessions: SessionStore,
    pub orchestrator: Arc<UploadOrchestrator>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(sessions: SessionStore, orchestrator: Arc<UploadOrchestrator>) -> Self {
        Self { sessions, orchestrator }
    }
}

/// Sessions are per chat, so a group shares one folder.
pub fn session_key(msg: &Message) -> SessionKey {
    SessionKey(msg.chat.id.0)
}
