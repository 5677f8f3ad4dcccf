use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::Instrument;

use super::messages;
use super::scratch::ScratchFile;
use crate::core::error::{GatewayError, StorageError};
use crate::gateway::MessagingGateway;
use crate::session::{SessionKey, SessionStore};
use crate::storage::{FolderId, StorageService, UploadedFileId};

/// Name used when the transport gives none
pub const FALLBACK_FILE_NAME: &str = "file";

/// A file attached to an inbound chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFile {
    pub remote_file_id: String,
    pub display_name: Option<String>,
}

impl InboundFile {
    pub fn new(remote_file_id: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            remote_file_id: remote_file_id.into(),
            display_name,
        }
    }

    /// Display name, or `"file"` when the transport sent none.
    pub fn effective_name(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => FALLBACK_FILE_NAME,
        }
    }
}

/// Steps of one run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingFolder,
    Downloading,
    ResolvingFolder,
    Uploading,
    Reporting,
    Cleanup,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::AwaitingFolder => "awaiting_folder",
            Phase::Downloading => "downloading",
            Phase::ResolvingFolder => "resolving_folder",
            Phase::Uploading => "uploading",
            Phase::Reporting => "reporting",
            Phase::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// Terminal state of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No folder selected; nothing was downloaded
    Rejected,
    Uploaded { file_id: UploadedFileId, link: String },
    DownloadFailed { error: String },
    UploadFailed { error: String },
}

/// Failure of a step after the precondition check
enum StepError {
    Download(GatewayError),
    Upload(StorageError),
}

/// Drives one file from the chat into the selected Drive folder.
///
/// Runs are independent: each one reads the session's folder once, owns
/// its scratch file and reports back to the chat it came from.
pub struct UploadOrchestrator {
    sessions: SessionStore,
    gateway: Arc<dyn MessagingGateway>,
    storage: Arc<dyn StorageService>,
    scratch_dir: PathBuf,
}

impl UploadOrchestrator {
    pub fn new(
        sessions: SessionStore,
        gateway: Arc<dyn MessagingGateway>,
        storage: Arc<dyn StorageService>,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            sessions,
            gateway,
            storage,
            scratch_dir: scratch_dir.into(),
        }
    }

    pub async fn run(&self, session: SessionKey, file: InboundFile) -> RunOutcome {
        let span = tracing::info_span!("upload_run", session = %session, file_id = %file.remote_file_id);
        self.run_phases(session, file).instrument(span).await
    }

    async fn run_phases(&self, session: SessionKey, file: InboundFile) -> RunOutcome {
        log::debug!("phase {}", Phase::AwaitingFolder);
        let Some(folder) = self.sessions.folder(session) else {
            log::info!("File from {} rejected: no folder selected", session);
            self.reply(session, messages::FOLDER_REQUIRED).await;
            return RunOutcome::Rejected;
        };

        let name = file.effective_name().to_string();
        let scratch = ScratchFile::new(&self.scratch_dir, session, &name);

        let result = self.relay(session, &file, &folder, &name, &scratch).await;

        log::debug!("phase {}", Phase::Reporting);
        let outcome = match result {
            Ok(file_id) => {
                let link = file_id.view_link();
                log::info!("Uploaded {:?} to folder {:?}: {}", name, folder, link);
                self.reply(session, &messages::uploaded(&link)).await;
                RunOutcome::Uploaded { file_id, link }
            }
            Err(StepError::Download(e)) => {
                log::error!("Download of {} failed: {}", file.remote_file_id, e);
                let error = e.to_string();
                self.reply(session, &messages::download_failed(&error)).await;
                RunOutcome::DownloadFailed { error }
            }
            Err(StepError::Upload(e)) => {
                log::error!("Upload of {:?} to folder {:?} failed: {}", name, folder, e);
                let error = e.to_string();
                self.reply(session, &messages::upload_failed(&error)).await;
                RunOutcome::UploadFailed { error }
            }
        };

        log::debug!("phase {}", Phase::Cleanup);
        scratch.remove().await;
        outcome
    }

    async fn relay(
        &self,
        session: SessionKey,
        file: &InboundFile,
        folder: &str,
        name: &str,
        scratch: &ScratchFile,
    ) -> Result<UploadedFileId, StepError> {
        log::debug!("phase {}", Phase::Downloading);
        self.reply(session, messages::DOWNLOAD_STARTED).await;
        let location = self
            .gateway
            .file_location(&file.remote_file_id)
            .await
            .map_err(StepError::Download)?;
        let bytes = self
            .gateway
            .download(&location, scratch.path())
            .await
            .map_err(StepError::Download)?;
        log::info!("Downloaded {:?} ({} bytes)", name, bytes);

        log::debug!("phase {}", Phase::ResolvingFolder);
        self.reply(session, messages::UPLOAD_STARTED).await;
        let parent = self.resolve_folder(folder).await.map_err(StepError::Upload)?;

        log::debug!("phase {}", Phase::Uploading);
        self.storage
            .upload_file(scratch.path(), name, &parent)
            .await
            .map_err(StepError::Upload)
    }

    /// First folder with the exact name, created when none exists.
    ///
    /// Two runs resolving the same missing name at once can both create it;
    /// later runs then pick whichever the service lists first.
    async fn resolve_folder(&self, name: &str) -> Result<FolderId, StorageError> {
        let existing = self.storage.list_folders(name).await?;
        if let Some(found) = existing.into_iter().next() {
            log::debug!("Using existing folder {:?} ({})", name, found.id);
            return Ok(found.id);
        }

        log::info!("Folder {:?} not found, creating it", name);
        self.storage.create_folder(name).await
    }

    /// Best-effort reply; a failed send never changes the run.
    async fn reply(&self, session: SessionKey, text: &str) {
        if let Err(e) = self.gateway.send_text(session, text).await {
            log::warn!("Failed to send reply to {}: {}", session, e);
        }
    }
}
