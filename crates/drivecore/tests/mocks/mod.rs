//! In-process fakes for the gateway and storage seams
//!
//! Both record every call so tests can assert on side effects as well as
//! on the replies a chat would have seen.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use drivecore::core::error::{GatewayError, StorageError};
use drivecore::gateway::{FileLocation, MessagingGateway};
use drivecore::session::SessionKey;
use drivecore::storage::{FolderId, RemoteFolder, StorageService, UploadedFileId};

/// Gateway that serves fixed bytes and records replies
#[derive(Default)]
pub struct RecordingGateway {
    content: Vec<u8>,
    download_error: Option<String>,
    lookup_error: Option<String>,
    fail_replies: bool,
    replies: Mutex<Vec<(SessionKey, String)>>,
    downloaded_to: Mutex<Vec<PathBuf>>,
    lookups: AtomicUsize,
}

impl RecordingGateway {
    pub fn serving(content: &[u8]) -> Self {
        Self {
            content: content.to_vec(),
            ..Self::default()
        }
    }

    /// Lookups succeed, the download itself fails after writing a partial file.
    pub fn failing_download(error: &str) -> Self {
        Self {
            content: b"partial".to_vec(),
            download_error: Some(error.to_string()),
            ..Self::default()
        }
    }

    /// The file lookup itself fails, nothing is written.
    pub fn failing_lookup(error: &str) -> Self {
        Self {
            lookup_error: Some(error.to_string()),
            ..Self::default()
        }
    }

    /// Every `send_text` call fails.
    pub fn with_failing_replies(mut self) -> Self {
        self.fail_replies = true;
        self
    }

    pub fn replies(&self) -> Vec<String> {
        self.replies.lock().unwrap().iter().map(|(_, text)| text.clone()).collect()
    }

    pub fn replies_to(&self, session: SessionKey) -> Vec<String> {
        self.replies
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, _)| *key == session)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn downloaded_paths(&self) -> Vec<PathBuf> {
        self.downloaded_to.lock().unwrap().clone()
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn file_location(&self, remote_file_id: &str) -> Result<FileLocation, GatewayError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.lookup_error {
            return Err(GatewayError::Request(error.clone()));
        }
        Ok(FileLocation {
            path: format!("documents/{}", remote_file_id),
            size: Some(self.content.len() as u64),
        })
    }

    async fn download(&self, _location: &FileLocation, local_path: &Path) -> Result<u64, GatewayError> {
        self.downloaded_to.lock().unwrap().push(local_path.to_path_buf());
        tokio::fs::write(local_path, &self.content).await?;

        match &self.download_error {
            Some(error) => Err(GatewayError::Request(error.clone())),
            None => Ok(self.content.len() as u64),
        }
    }

    async fn send_text(&self, session: SessionKey, text: &str) -> Result<(), GatewayError> {
        self.replies.lock().unwrap().push((session, text.to_string()));
        if self.fail_replies {
            return Err(GatewayError::Request("Forbidden: bot was blocked by the user".to_string()));
        }
        Ok(())
    }
}

/// An upload as the fake storage saw it
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub local_path: PathBuf,
    pub name: String,
    pub parent: FolderId,
    pub content: Vec<u8>,
}

/// Storage with an in-memory folder list
#[derive(Default)]
pub struct FakeStorage {
    folders: Mutex<Vec<RemoteFolder>>,
    upload_error: Option<String>,
    created: Mutex<Vec<String>>,
    uploads: Mutex<Vec<RecordedUpload>>,
    lists: AtomicUsize,
}

impl FakeStorage {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_folder(self, id: &str, name: &str) -> Self {
        self.folders.lock().unwrap().push(RemoteFolder {
            id: FolderId(id.to_string()),
            name: name.to_string(),
        });
        self
    }

    pub fn failing_uploads(mut self, message: &str) -> Self {
        self.upload_error = Some(message.to_string());
        self
    }

    pub fn created_folders(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageService for FakeStorage {
    async fn list_folders(&self, name: &str) -> Result<Vec<RemoteFolder>, StorageError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .folders
            .lock()
            .unwrap()
            .iter()
            .filter(|folder| folder.name == name)
            .cloned()
            .collect())
    }

    async fn create_folder(&self, name: &str) -> Result<FolderId, StorageError> {
        let mut created = self.created.lock().unwrap();
        created.push(name.to_string());
        let id = FolderId(format!("created-{}", created.len()));

        self.folders.lock().unwrap().push(RemoteFolder {
            id: id.clone(),
            name: name.to_string(),
        });
        Ok(id)
    }

    async fn upload_file(
        &self,
        local_path: &Path,
        name: &str,
        parent: &FolderId,
    ) -> Result<UploadedFileId, StorageError> {
        let content = tokio::fs::read(local_path).await?;
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(RecordedUpload {
            local_path: local_path.to_path_buf(),
            name: name.to_string(),
            parent: parent.clone(),
            content,
        });

        if let Some(message) = &self.upload_error {
            return Err(StorageError::Api {
                status: reqwest::StatusCode::FORBIDDEN,
                message: message.clone(),
            });
        }
        Ok(UploadedFileId(format!("uploaded-{}", uploads.len())))
    }
}
