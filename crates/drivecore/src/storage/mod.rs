//! Remote file storage seam and the Google Drive implementation

mod drive;
pub mod query;

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::core::error::StorageError;

pub use drive::{DriveClient, DriveClientBuilder};

/// Mime type Drive uses for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Identifier of a remote folder
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct FolderId(pub String);

/// Identifier of an uploaded remote file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct UploadedFileId(pub String);

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UploadedFileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A folder returned by the lookup query
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteFolder {
    pub id: FolderId,
    pub name: String,
}

impl UploadedFileId {
    /// Direct link to the object in the Drive web UI
    pub fn view_link(&self) -> String {
        format!("https://drive.google.com/file/d/{}/view", self.0)
    }
}

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Folders whose name equals `name` exactly, excluding trashed ones,
    /// in the order the service returns them.
    async fn list_folders(&self, name: &str) -> Result<Vec<RemoteFolder>, StorageError>;

    /// Creates a folder and returns its generated id.
    async fn create_folder(&self, name: &str) -> Result<FolderId, StorageError>;

    /// Uploads `local_path` as `name` under `parent`.
    async fn upload_file(&self, local_path: &Path, name: &str, parent: &FolderId)
        -> Result<UploadedFileId, StorageError>;
}
