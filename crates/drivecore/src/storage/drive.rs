//! Google Drive v3 REST client
//!
//! Only the three calls the relay needs: folder lookup, folder creation and
//! a resumable upload. Uploads go out in fixed-size chunks; if a chunk is
//! lost to a network error or a 5xx, the client asks the upload session how
//! many bytes it committed and continues from there.

use std::io::SeekFrom;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_RANGE, CONTENT_TYPE, LOCATION, RANGE};
use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use url::Url;

use super::{query, FolderId, RemoteFolder, StorageService, UploadedFileId, FOLDER_MIME_TYPE};
use crate::core::config::{self, Config, UPLOAD_CHUNK_GRANULARITY};
use crate::core::error::StorageError;
use crate::credentials::CredentialProvider;

const FILES_PATH: &str = "drive/v3/files";
const UPLOAD_PATH: &str = "upload/drive/v3/files";

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<RemoteFolder>,
}

#[derive(Debug, Deserialize)]
struct CreatedObject {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Outcome of one request against an open upload session
enum SessionState {
    /// Bytes `[0, committed)` are stored; send the rest
    Incomplete { committed: u64 },
    Complete(UploadedFileId),
}

pub struct DriveClientBuilder {
    api_base: Option<Url>,
    credentials: Arc<dyn CredentialProvider>,
    timeout: Duration,
    chunk_size: usize,
    resume_attempts: u32,
}

impl DriveClientBuilder {
    /// Root of the Google APIs host, e.g. `https://www.googleapis.com`.
    #[must_use]
    pub fn api_base(mut self, api_base: Url) -> Self {
        self.api_base = Some(api_base);
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Upload chunk size, rounded up to the 256 KiB granularity Drive requires.
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        let chunks = chunk_size.div_ceil(UPLOAD_CHUNK_GRANULARITY).max(1);
        self.chunk_size = chunks * UPLOAD_CHUNK_GRANULARITY;
        self
    }

    #[must_use]
    pub fn resume_attempts(mut self, attempts: u32) -> Self {
        self.resume_attempts = attempts;
        self
    }

    pub fn build(self) -> Result<DriveClient, StorageError> {
        // 308 is "resume incomplete" in the upload protocol, never a redirect
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        let mut api_base = match self.api_base {
            Some(url) => url,
            None => Url::parse(config::defaults::DRIVE_API_URL).map_err(|e| StorageError::Api {
                status: StatusCode::BAD_REQUEST,
                message: format!("invalid API base: {}", e),
            })?,
        };
        if !api_base.path().ends_with('/') {
            let path = format!("{}/", api_base.path());
            api_base.set_path(&path);
        }

        Ok(DriveClient {
            http,
            api_base,
            credentials: self.credentials,
            chunk_size: self.chunk_size,
            resume_attempts: self.resume_attempts,
        })
    }
}

/// [`StorageService`] backed by the Drive REST API
pub struct DriveClient {
    http: reqwest::Client,
    api_base: Url,
    credentials: Arc<dyn CredentialProvider>,
    chunk_size: usize,
    resume_attempts: u32,
}

impl DriveClient {
    pub fn builder(credentials: Arc<dyn CredentialProvider>) -> DriveClientBuilder {
        DriveClientBuilder {
            api_base: None,
            credentials,
            timeout: Duration::from_secs(config::defaults::REQUEST_TIMEOUT_SECS),
            chunk_size: config::defaults::UPLOAD_CHUNK_SIZE,
            resume_attempts: config::defaults::UPLOAD_RESUME_ATTEMPTS,
        }
    }

    pub fn from_config(config: &Config, credentials: Arc<dyn CredentialProvider>) -> Result<Self, StorageError> {
        Self::builder(credentials)
            .api_base(config.drive_api_url.clone())
            .timeout(config.request_timeout)
            .chunk_size(config.upload_chunk_size)
            .resume_attempts(config.upload_resume_attempts)
            .build()
    }

    fn endpoint(&self, path: &str) -> Result<Url, StorageError> {
        self.api_base.join(path).map_err(|e| StorageError::Api {
            status: StatusCode::BAD_REQUEST,
            message: format!("invalid endpoint {}: {}", path, e),
        })
    }

    async fn bearer(&self) -> Result<SecretString, StorageError> {
        Ok(self.credentials.access_token().await?)
    }

    /// Opens a resumable session and returns its URI.
    async fn start_session(&self, name: &str, parent: &FolderId, total: u64) -> Result<Url, StorageError> {
        let token = self.bearer().await?;
        let response = self
            .http
            .post(self.endpoint(UPLOAD_PATH)?)
            .bearer_auth(token.expose_secret())
            .query(&[("uploadType", "resumable"), ("fields", "id")])
            .header("X-Upload-Content-Length", total.to_string())
            .json(&json!({ "name": name, "parents": [parent.0] }))
            .send()
            .await?;
        let response = check(response).await?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(StorageError::MissingUploadLocation)?;
        Url::parse(location).map_err(|_| StorageError::MissingUploadLocation)
    }

    /// Sends `[offset, offset + len)` of the file.
    async fn put_chunk(
        &self,
        session: &Url,
        file: &mut fs_err::tokio::File,
        offset: u64,
        total: u64,
    ) -> Result<SessionState, StorageError> {
        let remaining = total - offset;
        let len = remaining.min(self.chunk_size as u64);

        let mut buf = vec![0u8; len as usize];
        file.seek(SeekFrom::Start(offset)).await?;
        file.read_exact(&mut buf).await?;

        let content_range = if total == 0 {
            "bytes */0".to_string()
        } else {
            format!("bytes {}-{}/{}", offset, offset + len - 1, total)
        };
        log::debug!("Drive upload chunk: {}", content_range);

        let response = self
            .http
            .put(session.clone())
            .header(CONTENT_RANGE, content_range)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(buf)
            .send()
            .await?;
        session_state(response).await
    }

    /// Asks the session how much it has committed.
    async fn query_session(&self, session: &Url, total: u64) -> Result<SessionState, StorageError> {
        let response = self
            .http
            .put(session.clone())
            .header(CONTENT_RANGE, format!("bytes */{}", total))
            .body(Vec::new())
            .send()
            .await?;
        session_state(response).await
    }
}

#[async_trait]
impl StorageService for DriveClient {
    async fn list_folders(&self, name: &str) -> Result<Vec<RemoteFolder>, StorageError> {
        let token = self.bearer().await?;
        let q = query::folder_by_name(name);

        let response = self
            .http
            .get(self.endpoint(FILES_PATH)?)
            .bearer_auth(token.expose_secret())
            .query(&[("q", q.as_str()), ("spaces", "drive"), ("fields", "files(id, name)")])
            .send()
            .await?;
        let list: FileList = check(response).await?.json().await?;

        log::debug!("Drive folder lookup {:?}: {} match(es)", name, list.files.len());
        Ok(list.files)
    }

    async fn create_folder(&self, name: &str) -> Result<FolderId, StorageError> {
        let token = self.bearer().await?;

        let response = self
            .http
            .post(self.endpoint(FILES_PATH)?)
            .bearer_auth(token.expose_secret())
            .query(&[("fields", "id")])
            .json(&json!({ "name": name, "mimeType": FOLDER_MIME_TYPE }))
            .send()
            .await?;
        let created: CreatedObject = check(response).await?.json().await?;

        let id = created.id.ok_or(StorageError::MissingId("folder"))?;
        log::info!("Created Drive folder {:?} ({})", name, id);
        Ok(FolderId(id))
    }

    async fn upload_file(
        &self,
        local_path: &Path,
        name: &str,
        parent: &FolderId,
    ) -> Result<UploadedFileId, StorageError> {
        let total = fs_err::tokio::metadata(local_path).await?.len();
        let session = self.start_session(name, parent, total).await?;
        log::info!("Drive upload session opened for {:?} ({} bytes)", name, total);

        let mut file = fs_err::tokio::File::open(local_path).await?;
        let mut offset = 0u64;
        let mut resumes = 0u32;

        loop {
            let (state, queried) = match self.put_chunk(&session, &mut file, offset, total).await {
                Ok(state) => (state, false),
                Err(err) if is_resumable(&err) && resumes < self.resume_attempts => {
                    resumes += 1;
                    log::warn!(
                        "Drive upload of {:?} interrupted at byte {} ({}), resuming ({}/{})",
                        name,
                        offset,
                        err,
                        resumes,
                        self.resume_attempts
                    );
                    (self.query_session(&session, total).await?, true)
                }
                Err(err) => return Err(err),
            };

            match state {
                SessionState::Complete(id) => {
                    log::info!("Drive upload of {:?} complete: {}", name, id);
                    return Ok(id);
                }
                SessionState::Incomplete { committed } => {
                    if committed >= total {
                        // Everything is stored but the session has not produced the object
                        return Err(StorageError::Interrupted { offset: committed, total });
                    }
                    // A chunk the session did not take counts as a failed attempt
                    if !queried && committed <= offset {
                        if resumes >= self.resume_attempts {
                            return Err(StorageError::Interrupted { offset: committed, total });
                        }
                        resumes += 1;
                        log::warn!(
                            "Drive upload of {:?} made no progress past byte {}, retrying ({}/{})",
                            name,
                            committed,
                            resumes,
                            self.resume_attempts
                        );
                    }
                    offset = committed;
                }
            }
        }
    }
}

/// Network failures and server-side errors leave the session resumable.
fn is_resumable(err: &StorageError) -> bool {
    match err {
        StorageError::Http(e) => !e.is_builder() && !e.is_decode(),
        StorageError::Api { status, .. } => status.is_server_error(),
        _ => false,
    }
}

async fn session_state(response: Response) -> Result<SessionState, StorageError> {
    if response.status() == StatusCode::PERMANENT_REDIRECT {
        let committed = response
            .headers()
            .get(RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_committed)
            .unwrap_or(0);
        return Ok(SessionState::Incomplete { committed });
    }

    let created: CreatedObject = check(response).await?.json().await?;
    let id = created.id.ok_or(StorageError::MissingId("file"))?;
    Ok(SessionState::Complete(UploadedFileId(id)))
}

/// `bytes=0-524287` → 524288
fn parse_committed(range: &str) -> Option<u64> {
    let last = range.strip_prefix("bytes=")?.split('-').nth(1)?;
    last.trim().parse::<u64>().ok().map(|end| end + 1)
}

async fn check(response: Response) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => status.canonical_reason().unwrap_or("no details").to_string(),
        Err(_) => body,
    };
    Err(StorageError::Api { status, message })
}
