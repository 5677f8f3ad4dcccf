//! Local copies of files in transit
//!
//! Every run downloads into its own file under the scratch directory:
//! `{session}-{uuid}-{name}`. The name part is reduced to a single path
//! component so a display name like `../../etc/passwd` stays inside the
//! directory, and the uuid keeps two uploads of `report.pdf` apart.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::FALLBACK_FILE_NAME;
use crate::session::SessionKey;

/// Longest name part kept, in bytes
const MAX_NAME_BYTES: usize = 120;

/// Reduces a display name to a safe single file-name component.
pub fn sanitize_file_name(display_name: &str) -> String {
    let last = display_name.rsplit(['/', '\\']).next().unwrap_or_default();
    let mut cleaned: String = last.chars().filter(|c| !c.is_control()).collect();

    if cleaned.len() > MAX_NAME_BYTES {
        let mut cut = MAX_NAME_BYTES;
        while !cleaned.is_char_boundary(cut) {
            cut -= 1;
        }
        cleaned.truncate(cut);
    }

    match cleaned.trim() {
        "" | "." | ".." => FALLBACK_FILE_NAME.to_string(),
        _ => cleaned,
    }
}

/// A scratch file owned by one run.
///
/// Call [`ScratchFile::remove`] when the run is over. If the guard is
/// dropped without it (a panic mid-run), the file is removed synchronously.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    removed: bool,
}

impl ScratchFile {
    pub fn new(dir: &Path, session: SessionKey, display_name: &str) -> Self {
        let name = format!("{}-{}-{}", session, Uuid::new_v4(), sanitize_file_name(display_name));
        Self {
            path: dir.join(name),
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the file if it exists. Failures are logged, never returned.
    pub async fn remove(mut self) {
        self.removed = true;
        match fs_err::tokio::remove_file(&self.path).await {
            Ok(()) => log::debug!("Removed scratch file {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove scratch file: {}", e),
        }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match fs_err::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed scratch file {} on drop", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove scratch file on drop: {}", e),
        }
    }
}
