//! User-facing reply texts

pub const GREETING: &str = "👋 Send me the Google Drive folder name you'd like to use.";

pub const FOLDER_REQUIRED: &str = "⚠️ Please send the folder name first.";

pub const NO_VALID_FILE: &str = "❌ No valid file received.";

pub const DOWNLOAD_STARTED: &str = "📥 Downloading file...";

pub const UPLOAD_STARTED: &str = "📤 Uploading to Google Drive...";

pub fn folder_set(name: &str) -> String {
    format!("✅ Folder set to: {}. Now send a file to upload.", name)
}

pub fn current_folder(name: Option<&str>) -> String {
    match name {
        Some(name) => format!("📁 Current folder: {}", name),
        None => "📁 No folder selected yet. Send me a folder name.".to_string(),
    }
}

pub fn uploaded(link: &str) -> String {
    format!("✅ Uploaded:\n{}", link)
}

pub fn download_failed(error: &str) -> String {
    format!("❌ Download failed: {}", error)
}

pub fn upload_failed(error: &str) -> String {
    format!("❌ Upload failed: {}", error)
}
