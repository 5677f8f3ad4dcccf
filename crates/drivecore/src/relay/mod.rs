//! File relay: one run per inbound file
//!
//! A run checks that the chat selected a folder, downloads the file into a
//! scratch location, finds or creates the Drive folder, uploads, reports the
//! link (or the error) back to the chat, and deletes the scratch copy.

pub mod messages;
mod orchestrator;
pub mod scratch;

pub use orchestrator::{InboundFile, Phase, RunOutcome, UploadOrchestrator, FALLBACK_FILE_NAME};
pub use scratch::{sanitize_file_name, ScratchFile};
