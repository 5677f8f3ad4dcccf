//! File messages: documents, videos and audio start an upload run

use std::sync::Arc;

use drivecore::relay::{messages, InboundFile};
use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::types::{session_key, HandlerDeps, HandlerError};
use crate::telegram::Bot;

/// The attachment an upload run should fetch, if the message carries one.
pub fn inbound_file(msg: &Message) -> Option<InboundFile> {
    if let Some(doc) = msg.document() {
        return Some(InboundFile::new(doc.file.id.0.clone(), doc.file_name.clone()));
    }
    if let Some(video) = msg.video() {
        return Some(InboundFile::new(video.file.id.0.clone(), video.file_name.clone()));
    }
    if let Some(audio) = msg.audio() {
        return Some(InboundFile::new(audio.file.id.0.clone(), audio.file_name.clone()));
    }
    None
}

/// Media the relay does not take: photos, voice notes, round videos, GIFs.
fn is_unsupported_media(msg: &Message) -> bool {
    msg.photo().is_some() || msg.voice().is_some() || msg.video_note().is_some() || msg.animation().is_some()
}

/// Handler for file messages.
///
/// The run is spawned so a slow upload never holds up other chats.
pub(super) fn file_upload_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_map(|msg: Message| inbound_file(&msg))
        .endpoint(move |msg: Message, file: InboundFile| {
            let deps = deps.clone();
            async move {
                let session = session_key(&msg);
                log::info!(
                    "📤 File {:?} ({}) received from chat {}",
                    file.effective_name(),
                    file.remote_file_id,
                    session
                );

                let orchestrator = Arc::clone(&deps.orchestrator);
                tokio::spawn(async move {
                    let outcome = orchestrator.run(session, file).await;
                    log::debug!("Upload run for chat {} finished: {:?}", session, outcome);
                });
                Ok(())
            }
        })
}

/// Handler for media kinds that are not relayed
pub(super) fn unsupported_media_handler() -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| is_unsupported_media(&msg))
        .endpoint(|bot: Bot, msg: Message| async move {
            log::info!("Unsupported media from chat {}", msg.chat.id);
            bot.send_message(msg.chat.id, messages::NO_VALID_FILE).await?;
            Ok(())
        })
}
