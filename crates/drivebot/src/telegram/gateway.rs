//! [`MessagingGateway`] over the Telegram Bot API

use std::path::Path;

use async_trait::async_trait;
use drivecore::core::error::GatewayError;
use drivecore::gateway::{FileLocation, MessagingGateway};
use drivecore::session::SessionKey;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::FileId;
use tokio::io::AsyncWriteExt;

use crate::telegram::Bot;

/// Downloads attachments and sends replies with a shared bot client.
#[derive(Clone)]
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl MessagingGateway for TelegramGateway {
    async fn file_location(&self, remote_file_id: &str) -> Result<FileLocation, GatewayError> {
        let file = self.bot.get_file(FileId(remote_file_id.to_string())).await?;
        log::info!("File info retrieved: path = {}, size = {} bytes", file.path, file.size);

        Ok(FileLocation {
            path: file.path.clone(),
            size: Some(u64::from(file.size)),
        })
    }

    async fn download(&self, location: &FileLocation, local_path: &Path) -> Result<u64, GatewayError> {
        let mut dst = fs_err::tokio::File::create(local_path).await?;
        self.bot.download_file(&location.path, &mut dst).await?;
        dst.flush().await?;

        let written = fs_err::tokio::metadata(local_path).await?.len();
        if let Some(expected) = location.size.filter(|&size| size > 0 && size != written) {
            log::warn!(
                "Downloaded size mismatch for {}: expected {} bytes, got {}",
                location.path,
                expected,
                written
            );
        }
        Ok(written)
    }

    async fn send_text(&self, session: SessionKey, text: &str) -> Result<(), GatewayError> {
        self.bot.send_message(ChatId(session.0), text).await?;
        Ok(())
    }
}
