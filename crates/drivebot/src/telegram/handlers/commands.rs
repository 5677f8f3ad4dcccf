//! Command handler implementations (/start, /help, /folder)

use drivecore::relay::messages;
use teloxide::prelude::*;
use teloxide::types::Message;
use teloxide::utils::command::BotCommands;

use super::types::{session_key, HandlerDeps, HandlerError};
use crate::telegram::{Bot, Command};

/// Handle /start command
pub(super) async fn handle_start_command(bot: &Bot, msg: &Message) -> Result<(), HandlerError> {
    bot.send_message(msg.chat.id, messages::GREETING).await?;
    Ok(())
}

/// Handle /help command
pub(super) async fn handle_help_command(bot: &Bot, msg: &Message) -> Result<(), HandlerError> {
    bot.send_message(msg.chat.id, Command::descriptions().to_string()).await?;
    Ok(())
}

/// Handle /folder command
pub(super) async fn handle_folder_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let folder = deps.sessions.folder(session_key(msg));
    bot.send_message(msg.chat.id, messages::current_folder(folder.as_deref()))
        .await?;
    Ok(())
}
