//! Dispatcher schema and handler chain builders

use drivecore::relay::messages;
use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::commands::{handle_folder_command, handle_help_command, handle_start_command};
use super::types::{session_key, HandlerDeps, HandlerError};
use super::uploads::{file_upload_handler, unsupported_media_handler};
use crate::telegram::{Bot, Command};

/// Creates the main dispatcher schema for the Telegram bot.
///
/// The same schema is used in production and in integration tests.
///
/// # Arguments
/// * `deps` - Handler dependencies (session store, upload orchestrator)
///
/// # Returns
/// The complete handler tree for the bot
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_uploads = deps.clone();
    let deps_folders = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(file_upload_handler(deps_uploads))
        .branch(unsupported_media_handler())
        // Plain text selects the folder, so it goes last
        .branch(folder_name_handler(deps_folders))
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("🎯 Received command: {:?} from chat {}", cmd, msg.chat.id);

                match cmd {
                    Command::Start => handle_start_command(&bot, &msg).await?,
                    Command::Help => handle_help_command(&bot, &msg).await?,
                    Command::Folder => handle_folder_command(&bot, &msg, &deps).await?,
                }
                Ok(())
            }
        },
    ))
}

/// Any non-command text is taken as the folder name.
fn folder_name_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_map(|msg: Message| {
            msg.text()
                .filter(|text| !text.starts_with('/'))
                .map(|text| text.trim().to_string())
        })
        .endpoint(move |bot: Bot, msg: Message, folder: String| {
            let deps = deps.clone();
            async move {
                deps.sessions.set_folder(session_key(&msg), folder.as_str());
                log::info!("📁 Chat {} selected folder {:?}", msg.chat.id, folder);

                bot.send_message(msg.chat.id, messages::folder_set(&folder)).await?;
                Ok(())
            }
        })
}
