//! drivebot - Telegram front end for drivedrop
//!
//! # Module Structure
//!
//! - `cli`: command line
//! - `telegram`: bot setup, handlers and the messaging gateway
//! - `web_server`: liveness endpoint

pub mod cli;
pub mod telegram;
pub mod web_server;

pub use telegram::{create_bot, schema, setup_bot_commands, HandlerDeps, TelegramGateway};
