//! Telegram front end: bot setup, dispatcher schema and the gateway

pub mod bot;
pub mod gateway;
pub mod handlers;

pub use bot::{create_bot, setup_bot_commands, Command};
pub use gateway::TelegramGateway;
pub use handlers::{schema, HandlerDeps, HandlerError};

/// Bot client used throughout the front end
pub type Bot = teloxide::Bot;
