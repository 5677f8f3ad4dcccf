use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dotenvy::dotenv;
use teloxide::prelude::*;
use teloxide::types::Me;
use tokio::time::sleep;

use drivebot::cli::{Cli, Commands};
use drivebot::telegram::{create_bot, schema, setup_bot_commands, Bot, HandlerDeps, TelegramGateway};
use drivebot::web_server::start_web_server;
use drivecore::core::{init_logger, AppResult, Config};
use drivecore::credentials::{AuthorizedUser, CredentialProvider, Unavailable};
use drivecore::relay::UploadOrchestrator;
use drivecore::session::SessionStore;
use drivecore::storage::DriveClient;

/// Bot API startup probes: 60 * 5s, enough for a local Bot API server to boot
const STARTUP_MAX_RETRIES: u32 = 60;
const STARTUP_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (configuration, logging, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    let config = Config::load()?;
    init_logger(config.log_file_path.as_deref())?;

    match cli.command {
        Some(Commands::CheckCredentials) => Ok(check_credentials(&config).await?),
        Some(Commands::Run) => run_bot(config).await,
        None => {
            log::info!("No command specified, running bot in default mode");
            run_bot(config).await
        }
    }
}

fn google_http_client(config: &Config) -> AppResult<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(config.request_timeout).build()?)
}

/// Decodes the stored credentials and fetches one access token.
async fn check_credentials(config: &Config) -> AppResult<()> {
    let credentials = AuthorizedUser::from_config(config, google_http_client(config)?)?;
    credentials.access_token().await?;

    println!("✅ Google credentials are valid (token endpoint: {})", credentials.token_uri());
    Ok(())
}

/// Credentials for the Drive client.
///
/// Broken credentials do not stop the bot: every upload then fails with
/// the decoding error, which the user sees in the chat.
fn credential_provider(config: &Config, http: reqwest::Client) -> Arc<dyn CredentialProvider> {
    match AuthorizedUser::from_config(config, http) {
        Ok(credentials) => Arc::new(credentials),
        Err(e) => {
            log::error!("Google credentials unavailable, uploads will fail: {}", e);
            Arc::new(Unavailable::new(e.to_string()))
        }
    }
}

/// Drive client, Telegram gateway and session store behind one orchestrator
fn build_orchestrator(config: &Config, bot: &Bot, sessions: SessionStore) -> AppResult<Arc<UploadOrchestrator>> {
    let credentials = credential_provider(config, google_http_client(config)?);
    let storage = Arc::new(DriveClient::from_config(config, credentials)?);
    let gateway = Arc::new(TelegramGateway::new(bot.clone()));

    Ok(Arc::new(UploadOrchestrator::new(
        sessions,
        gateway,
        storage,
        config.download_dir.clone(),
    )))
}

/// Retries `getMe` while the Bot API is still coming up.
async fn connect(bot: &Bot) -> Result<Me> {
    let mut startup_retry = 0;
    loop {
        match bot.get_me().await {
            Ok(me) => return Ok(me),
            Err(e) => {
                let err_str = e.to_string();
                let is_retryable = err_str.contains("restart")
                    || err_str.contains("network")
                    || err_str.contains("connection")
                    || err_str.contains("timed out")
                    || err_str.contains("Connection refused");

                startup_retry += 1;
                if startup_retry >= STARTUP_MAX_RETRIES || !is_retryable {
                    return Err(anyhow::anyhow!(
                        "Failed to connect to Bot API after {} retries: {}",
                        startup_retry,
                        e
                    ));
                }

                log::warn!(
                    "Bot API not ready (attempt {}/{}): {}. Retrying in {} seconds...",
                    startup_retry,
                    STARTUP_MAX_RETRIES,
                    err_str,
                    STARTUP_RETRY_DELAY.as_secs()
                );
                sleep(STARTUP_RETRY_DELAY).await;
            }
        }
    }
}

/// Run the Telegram bot
async fn run_bot(config: Config) -> Result<()> {
    log::info!("Starting bot...");

    fs_err::tokio::create_dir_all(&config.download_dir).await?;
    log::info!("Scratch directory: {}", config.download_dir.display());

    let bot = create_bot(&config)?;
    let me = connect(&bot).await?;
    log::info!("Bot username: {:?}, Bot ID: {}", me.username, me.id);

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let sessions = SessionStore::in_memory();
    let orchestrator = build_orchestrator(&config, &bot, sessions.clone())?;
    let deps = HandlerDeps::new(sessions, orchestrator);

    let port = config.port;
    tokio::spawn(async move {
        if let Err(e) = start_web_server(port).await {
            log::error!("Liveness server stopped: {}", e);
        }
    });

    Dispatcher::builder(bot, schema(deps))
        .enable_ctrlc_handler()
        .error_handler(LoggingErrorHandler::with_custom_text("An error has occurred in the dispatcher"))
        .build()
        .dispatch()
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}
