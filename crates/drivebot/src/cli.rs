use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "drivebot")]
#[command(author, version, about = "Telegram bot that uploads the files you send into a Google Drive folder", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (the default when no command is given)
    Run,

    /// Decode the Google credentials and fetch an access token, then exit
    CheckCredentials,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
