use std::path::PathBuf;

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};

/// Top-level CLI entry point.
#[derive(Debug, Parser)]
#[command(
    name = "kalesma",
    version,
    author,
    about = "Invitation deck and video generator backed by the Gemini API"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    /// Increase logging verbosity (-v, -vv, -vvv).
    #[arg(global = true, short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            command: None,
            verbose: 0,
        }
    }
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn print_help() {
        let mut cmd = Cli::command();
        let _ = cmd.print_help();
        println!();
    }
}

/// Supported subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate an invitation deck and video from event details.
    Generate(GenerateArgs),
    /// Save the Gemini API key for later runs.
    Auth(AuthArgs),
}

/// Event details and uploads for one generation run.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Event category: retirement, birthday, wedding, or corporate.
    #[arg(long, default_value = "retirement")]
    pub category: String,
    /// Event name or title, e.g. "Felicitation Ceremony for Ramesh Kumar".
    #[arg(long = "event-name")]
    pub event_name: String,
    /// Honoree or subject name.
    #[arg(long, default_value = "")]
    pub recipient: String,
    /// Achievement or reason for celebration.
    #[arg(long, default_value = "")]
    pub designation: String,
    /// Typed invitation message; replaced by the message file's text when one
    /// is supplied and transcribes to something non-empty.
    #[arg(long, default_value = "")]
    pub message: String,
    /// Image or PDF to transcribe into the invitation message.
    #[arg(long = "message-file", value_name = "FILE")]
    pub message_file: Option<PathBuf>,
    /// Visual image for the invitation (repeatable; at least one required).
    #[arg(long = "image", value_name = "IMAGE")]
    pub images: Vec<PathBuf>,
    /// Event date, e.g. "Saturday, 30th August 2025".
    #[arg(long, default_value = "")]
    pub date: String,
    /// Event time, e.g. "12pm onwards".
    #[arg(long, default_value = "")]
    pub time: String,
    /// Event venue.
    #[arg(long, default_value = "")]
    pub venue: String,
    /// Who the invitation is from.
    #[arg(long, default_value = "")]
    pub host: String,
    /// Directory to export the generated deck into.
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,
    /// Stop after slide generation; do not render a video.
    #[arg(long)]
    pub skip_video: bool,
}

#[derive(Debug, Args)]
pub struct AuthArgs;
