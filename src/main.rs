mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nudge::config::NudgeConfig;

#[derive(Parser)]
#[command(name = "nudge", version, about = "Household reminder assistant")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read messages from stdin and schedule reminders
    Listen {
        /// Treat every message as coming from this family member
        #[arg(long)]
        sender: Option<String>,
        /// Skip the semantic parser and use the rule-based parser only
        #[arg(long)]
        fallback_only: bool,
    },
    /// Resolve a message without scheduling it and print the result
    Parse {
        /// The message text
        #[arg(required = true)]
        text: Vec<String>,
        /// Skip the semantic parser and use the rule-based parser only
        #[arg(long)]
        fallback_only: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = NudgeConfig::load()?;

    // Log to stderr so stdout stays clean for spoken output.
    let filter = EnvFilter::try_new(&config.logging.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Listen {
            sender,
            fallback_only,
        } => {
            cli::listen::listen(&config, sender.as_deref(), fallback_only).await?;
        }
        Command::Parse {
            text,
            fallback_only,
        } => {
            cli::parse::parse(&config, &text.join(" "), fallback_only).await?;
        }
    }

    Ok(())
}
