mod bot;
mod error;
mod index;
mod parser;
mod query;
mod settings;
mod telegram;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::info;

use bot::AuctionBot;
use settings::Settings;

/// Separates messages in a transcript file.
const MESSAGE_SEPARATOR: &str = "---";

#[derive(Parser)]
#[command(name = "auction_bot", about = "Collects auction applications from chat and ranks them by amount")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Telegram bot (needs BOT_TOKEN)
    Run,
    /// Parse one message and print its applications as JSON lines
    Parse {
        /// Message file (default: stdin)
        file: Option<PathBuf>,
    },
    /// Ingest a transcript, then answer one query command offline
    Query {
        /// Transcript file, messages separated by `---` lines
        file: PathBuf,
        /// e.g. "Аукцион С7-00076132 3ч"
        command: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::load().context("Failed to load settings")?;

    match cli.command {
        Commands::Run => {
            settings.require_token()?;
            let bot = AuctionBot::new(&settings.trigger)?;
            telegram::run(&bot, &settings).await
        }
        Commands::Parse { file } => {
            let text = read_input(file.as_deref())?;
            let apps = parser::parse_blocks(&text);
            for app in &apps {
                println!("{}", serde_json::to_string(app)?);
            }
            info!(applications = apps.len(), "Parsed message");
            Ok(())
        }
        Commands::Query { file, command } => {
            let transcript = read_input(Some(&file))?;
            let bot = AuctionBot::new(&settings.trigger)?;
            let now = Local::now();
            let messages = split_transcript(&transcript);
            for message in &messages {
                bot.on_text_message(Some(message), now);
            }
            info!(
                messages = messages.len(),
                records = bot.index().record_count(),
                "Transcript ingested"
            );
            let reply = match bot.on_command(&command, now) {
                Ok(reply) => reply,
                Err(e) => e.to_string(),
            };
            println!("{}", reply);
            Ok(())
        }
    }
}

fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
        }
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

fn split_transcript(text: &str) -> Vec<String> {
    let mut messages = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim() == MESSAGE_SEPARATOR {
            messages.push(current.join("\n"));
            current.clear();
        } else {
            current.push(line);
        }
    }
    messages.push(current.join("\n"));
    messages.retain(|m| !m.trim().is_empty());
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_split() {
        let text = "Input: a\nАртикул: X\nСумма: 1\n---\nпривет\n---\n\n---\nInput: b\nАртикул: X\nСумма: 2\n";
        let messages = split_transcript(text);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], "привет");
    }

    #[test]
    fn transcript_fixture_query() {
        let transcript = std::fs::read_to_string("tests/fixtures/transcript.txt").unwrap();
        let bot = AuctionBot::new(bot::DEFAULT_TRIGGER).unwrap();
        let now = Local::now();
        let added: usize = split_transcript(&transcript)
            .iter()
            .map(|m| bot.on_text_message(Some(m), now))
            .sum();
        assert_eq!(added, 5);
        let reply = bot.on_command("Аукцион С7-00076132 30м", now).unwrap();
        let order: Vec<_> = reply
            .lines()
            .filter_map(|l| l.strip_prefix("  Сумма: "))
            .collect();
        assert_eq!(order, ["15000 ₽", "12500 ₽", "12500 ₽", "9000 ₽"]);
    }
}
