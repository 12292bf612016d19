use chrono::{DateTime, Local};
use regex::Regex;
use tracing::{debug, info};

use crate::error::CommandError;
use crate::index::{ApplicationIndex, ApplicationRecord};
use crate::parser::{parse_blocks, parse_duration};
use crate::query::{self, Window};

pub const DEFAULT_TRIGGER: &str = "Аукцион";

/// Entry points the chat transport calls: ingest a message or answer a query.
pub struct AuctionBot {
    index: ApplicationIndex,
    keyword: String,
    trigger_re: Regex,
}

impl AuctionBot {
    pub fn new(keyword: &str) -> Result<Self, regex::Error> {
        let trigger_re = Regex::new(&format!(r"^{}\s+\S", regex::escape(keyword)))?;
        Ok(Self {
            index: ApplicationIndex::new(),
            keyword: keyword.to_string(),
            trigger_re,
        })
    }

    pub fn index(&self) -> &ApplicationIndex {
        &self.index
    }

    /// Keyword, whitespace, then at least one non-whitespace character.
    pub fn is_command(&self, text: &str) -> bool {
        self.trigger_re.is_match(text.trim())
    }

    /// Route one inbound message. Only query commands produce a reply.
    pub fn handle(&self, raw_text: Option<&str>, at: DateTime<Local>) -> Option<String> {
        let text = raw_text?;
        if self.is_command(text) {
            return Some(match self.on_command(text, at) {
                Ok(reply) => reply,
                Err(e) => {
                    if let CommandError::InvalidDuration { token } = &e {
                        debug!(%token, "Rejected window token");
                    }
                    e.to_string()
                }
            });
        }
        self.on_text_message(Some(text), at);
        None
    }

    /// Store every complete application in the message, all stamped `received_at`.
    pub fn on_text_message(&self, raw_text: Option<&str>, received_at: DateTime<Local>) -> usize {
        let Some(text) = raw_text else {
            return 0;
        };
        let apps = parse_blocks(text);
        let count = apps.len();
        for app in apps {
            self.index.append(
                &app.article,
                ApplicationRecord {
                    input: app.input,
                    amount: app.amount,
                    timestamp: received_at,
                },
            );
        }
        if count > 0 {
            info!(records = count, "Ingested applications");
        } else {
            debug!("Message carried no complete application");
        }
        count
    }

    /// Answer `KEYWORD <article> [<duration>]`.
    pub fn on_command(&self, raw_text: &str, now: DateTime<Local>) -> Result<String, CommandError> {
        let parts = split_command(raw_text);
        if parts.len() < 2 {
            return Err(CommandError::Usage {
                keyword: self.keyword.clone(),
            });
        }
        let article = parts[1];
        let window = match parts.get(2) {
            Some(token) => {
                let span = parse_duration(token).ok_or_else(|| CommandError::InvalidDuration {
                    token: token.to_string(),
                })?;
                Some(Window::new(span, *token))
            }
            None => None,
        };

        let outcome = query::query(&self.index, article, window.as_ref(), now);
        info!(article, window = ?window.as_ref().map(|w| &w.token), "Answered query");
        Ok(outcome.into_reply())
    }
}

/// Whitespace split into at most three parts; the last keeps the rest of the text.
fn split_command(text: &str) -> Vec<&str> {
    let mut parts = Vec::with_capacity(3);
    let mut rest = text.trim();
    while !rest.is_empty() && parts.len() < 2 {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        parts.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    if !rest.is_empty() {
        parts.push(rest);
    }
    parts
}

// ── Tests ──
