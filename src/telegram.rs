use std::time::Duration;

use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::bot::AuctionBot;
use crate::error::TelegramError;
use crate::settings::Settings;

const RETRY_PAUSE: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(default)]
    pub description: Option<String>,
    pub result: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub channel_post: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl Update {
    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref().or(self.channel_post.as_ref())
    }
}

/// Minimal Bot API client: long polling and plain replies.
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(base_url: String, poll_timeout_secs: u64) -> Result<Self, TelegramError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs + 10))
            .build()?;
        Ok(Self { http, base_url })
    }

    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
        limit: usize,
    ) -> Result<UpdateBatch, TelegramError> {
        let mut query = vec![
            ("timeout", timeout_secs.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }
        let resp: ApiResponse<Vec<serde_json::Value>> = self
            .http
            .get(format!("{}/getUpdates", self.base_url))
            .query(&query)
            .send()
            .await?
            .json()
            .await?;
        Ok(decode_updates(into_result(resp)?))
    }

    /// Send as Markdown; if Telegram rejects the markup, resend as plain text.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<(), TelegramError> {
        let mut payload = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });
        if let Some(id) = reply_to {
            payload["reply_to_message_id"] = json!(id);
            payload["allow_sending_without_reply"] = json!(true);
        }
        match self.post_message(&payload).await {
            Err(e) => match markdown_fallback(&e, &payload) {
                Some(plain) => {
                    debug!(chat_id, reason = %e, "Markdown rejected, resending as plain text");
                    self.post_message(&plain).await
                }
                None => Err(e),
            },
            ok => ok,
        }
    }

    async fn post_message(&self, payload: &serde_json::Value) -> Result<(), TelegramError> {
        let resp: ApiResponse<serde_json::Value> = self
            .http
            .post(format!("{}/sendMessage", self.base_url))
            .json(payload)
            .send()
            .await?
            .json()
            .await?;
        into_result(resp).map(|_| ())
    }
}

/// Updates that decoded, plus the offset that acknowledges the whole batch.
#[derive(Debug, Default)]
pub struct UpdateBatch {
    pub updates: Vec<Update>,
    pub next_offset: Option<i64>,
}

/// Decode each update on its own so one malformed item cannot stall the offset.
fn decode_updates(raw: Vec<serde_json::Value>) -> UpdateBatch {
    let mut batch = UpdateBatch::default();
    for value in raw {
        let id = value.get("update_id").and_then(serde_json::Value::as_i64);
        if let Some(id) = id {
            batch.next_offset = Some(batch.next_offset.map_or(id + 1, |o| o.max(id + 1)));
        }
        match serde_json::from_value::<Update>(value) {
            Ok(update) => batch.updates.push(update),
            Err(e) => warn!(update_id = ?id, "Skipping undecodable update: {}", e),
        }
    }
    batch
}

/// Plain-text copy of `payload` when Telegram refused its Markdown entities.
fn markdown_fallback(err: &TelegramError, payload: &serde_json::Value) -> Option<serde_json::Value> {
    let TelegramError::Api(reason) = err else {
        return None;
    };
    if !reason.contains("can't parse entities") {
        return None;
    }
    let mut plain = payload.clone();
    plain.as_object_mut()?.remove("parse_mode")?;
    Some(plain)
}

fn into_result<T>(resp: ApiResponse<T>) -> Result<T, TelegramError> {
    match resp {
        ApiResponse {
            ok: true,
            result: Some(result),
            ..
        } => Ok(result),
        ApiResponse { description, .. } => Err(TelegramError::Api(
            description.unwrap_or_else(|| "ok=false".to_string()),
        )),
    }
}

/// Long-poll until Ctrl-C. Updates are handled one at a time, in order.
pub async fn run(bot: &AuctionBot, settings: &Settings) -> anyhow::Result<()> {
    let client = TelegramClient::new(settings.bot_url()?, settings.poll_timeout_secs)?;
    let mut offset: Option<i64> = None;
    info!(trigger = %settings.trigger, "Bot started, polling for updates");

    loop {
        let poll = client.get_updates(offset, settings.poll_timeout_secs, settings.poll_limit);
        let updates = tokio::select! {
            res = poll => res,
            _ = tokio::signal::ctrl_c() => {
                info!(
                    articles = bot.index().article_count(),
                    records = bot.index().record_count(),
                    "Shutting down"
                );
                return Ok(());
            }
        };

        let batch = match updates {
            Ok(batch) => batch,
            Err(e) => {
                warn!("Telegram poll failed: {}", e);
                tokio::time::sleep(RETRY_PAUSE).await;
                continue;
            }
        };
        if batch.next_offset.is_some() {
            offset = batch.next_offset;
        }

        for update in batch.updates {
            let Some(msg) = update.message() else {
                continue;
            };
            let Some(reply) = bot.handle(msg.text.as_deref(), Local::now()) else {
                continue;
            };
            if let Err(e) = client
                .send_message(msg.chat.id, &reply, Some(msg.message_id))
                .await
            {
                warn!(chat_id = msg.chat.id, "Telegram send failed: {}", e);
            }
        }
    }
}
