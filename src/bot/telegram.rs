//! Minimal Telegram Bot API client over the shared hyper client.

use anyhow::{Context, Result};
use bytes::Bytes;
use hyper::{Method, Uri};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::bot::view::Reply;
use crate::config::Telegram;
use crate::http::client::{self, HyperClient, TransportError};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("bot api answered with status {0}")]
    Status(u16),
    #[error("failed to decode bot api response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("bot api error: {0}")]
    Api(String),
    #[error("invalid bot api url: {0}")]
    Url(#[from] hyper::http::uri::InvalidUri),
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

/// Outbound chat operations used by the poller.
#[async_trait::async_trait]
pub trait ChatApi: Send + Sync {
    async fn send_message(&self, chat_id: i64, reply: &Reply) -> Result<(), TelegramError>;
    async fn edit_message(&self, chat_id: i64, message_id: i64, reply: &Reply) -> Result<(), TelegramError>;
    async fn answer_callback(&self, callback_id: &str) -> Result<(), TelegramError>;
}

pub struct TelegramClient {
    client: HyperClient,
    base_url: String,
    poll_timeout: Duration,
    request_timeout: Duration,
}

impl TelegramClient {
    pub fn new(cfg: Option<&Telegram>, client: HyperClient) -> Result<Self> {
        let cfg = cfg.context("telegram configuration is required")?;
        let token = cfg
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .context("telegram.token must be configured")?;
        let api_base = cfg
            .api_base
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/');

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_base, token),
            poll_timeout: cfg.poll_timeout.unwrap_or(DEFAULT_POLL_TIMEOUT),
            request_timeout: cfg.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &Value,
        timeout: Duration,
    ) -> Result<T, TelegramError> {
        let uri: Uri = format!("{}/{}", self.base_url, method).parse()?;
        let body = Bytes::from(serde_json::to_vec(payload)?);
        let headers = [("content-type", "application/json")];

        let (status, body) =
            client::send(&self.client, Method::POST, uri, &headers, Some(body), timeout).await?;

        let envelope: Envelope<T> = match serde_json::from_slice(&body) {
            Ok(envelope) => envelope,
            Err(_) if !(200..300).contains(&status) => return Err(TelegramError::Status(status)),
            Err(e) => return Err(e.into()),
        };
        match envelope {
            Envelope {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            Envelope { description, .. } => Err(TelegramError::Api(
                description.unwrap_or_else(|| format!("status {}", status)),
            )),
        }
    }

    /// Long-polls for updates after `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        let payload = json!({
            "offset": offset,
            "timeout": self.poll_timeout.as_secs(),
            "allowed_updates": ["message", "callback_query"],
        });
        // The request outlives the server-side poll window.
        self.call("getUpdates", &payload, self.poll_timeout + self.request_timeout)
            .await
    }
}

fn reply_markup(reply: &Reply) -> Value {
    match &reply.keyboard {
        Some(rows) => json!({ "inline_keyboard": rows }),
        None => Value::Null,
    }
}

#[async_trait::async_trait]
impl ChatApi for TelegramClient {
    async fn send_message(&self, chat_id: i64, reply: &Reply) -> Result<(), TelegramError> {
        let mut payload = json!({
            "chat_id": chat_id,
            "text": reply.text,
            "parse_mode": "HTML",
        });
        if reply.keyboard.is_some() {
            payload["reply_markup"] = reply_markup(reply);
        }
        self.call::<Value>("sendMessage", &payload, self.request_timeout)
            .await
            .map(|_| ())
    }

    async fn edit_message(&self, chat_id: i64, message_id: i64, reply: &Reply) -> Result<(), TelegramError> {
        let mut payload = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": reply.text,
            "parse_mode": "HTML",
        });
        if reply.keyboard.is_some() {
            payload["reply_markup"] = reply_markup(reply);
        }
        self.call::<Value>("editMessageText", &payload, self.request_timeout)
            .await
            .map(|_| ())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), TelegramError> {
        let payload = json!({ "callback_query_id": callback_id });
        self.call::<Value>("answerCallbackQuery", &payload, self.request_timeout)
            .await
            .map(|_| ())
    }
}
