use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use soulmatch_types::events::{Button, MessageRef, OutboundAction};
use soulmatch_types::transport::{ChatTransport, TransportError};

/// Returned by editMessageText when the target message is a photo.
const NO_TEXT_TO_EDIT: &str = "there is no text in the message to edit";

/// Slack on top of the long-poll timeout before the HTTP request gives up.
const HTTP_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

// -- Wire types (only the fields this bot reads) --

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    #[serde(default)]
    pub photo: Vec<PhotoSize>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Telegram sends each photo in several sizes, smallest first.
#[derive(Debug, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Serialize)]
struct GetUpdates<'a> {
    offset: i64,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

/// Bot API client. Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(api_base: &str, token: &str, poll_timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(poll_timeout + HTTP_TIMEOUT_MARGIN)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Self {
            http,
            base_url: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
        })
    }

    async fn call<P, R>(&self, method: &str, payload: &P) -> Result<R, TransportError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);

        // without_url(): the URL carries the bot token
        let resp = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.without_url().to_string()))?;

        let body: ApiResponse<R> = resp
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.without_url().to_string()))?;

        if !body.ok {
            return Err(TransportError::Api {
                code: body.error_code.unwrap_or_default(),
                description: body.description.unwrap_or_default(),
            });
        }

        body.result
            .ok_or_else(|| TransportError::Decode(format!("{} returned no result", method)))
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>, TransportError> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: timeout.as_secs(),
                allowed_updates: &["message", "callback_query"],
            },
        )
        .await
    }

    /// Stop the client-side spinner on a pressed button.
    pub async fn answer_callback_query(&self, callback_id: &str) -> Result<(), TransportError> {
        let _: Value = self
            .call("answerCallbackQuery", &json!({ "callback_query_id": callback_id }))
            .await?;
        Ok(())
    }

    pub async fn set_webhook(&self, url: &str, secret: Option<&str>) -> Result<(), TransportError> {
        let mut payload = json!({
            "url": url,
            "allowed_updates": ["message", "callback_query"],
        });
        if let Some(secret) = secret {
            payload["secret_token"] = json!(secret);
        }
        let _: Value = self.call("setWebhook", &payload).await?;
        Ok(())
    }

    /// Required before getUpdates works on a bot that had a webhook.
    pub async fn delete_webhook(&self) -> Result<(), TransportError> {
        let _: Value = self.call("deleteWebhook", &json!({})).await?;
        Ok(())
    }

    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), TransportError> {
        let payload = json!({
            "chat_id": message.chat_id,
            "message_id": message.message_id,
            "text": text,
        });

        match self.call::<_, Value>("editMessageText", &payload).await {
            Ok(_) => Ok(()),
            Err(TransportError::Api { description, .. }) if description.contains(NO_TEXT_TO_EDIT) => {
                debug!("Message {} is a photo, editing caption instead", message.message_id);
                let payload = json!({
                    "chat_id": message.chat_id,
                    "message_id": message.message_id,
                    "caption": text,
                });
                let _: Value = self.call("editMessageCaption", &payload).await?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// One row of inline buttons.
fn inline_keyboard(buttons: &[Button]) -> Value {
    let row: Vec<Value> = buttons
        .iter()
        .map(|b| json!({ "text": b.label, "callback_data": b.data }))
        .collect();
    json!({ "inline_keyboard": [row] })
}

impl ChatTransport for TelegramClient {
    async fn deliver(&self, action: OutboundAction) -> Result<(), TransportError> {
        match action {
            OutboundAction::Text { chat_id, text } => {
                let _: Value = self
                    .call("sendMessage", &json!({ "chat_id": chat_id, "text": text }))
                    .await?;
            }
            OutboundAction::TextWithButtons {
                chat_id,
                text,
                buttons,
            } => {
                let payload = json!({
                    "chat_id": chat_id,
                    "text": text,
                    "reply_markup": inline_keyboard(&buttons),
                });
                let _: Value = self.call("sendMessage", &payload).await?;
            }
            OutboundAction::Photo {
                chat_id,
                file_id,
                caption,
                buttons,
            } => {
                let mut payload = json!({
                    "chat_id": chat_id,
                    "photo": file_id,
                    "caption": caption,
                });
                if !buttons.is_empty() {
                    payload["reply_markup"] = inline_keyboard(&buttons);
                }
                let _: Value = self.call("sendPhoto", &payload).await?;
            }
            OutboundAction::EditText { message, text } => {
                self.edit_text(message, &text).await?;
            }
        }
        Ok(())
    }
}
