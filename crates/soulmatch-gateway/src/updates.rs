use tracing::{debug, trace, warn};

use soulmatch_types::events::{EventKind, InboundEvent, MessageRef};
use soulmatch_types::models::Identity;
use soulmatch_types::transport::ChatTransport;

use crate::dispatcher::Dispatcher;
use crate::telegram::{Message, TelegramClient, Update, User};

/// An update translated into the bot's event vocabulary.
#[derive(Debug)]
pub struct Decoded {
    pub event: InboundEvent,
    /// Set for button presses; must be answered so the client stops spinning.
    pub callback_id: Option<String>,
}

/// Translate a Telegram update. `None` for updates the bot ignores
/// (channel posts, edits, messages without a sender).
pub fn decode_update(update: Update) -> Option<Decoded> {
    if let Some(query) = update.callback_query {
        let Some(message) = query.message else {
            debug!("Callback {} has no message to edit, ignoring", query.id);
            return None;
        };
        let event = InboundEvent {
            sender: identity(query.from),
            chat_id: message.chat.id,
            kind: EventKind::Button {
                data: query.data.unwrap_or_default(),
                message: MessageRef {
                    chat_id: message.chat.id,
                    message_id: message.message_id,
                },
            },
        };
        return Some(Decoded {
            event,
            callback_id: Some(query.id),
        });
    }

    let mut message = update.message?;
    let sender = identity(message.from.take()?);
    let chat_id = message.chat.id;
    Some(Decoded {
        event: InboundEvent {
            sender,
            chat_id,
            kind: message_kind(message),
        },
        callback_id: None,
    })
}

fn identity(user: User) -> Identity {
    Identity {
        id: user.id,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
    }
}

fn message_kind(message: Message) -> EventKind {
    if let Some(text) = message.text {
        return match text.strip_prefix('/') {
            Some(command) => parse_command(command),
            None => EventKind::Text(text),
        };
    }

    // Last entry is the largest size
    match message.photo.into_iter().last() {
        Some(photo) => EventKind::Photo {
            file_id: photo.file_id,
        },
        None => EventKind::Unsupported,
    }
}

/// `report@SoulMatchBot 42 spam` -> name `report`, args `["42", "spam"]`.
fn parse_command(command: &str) -> EventKind {
    let mut parts = command.split_whitespace();
    let head = parts.next().unwrap_or_default();
    let name = head.split('@').next().unwrap_or_default().to_string();
    EventKind::Command {
        name,
        args: parts.map(str::to_string).collect(),
    }
}

/// Decode an update, acknowledge button presses, and queue the event.
pub async fn ingest<T: ChatTransport>(
    client: &TelegramClient,
    dispatcher: &Dispatcher<T>,
    update: Update,
) {
    let update_id = update.update_id;
    let Some(decoded) = decode_update(update) else {
        trace!("Update {} ignored", update_id);
        return;
    };

    if let Some(callback_id) = &decoded.callback_id {
        if let Err(e) = client.answer_callback_query(callback_id).await {
            warn!("answerCallbackQuery failed for update {}: {}", update_id, e);
        }
    }

    dispatcher.dispatch(decoded.event).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> Option<Decoded> {
        decode_update(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn text_message() {
        let decoded = decode(
            r#"{"update_id":1,"message":{"message_id":5,"chat":{"id":10},
                "from":{"id":10,"first_name":"Ada","username":"ada"},"text":"hello"}}"#,
        )
        .unwrap();

        assert_eq!(decoded.event.sender.id, 10);
        assert_eq!(decoded.event.sender.username.as_deref(), Some("ada"));
        assert_eq!(decoded.event.chat_id, 10);
        assert_eq!(decoded.event.kind, EventKind::Text("hello".into()));
        assert!(decoded.callback_id.is_none());
    }

    #[test]
    fn command_with_bot_suffix_and_args() {
        let decoded = decode(
            r#"{"update_id":1,"message":{"message_id":5,"chat":{"id":10},
                "from":{"id":10,"first_name":"Ada"},"text":"/report@SoulMatchBot 42  spam bot"}}"#,
        )
        .unwrap();

        assert_eq!(
            decoded.event.kind,
            EventKind::Command {
                name: "report".into(),
                args: vec!["42".into(), "spam".into(), "bot".into()],
            }
        );
    }

    #[test]
    fn photo_uses_largest_size() {
        let decoded = decode(
            r#"{"update_id":1,"message":{"message_id":5,"chat":{"id":10},"from":{"id":10},
                "photo":[{"file_id":"small"},{"file_id":"medium"},{"file_id":"large"}]}}"#,
        )
        .unwrap();

        assert_eq!(
            decoded.event.kind,
            EventKind::Photo {
                file_id: "large".into()
            }
        );
    }

    #[test]
    fn sticker_is_unsupported() {
        let decoded = decode(
            r#"{"update_id":1,"message":{"message_id":5,"chat":{"id":10},"from":{"id":10},
                "sticker":{"file_id":"s"}}}"#,
        )
        .unwrap();
        assert_eq!(decoded.event.kind, EventKind::Unsupported);
    }

    #[test]
    fn callback_query_becomes_button() {
        let decoded = decode(
            r#"{"update_id":2,"callback_query":{"id":"cb1","from":{"id":11,"first_name":"Bob"},
                "data":"like:3","message":{"message_id":9,"chat":{"id":11}}}}"#,
        )
        .unwrap();

        assert_eq!(decoded.callback_id.as_deref(), Some("cb1"));
        assert_eq!(decoded.event.sender.id, 11);
        assert_eq!(
            decoded.event.kind,
            EventKind::Button {
                data: "like:3".into(),
                message: MessageRef {
                    chat_id: 11,
                    message_id: 9
                },
            }
        );
    }

    #[test]
    fn senderless_and_empty_updates_are_ignored() {
        assert!(decode(r#"{"update_id":3}"#).is_none());
        assert!(decode(
            r#"{"update_id":4,"message":{"message_id":1,"chat":{"id":-100},"text":"post"}}"#
        )
        .is_none());
        assert!(decode(r#"{"update_id":5,"callback_query":{"id":"x","from":{"id":1}}}"#).is_none());
    }
}
