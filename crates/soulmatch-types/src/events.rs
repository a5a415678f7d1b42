use crate::models::{ButtonAction, ExternalId, Identity};

/// Chat a message was sent in (equal to the user id for private chats).
pub type ChatId = i64;

/// A message previously sent by the bot, used as an edit target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: i64,
}

/// Events delivered by the chat transport.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub sender: Identity,
    pub chat_id: ChatId,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// `/name arg1 arg2 ...`
    Command { name: String, args: Vec<String> },

    /// Plain text that isn't a command
    Text(String),

    /// Photo attachment, carrying the platform's storage reference
    Photo { file_id: String },

    /// Inline button press on a message the bot sent
    Button { data: String, message: MessageRef },

    /// Any other message type (stickers, voice, documents, ...)
    Unsupported,
}

impl InboundEvent {
    pub fn new(sender: Identity, kind: EventKind) -> Self {
        // Private chats share the user's id
        let chat_id = sender.id;
        Self {
            sender,
            chat_id,
            kind,
        }
    }

    pub fn command(sender: Identity, name: &str, args: &[&str]) -> Self {
        Self::new(
            sender,
            EventKind::Command {
                name: name.to_string(),
                args: args.iter().map(|a| a.to_string()).collect(),
            },
        )
    }

    pub fn text(sender: Identity, text: &str) -> Self {
        Self::new(sender, EventKind::Text(text.to_string()))
    }

    pub fn sender_id(&self) -> ExternalId {
        self.sender.id
    }
}

/// Inline button shown under a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    pub fn new(label: &str, action: &ButtonAction) -> Self {
        Self {
            label: label.to_string(),
            data: action.encode(),
        }
    }
}

/// Actions sent back through the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundAction {
    Text {
        chat_id: ChatId,
        text: String,
    },

    TextWithButtons {
        chat_id: ChatId,
        text: String,
        buttons: Vec<Button>,
    },

    Photo {
        chat_id: ChatId,
        file_id: String,
        caption: String,
        buttons: Vec<Button>,
    },

    /// Replace the text (or caption) of a message the bot sent earlier
    EditText {
        message: MessageRef,
        text: String,
    },
}

impl OutboundAction {
    pub fn text(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self::Text {
            chat_id,
            text: text.into(),
        }
    }

    pub fn chat_id(&self) -> ChatId {
        match self {
            Self::Text { chat_id, .. }
            | Self::TextWithButtons { chat_id, .. }
            | Self::Photo { chat_id, .. } => *chat_id,
            Self::EditText { message, .. } => message.chat_id,
        }
    }

    /// The visible text of the action (caption for photos).
    pub fn body(&self) -> &str {
        match self {
            Self::Text { text, .. }
            | Self::TextWithButtons { text, .. }
            | Self::EditText { text, .. } => text,
            Self::Photo { caption, .. } => caption,
        }
    }
}
