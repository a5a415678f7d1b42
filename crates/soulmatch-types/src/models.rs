/// Stable chat-platform identifier (Telegram user id).
pub type ExternalId = i64;

/// Internal user id, the `users.id` primary key.
pub type UserId = i64;

/// The sender of an inbound event as the chat platform reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: ExternalId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Identity {
    pub fn new(id: ExternalId) -> Self {
        Self {
            id,
            username: None,
            first_name: None,
            last_name: None,
        }
    }

    /// Display name stored for a freshly created user: "first last",
    /// falling back to the username, falling back to "".
    pub fn display_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("");
        let last = self.last_name.as_deref().unwrap_or("");
        let full = format!("{} {}", first, last).trim().to_string();
        if !full.is_empty() {
            return full;
        }
        self.username.clone().unwrap_or_default()
    }
}

/// Action carried by an inline button, encoded as `<action>:<user id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    Like(UserId),
    Skip(UserId),
    /// Well-formed payload with an action this bot doesn't know.
    Unknown(String, UserId),
}

impl ButtonAction {
    /// Parse a callback payload. `None` when it isn't `<action>:<integer>`.
    pub fn parse(data: &str) -> Option<Self> {
        let (action, target) = data.split_once(':')?;
        let target: UserId = target.trim().parse().ok()?;
        Some(match action {
            "like" => Self::Like(target),
            "skip" => Self::Skip(target),
            other => Self::Unknown(other.to_string(), target),
        })
    }

    pub fn encode(&self) -> String {
        match self {
            Self::Like(id) => format!("like:{}", id),
            Self::Skip(id) => format!("skip:{}", id),
            Self::Unknown(action, id) => format!("{}:{}", action, id),
        }
    }
}
