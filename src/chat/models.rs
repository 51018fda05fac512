// Chat data models — the types that flow between the send path, the
// message store, and the terminal.

use serde::{Deserialize, Serialize};

/// Prefix marking message content as an image reference.
pub const IMAGE_PREFIX: &str = "[IMAGE]";

/// Escape for text that would otherwise decode as something else.
const TEXT_ESCAPE: &str = "[TEXT]";

/// A persisted chat message. `id` and `created_at` belong to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: String,
    /// None for the global channel
    pub receiver_id: Option<String>,
    pub content: String,
    pub is_toxic: bool,
    pub created_at: String,
}

impl Message {
    /// How the message should be shown, derived from stored data only.
    /// `is_toxic` is authoritative; content is never inspected for the marker.
    pub fn rendered(&self) -> Rendered {
        if self.is_toxic {
            return Rendered::Masked;
        }
        match Body::decode(&self.content) {
            Body::Text(text) => Rendered::Text(text),
            Body::Image(url) => Rendered::Image(url),
        }
    }
}

/// A message on its way to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender_id: String,
    pub receiver_id: Option<String>,
    pub content: String,
    pub is_toxic: bool,
}

/// Display model for a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// Moderated; content is never shown
    Masked,
    Text(String),
    Image(String),
}

/// Message payload before it is encoded into a content string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Text(String),
    /// URL or data URI
    Image(String),
}

impl Body {
    /// Plain text is stored as-is unless it starts with a prefix that
    /// `decode` would interpret, in which case it is escaped.
    pub fn encode(&self) -> String {
        match self {
            Body::Text(text)
                if text.starts_with(IMAGE_PREFIX) || text.starts_with(TEXT_ESCAPE) =>
            {
                format!("{TEXT_ESCAPE}{text}")
            }
            Body::Text(text) => text.clone(),
            Body::Image(url) => format!("{IMAGE_PREFIX}{url}"),
        }
    }

    pub fn decode(content: &str) -> Self {
        if let Some(text) = content.strip_prefix(TEXT_ESCAPE) {
            return Body::Text(text.to_string());
        }
        match content.strip_prefix(IMAGE_PREFIX) {
            Some(url) => Body::Image(url.to_string()),
            None => Body::Text(content.to_string()),
        }
    }
}

/// What the user typed, plus an optional attached image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub image: Option<String>,
}

impl Draft {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Nothing worth sending.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty() && self.image.as_deref().map_or(true, |i| i.trim().is_empty())
    }
}

/// Which conversation a view, query, or subscription covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Broadcast channel; rows with no receiver
    Global,
    /// One-to-one conversation, either direction
    Direct { me: String, peer: String },
}

impl Scope {
    pub fn direct(me: impl Into<String>, peer: impl Into<String>) -> Self {
        Scope::Direct {
            me: me.into(),
            peer: peer.into(),
        }
    }

    /// Receiver to write for a message sent into this scope.
    pub fn receiver(&self) -> Option<&str> {
        match self {
            Scope::Global => None,
            Scope::Direct { peer, .. } => Some(peer.as_str()),
        }
    }

    /// Filter predicate for realtime delivery.
    pub fn matches(&self, message: &Message) -> bool {
        match self {
            Scope::Global => message.receiver_id.is_none(),
            Scope::Direct { me, peer } => match message.receiver_id.as_deref() {
                Some(receiver) => {
                    (message.sender_id == *me && receiver == peer.as_str())
                        || (message.sender_id == *peer && receiver == me.as_str())
                }
                None => false,
            },
        }
    }
}
