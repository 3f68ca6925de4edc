//! Envelope types for the Parlor wire format.
//!
//! Envelopes are the only values ever placed on the wire by the hub.
//! They are constructed transiently per event and never mutated.

use serde::{Deserialize, Serialize};

/// The kind of event an envelope carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A participant's forwarded chat text.
    #[serde(rename = "chatMessage")]
    ChatMessage,
    /// A participant joined the room.
    #[serde(rename = "userJoined")]
    UserJoined,
    /// A participant left the room.
    #[serde(rename = "userLeft")]
    UserLeft,
}

impl EventKind {
    /// Get the wire name for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::ChatMessage => "chatMessage",
            EventKind::UserJoined => "userJoined",
            EventKind::UserLeft => "userLeft",
        }
    }
}

/// A structured message sent from the hub to participants.
///
/// Serialized as `{"type":..., "message":..., "user":...}`. The `user` field
/// names the participant the event is about: the sender for chat messages,
/// the joining or leaving participant for membership notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Event kind discriminant.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Human-readable message text.
    pub message: String,
    /// Display name of the participant this event is about.
    pub user: String,
}

impl Envelope {
    /// Create a chat envelope attributed to `user`.
    #[must_use]
    pub fn chat(user: impl Into<String>, text: impl Into<String>) -> Self {
        Envelope {
            kind: EventKind::ChatMessage,
            message: text.into(),
            user: user.into(),
        }
    }

    /// Create a join notification naming `user`.
    #[must_use]
    pub fn user_joined(user: impl Into<String>) -> Self {
        let user = user.into();
        Envelope {
            kind: EventKind::UserJoined,
            message: format!("{user} joined the chat."),
            user,
        }
    }

    /// Create a leave notification naming `user`.
    #[must_use]
    pub fn user_left(user: impl Into<String>) -> Self {
        let user = user.into();
        Envelope {
            kind: EventKind::UserLeft,
            message: format!("{user} left the chat."),
            user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_envelope() {
        let envelope = Envelope::chat("User1", "hi");
        assert_eq!(envelope.kind, EventKind::ChatMessage);
        assert_eq!(envelope.message, "hi");
        assert_eq!(envelope.user, "User1");
    }

    #[test]
    fn test_membership_envelope_texts() {
        let joined = Envelope::user_joined("User2");
        assert_eq!(joined.message, "User2 joined the chat.");

        let left = Envelope::user_left("User2");
        assert_eq!(left.message, "User2 left the chat.");
    }

    #[test]
    fn test_event_kind_names() {
        assert_eq!(EventKind::ChatMessage.as_str(), "chatMessage");
        assert_eq!(EventKind::UserJoined.as_str(), "userJoined");
        assert_eq!(EventKind::UserLeft.as_str(), "userLeft");
    }
}
