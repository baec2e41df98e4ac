//! Inbound update records.

use serde::{Deserialize, Serialize};

use super::id::Id;

/// One inbound event from the platform.
///
/// Carries at most one payload: a [`Message`] or a [`CallbackQuery`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Update {
    /// Monotonically non-decreasing update identifier.
    #[serde(default)]
    pub update_id: i64,
    /// Inbound message payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    /// Inline button interaction payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_query: Option<CallbackQuery>,
}

impl Update {
    /// Creates an update carrying a message.
    pub fn message(update_id: i64, message: Message) -> Self {
        Self {
            update_id,
            message: Some(message),
            callback_query: None,
        }
    }

    /// Creates an update carrying a callback query.
    pub fn callback(update_id: i64, callback: CallbackQuery) -> Self {
        Self {
            update_id,
            message: None,
            callback_query: Some(callback),
        }
    }

    /// Returns the payload kind, preferring the message when both are present.
    pub fn kind(&self) -> UpdateKind {
        if self.message.is_some() {
            UpdateKind::Message
        } else if self.callback_query.is_some() {
            UpdateKind::Callback
        } else {
            UpdateKind::Empty
        }
    }
}

/// Which payload an [`Update`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Message,
    Callback,
    Empty,
}

/// A platform user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub user_id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A chat (dialog, group or channel).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    #[serde(default)]
    pub chat_id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Chat type as reported by the platform ("dialog", "chat", "channel").
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub chat_type: Option<String>,
}

/// An inbound message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub message_id: Id,
    #[serde(default)]
    pub chat: Chat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Message {
    /// Creates a text message in the given chat.
    pub fn text(chat_id: impl Into<Id>, text: impl Into<String>) -> Self {
        Self {
            chat: Chat {
                chat_id: chat_id.into(),
                ..Default::default()
            },
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Returns the message text, or an empty string.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

/// An inline keyboard button press.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub callback_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat: Option<Chat>,
    /// The message the pressed keyboard was attached to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_message_update_with_numeric_ids() {
        let raw = r#"{
            "update_id": 7,
            "message": {
                "message_id": 100,
                "chat": {"chat_id": 42, "type": "dialog"},
                "sender": {"user_id": "u-1", "name": "Ann"},
                "text": "/start"
            }
        }"#;
        let update: Update = serde_json::from_str(raw).unwrap();

        assert_eq!(update.update_id, 7);
        assert_eq!(update.kind(), UpdateKind::Message);
        let message = update.message.unwrap();
        assert_eq!(message.message_id, "100");
        assert_eq!(message.chat.chat_id, "42");
        assert_eq!(message.chat.chat_type.as_deref(), Some("dialog"));
        assert_eq!(message.sender.unwrap().user_id, "u-1");
    }

    #[test]
    fn test_decode_callback_update() {
        let raw = r#"{"update_id": 3, "callback_query": {"callback_id": "cb", "data": "yes"}}"#;
        let update: Update = serde_json::from_str(raw).unwrap();

        assert_eq!(update.kind(), UpdateKind::Callback);
        assert_eq!(update.callback_query.unwrap().data.as_deref(), Some("yes"));
    }

    #[test]
    fn test_decode_null_ids() {
        let raw = r#"{"update_id":1,"message":{"message_id":null,"chat":{"chat_id":null},"text":"hi"}}"#;
        let update: Update = serde_json::from_str(raw).unwrap();

        let message = update.message.unwrap();
        assert!(message.message_id.is_empty());
        assert!(message.chat.chat_id.is_empty());
        assert_eq!(message.text.as_deref(), Some("hi"));
    }

    #[test]
    fn test_empty_update() {
        let update: Update = serde_json::from_str(r#"{"update_id": 1}"#).unwrap();
        assert_eq!(update.kind(), UpdateKind::Empty);
    }
}
