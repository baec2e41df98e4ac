//! Per-update handler context.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use maxbot_core::{
    AnswerCallbackRequest, CallbackQuery, ClientResult, Id, Message, SendMessageRequest, Update,
};
use maxbot_transport::Client;

use crate::command::{ParsedCommand, extract_command, normalize_command, parse_command};

struct ContextInner {
    update: Update,
    client: Client,
    cancel: CancellationToken,
}

/// Everything a handler needs to process one update.
///
/// Cloning is cheap; all clones refer to the same update.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    pub fn new(update: Update, client: Client, cancel: CancellationToken) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                update,
                client,
                cancel,
            }),
        }
    }

    pub fn update(&self) -> &Update {
        &self.inner.update
    }

    pub fn client(&self) -> &Client {
        &self.inner.client
    }

    /// Cancellation token of the surrounding polling loop or webhook request.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.inner.cancel
    }

    pub fn message(&self) -> Option<&Message> {
        self.inner.update.message.as_ref()
    }

    pub fn callback(&self) -> Option<&CallbackQuery> {
        self.inner.update.callback_query.as_ref()
    }

    /// Trimmed message text, or an empty string.
    pub fn message_text(&self) -> &str {
        self.message().map_or("", |m| m.text_or_empty().trim())
    }

    /// Trimmed callback payload, or an empty string.
    pub fn callback_data(&self) -> &str {
        self.callback()
            .and_then(|cb| cb.data.as_deref())
            .map_or("", str::trim)
    }

    /// Lower-cased command name of the message, or an empty string.
    pub fn command(&self) -> String {
        self.message()
            .map(|m| extract_command(m.text_or_empty()))
            .unwrap_or_default()
    }

    /// Full command parse of the message text, including arguments.
    pub fn command_info(&self) -> Option<ParsedCommand> {
        parse_command(self.message_text())
    }

    /// Returns `true` if the message is the command `name` (`"start"`,
    /// `"/Start"` and `" start "` are equivalent).
    pub fn is_command(&self, name: &str) -> bool {
        let name = normalize_command(name);
        !name.is_empty() && self.command() == name
    }

    /// Chat the update belongs to.
    ///
    /// Falls back from the message chat to the callback chat and then to the
    /// chat of the callback's message. Empty when none is known.
    pub fn chat_id(&self) -> Id {
        if let Some(message) = self.message() {
            return message.chat.chat_id.clone();
        }
        self.callback()
            .and_then(|cb| {
                cb.chat
                    .as_ref()
                    .or_else(|| cb.message.as_ref().map(|m| &m.chat))
            })
            .map(|chat| chat.chat_id.clone())
            .unwrap_or_default()
    }

    /// Sends `text` to the update's chat. Does nothing when the chat is unknown.
    pub async fn reply(&self, text: impl Into<String>) -> ClientResult<()> {
        let chat_id = self.chat_id();
        if chat_id.is_empty() {
            return Ok(());
        }
        self.reply_with(SendMessageRequest::new(chat_id, text)).await
    }

    /// Sends a fully built message.
    pub async fn reply_with(&self, request: SendMessageRequest) -> ClientResult<()> {
        self.inner
            .client
            .send_message(&request, &self.inner.cancel)
            .await
    }

    /// Acknowledges the callback query, showing `text` when non-empty.
    /// Does nothing for updates without a callback.
    pub async fn answer_callback(&self, text: impl Into<String>) -> ClientResult<()> {
        let Some(callback) = self.callback() else {
            return Ok(());
        };
        let text = text.into();
        let request = AnswerCallbackRequest {
            callback_id: callback.callback_id.clone(),
            text: (!text.is_empty()).then_some(text),
            show_alert: None,
        };
        self.inner
            .client
            .answer_callback(&request, &self.inner.cancel)
            .await
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("update", &self.inner.update)
            .field("cancelled", &self.inner.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
