//! Wire data model of the bot API.
//!
//! Payload records are deliberately permissive: every field carries a serde
//! default so partially populated updates still decode.

pub mod envelope;
pub mod id;
pub mod request;
pub mod update;

pub use envelope::{UpdatesEnvelope, UploadEnvelope};
pub use id::Id;
pub use request::{
    AnswerCallbackRequest, EditMessageRequest, InlineKeyboardButton, InlineKeyboardMarkup,
    MediaUpload, SendMediaRequest, SendMessageRequest, UploadMediaRequest,
};
pub use update::{CallbackQuery, Chat, Message, Update, UpdateKind, User};
