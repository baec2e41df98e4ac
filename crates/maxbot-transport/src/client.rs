//! Typed bot API operations.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use maxbot_core::{
    AnswerCallbackRequest, ClientError, ClientResult, EditMessageRequest, MediaUpload,
    SendMediaRequest, SendMessageRequest, Update, UpdatesEnvelope, UploadEnvelope,
    UploadMediaRequest,
};

use crate::config::ClientConfig;
use crate::transport::{ApiRequest, HttpTransport, Method};

/// Filename used when an upload does not name the file.
pub const DEFAULT_UPLOAD_FILENAME: &str = "upload.bin";
/// Content type used when an upload does not declare one.
pub const DEFAULT_UPLOAD_CONTENT_TYPE: &str = "application/octet-stream";

/// Query parameters of `GET /updates`. Non-positive values are omitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetUpdatesOptions {
    /// Exclusive lower bound of the update ids to return.
    pub offset: i64,
    pub limit: i64,
    /// Long-poll timeout in seconds.
    pub timeout_secs: i64,
}

impl GetUpdatesOptions {
    fn path(&self) -> String {
        let params: Vec<String> = [
            ("offset", self.offset),
            ("limit", self.limit),
            ("timeout", self.timeout_secs),
        ]
        .into_iter()
        .filter(|(_, value)| *value > 0)
        .map(|(key, value)| format!("{key}={value}"))
        .collect();

        if params.is_empty() {
            "/updates".to_string()
        } else {
            format!("/updates?{}", params.join("&"))
        }
    }
}

/// Bot API client.
///
/// Cheap to clone; clones share one transport and therefore one rate
/// limiter. Operations add no retries of their own.
#[derive(Debug, Clone)]
pub struct Client {
    transport: Arc<HttpTransport>,
}

impl Client {
    /// Creates a client from `config`.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        Ok(Self::from_transport(HttpTransport::new(config)?))
    }

    pub fn from_transport(transport: HttpTransport) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// Fetches pending updates.
    pub async fn get_updates(
        &self,
        options: &GetUpdatesOptions,
        cancel: &CancellationToken,
    ) -> ClientResult<Vec<Update>> {
        let body = self
            .transport
            .execute(&ApiRequest::new(Method::GET, options.path()), cancel)
            .await?;
        UpdatesEnvelope::decode(&body)
            .map(UpdatesEnvelope::into_updates)
            .map_err(|e| ClientError::Decode(format!("updates response: {e}")))
    }

    /// Sends a text message.
    pub async fn send_message(
        &self,
        request: &SendMessageRequest,
        cancel: &CancellationToken,
    ) -> ClientResult<()> {
        self.send_json(Method::POST, "/messages", request, cancel).await
    }

    /// Replaces the text of a previously sent message.
    pub async fn edit_message_text(
        &self,
        request: &EditMessageRequest,
        cancel: &CancellationToken,
    ) -> ClientResult<()> {
        self.send_json(Method::PATCH, "/messages", request, cancel).await
    }

    /// Acknowledges a callback query, optionally showing a notification.
    pub async fn answer_callback(
        &self,
        request: &AnswerCallbackRequest,
        cancel: &CancellationToken,
    ) -> ClientResult<()> {
        self.send_json(Method::POST, "/callbacks/answer", request, cancel).await
    }

    /// Uploads a file and returns the stored media record.
    ///
    /// Fails without touching the network when `request.data` is empty.
    pub async fn upload_media(
        &self,
        request: &UploadMediaRequest,
        cancel: &CancellationToken,
    ) -> ClientResult<MediaUpload> {
        if request.data.is_empty() {
            return Err(ClientError::InvalidRequest("upload media: data is required".into()));
        }

        let api_request = ApiRequest::new(Method::POST, "/media/upload").with_file(
            "file",
            non_blank(&request.filename).unwrap_or(DEFAULT_UPLOAD_FILENAME),
            non_blank(&request.content_type).unwrap_or(DEFAULT_UPLOAD_CONTENT_TYPE),
            request.data.clone(),
        );
        let body = self.transport.execute(&api_request, cancel).await?;

        UploadEnvelope::decode(&body)
            .map(UploadEnvelope::into_media)
            .map_err(|e| ClientError::Decode(format!("upload media response: {e}")))
    }

    /// Sends a previously uploaded media item.
    pub async fn send_media(
        &self,
        request: &SendMediaRequest,
        cancel: &CancellationToken,
    ) -> ClientResult<()> {
        self.send_json(Method::POST, "/messages/media", request, cancel).await
    }

    async fn send_json<T: Serialize>(
        &self,
        method: Method,
        path: &str,
        payload: &T,
        cancel: &CancellationToken,
    ) -> ClientResult<()> {
        let request = ApiRequest::json(method, path, payload)?;
        self.transport.execute(&request, cancel).await.map(|_| ())
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}
