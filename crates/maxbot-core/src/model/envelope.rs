//! Response envelopes with more than one accepted shape.
//!
//! Each envelope names its cases explicitly so call sites decode once and
//! match, instead of repeating fallback parsing.

use serde::Deserialize;

use super::request::MediaUpload;
use super::update::Update;

/// Response of `GET /updates`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UpdatesEnvelope {
    /// `{"updates": [...]}`
    Wrapped { updates: Vec<Update> },
    /// `[...]`
    List(Vec<Update>),
}

impl UpdatesEnvelope {
    pub fn decode(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }

    pub fn into_updates(self) -> Vec<Update> {
        match self {
            Self::Wrapped { updates } | Self::List(updates) => updates,
        }
    }
}

/// Response of `POST /media/upload`.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEnvelope {
    /// The record itself, carrying a media or file id.
    Direct(MediaUpload),
    /// `{"media": {...}}`
    Wrapped(MediaUpload),
}

#[derive(Deserialize)]
struct WrappedUpload {
    #[serde(default)]
    media: MediaUpload,
}

impl UploadEnvelope {
    /// Decodes the direct shape when it carries an id, else the wrapped shape.
    pub fn decode(body: &[u8]) -> serde_json::Result<Self> {
        if let Ok(direct) = serde_json::from_slice::<MediaUpload>(body)
            && direct.has_id()
        {
            return Ok(Self::Direct(direct));
        }
        let wrapped: WrappedUpload = serde_json::from_slice(body)?;
        Ok(Self::Wrapped(wrapped.media))
    }

    pub fn into_media(self) -> MediaUpload {
        match self {
            Self::Direct(media) | Self::Wrapped(media) => media,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_updates_wrapped_and_list() {
        let wrapped = UpdatesEnvelope::decode(br#"{"updates":[{"update_id":1}],"marker":5}"#).unwrap();
        assert!(matches!(wrapped, UpdatesEnvelope::Wrapped { .. }));
        assert_eq!(wrapped.into_updates()[0].update_id, 1);

        let list = UpdatesEnvelope::decode(br#"[{"update_id":2},{"update_id":3}]"#).unwrap();
        assert!(matches!(list, UpdatesEnvelope::List(_)));
        assert_eq!(list.into_updates().len(), 2);
    }

    #[test]
    fn test_updates_rejects_unknown_shapes() {
        assert!(UpdatesEnvelope::decode(br#"{}"#).is_err());
        assert!(UpdatesEnvelope::decode(br#"{"updates":null}"#).is_err());
        assert!(UpdatesEnvelope::decode(b"not json").is_err());
    }

    #[test]
    fn test_upload_direct_and_wrapped() {
        let direct = UploadEnvelope::decode(br#"{"media_id":"m1","url":"https://cdn/m1"}"#).unwrap();
        assert!(matches!(direct, UploadEnvelope::Direct(_)));
        assert_eq!(direct.into_media().url.as_deref(), Some("https://cdn/m1"));

        let wrapped = UploadEnvelope::decode(br#"{"media":{"file_id":9}}"#).unwrap();
        assert!(matches!(wrapped, UploadEnvelope::Wrapped(_)));
        assert_eq!(wrapped.into_media().file_id.unwrap(), "9");
    }

    #[test]
    fn test_upload_rejects_non_object() {
        assert!(UploadEnvelope::decode(br#""m1""#).is_err());
        assert!(UploadEnvelope::decode(b"").is_err());
    }

    #[test]
    fn test_updates_empty_list() {
        let list = UpdatesEnvelope::decode(b"[]").unwrap();
        assert!(list.into_updates().is_empty());
    }
}
