//! Classification of failed HTTP responses.

use std::time::Duration;

use serde_json::Value;

use maxbot_core::ApiError;

/// Builds an [`ApiError`] from a failed response.
///
/// The body is parsed as a JSON object on a best-effort basis. A body that
/// is not a JSON object still yields an error carrying the status and the
/// raw text.
pub fn classify(status: u16, retry_after: Option<&str>, body: &[u8]) -> ApiError {
    let mut error = ApiError {
        status,
        body: String::from_utf8_lossy(body).trim().to_string(),
        retry_after: retry_after.and_then(parse_retry_after),
        ..Default::default()
    };

    let Ok(Value::Object(payload)) = serde_json::from_slice::<Value>(body) else {
        return error;
    };
    let text = |key: &str| payload.get(key).and_then(Value::as_str).map(str::to_string);

    error.code = text("code");
    error.message = text("message").filter(|m| !m.is_empty()).or_else(|| text("error"));
    error.description = text("description");
    error.details = payload.get("details").and_then(Value::as_object).cloned();
    error
}

/// Parses a `Retry-After` header given in whole seconds.
///
/// Non-numeric, zero and negative values yield `None`.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let seconds: i64 = value.trim().parse().ok()?;
    u64::try_from(seconds)
        .ok()
        .filter(|s| *s > 0)
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_full_payload() {
        let body = br#"{"code":"too.many","message":"slow down","description":"d","details":{"limit":30}}"#;
        let err = classify(429, Some("3"), body);

        assert_eq!(err.status, 429);
        assert_eq!(err.code.as_deref(), Some("too.many"));
        assert_eq!(err.message.as_deref(), Some("slow down"));
        assert_eq!(err.description.as_deref(), Some("d"));
        assert_eq!(err.details.unwrap()["limit"], 30);
        assert_eq!(err.retry_after, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_error_key_is_message_fallback() {
        let err = classify(400, None, br#"{"error":"bad chat"}"#);
        assert_eq!(err.message.as_deref(), Some("bad chat"));

        let err = classify(400, None, br#"{"message":"explicit","error":"ignored"}"#);
        assert_eq!(err.message.as_deref(), Some("explicit"));
    }

    #[test]
    fn test_non_json_body_is_kept_raw() {
        let err = classify(502, None, b"  <html>Bad Gateway</html>\n");
        assert_eq!(err.body, "<html>Bad Gateway</html>");
        assert!(err.code.is_none());
        assert!(err.message.is_none());
        assert_eq!(err.reason(), "<html>Bad Gateway</html>");
    }

    #[test]
    fn test_non_object_json_and_wrong_types() {
        let err = classify(500, None, b"[1,2,3]");
        assert!(err.message.is_none());

        let err = classify(500, None, br#"{"code":12,"details":"text"}"#);
        assert!(err.code.is_none());
        assert!(err.details.is_none());
    }

    #[test]
    fn test_empty_body_renders_generic_reason() {
        let err = classify(503, None, b"");
        assert_eq!(err.to_string(), "max api error: status=503 message=request failed");
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("5"), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after(" 2 "), Some(Duration::from_secs(2)));
        assert_eq!(parse_retry_after("0"), None);
        assert_eq!(parse_retry_after("-4"), None);
        assert_eq!(parse_retry_after("soon"), None);
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
        assert_eq!(parse_retry_after(""), None);
    }
}
