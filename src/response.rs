//! Typed results shared by every client façade.
//!
//! All outcomes funnel into [`ApiResult`]: a parsed-JSON success (or empty
//! 204 success) on one side, a [`ClientError`] on the other. Errors always
//! carry enough to log or display: a code, a human-readable message, and
//! where the server sent one, the raw JSON error body.

use serde_json::Value;

// ---------------------------------------------------------------------------
// Transport error codes
// ---------------------------------------------------------------------------

/// Failures reported by the transport as negative status codes, mapped 1:1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    ConnectionFailed,
    SendHeaderFailed,
    SendPayloadFailed,
    NotConnected,
    ConnectionLost,
    NoResponseStream,
    NotAnHttpServer,
    OutOfMemory,
    EncodingUnsupported,
    StreamWriteFailed,
    ReadTimeout,
    Cancelled,
    /// A negative code outside the known table, preserved as-is.
    Other(i32),
}

impl TransportError {
    pub fn from_code(code: i32) -> Self {
        match code {
            -1 => TransportError::ConnectionFailed,
            -2 => TransportError::SendHeaderFailed,
            -3 => TransportError::SendPayloadFailed,
            -4 => TransportError::NotConnected,
            -5 => TransportError::ConnectionLost,
            -6 => TransportError::NoResponseStream,
            -7 => TransportError::NotAnHttpServer,
            -8 => TransportError::OutOfMemory,
            -9 => TransportError::EncodingUnsupported,
            -10 => TransportError::StreamWriteFailed,
            -11 => TransportError::ReadTimeout,
            -12 => TransportError::Cancelled,
            other => TransportError::Other(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            TransportError::ConnectionFailed => -1,
            TransportError::SendHeaderFailed => -2,
            TransportError::SendPayloadFailed => -3,
            TransportError::NotConnected => -4,
            TransportError::ConnectionLost => -5,
            TransportError::NoResponseStream => -6,
            TransportError::NotAnHttpServer => -7,
            TransportError::OutOfMemory => -8,
            TransportError::EncodingUnsupported => -9,
            TransportError::StreamWriteFailed => -10,
            TransportError::ReadTimeout => -11,
            TransportError::Cancelled => -12,
            TransportError::Other(code) => *code,
        }
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::ConnectionFailed => write!(f, "connection failed"),
            TransportError::SendHeaderFailed => write!(f, "send header failed"),
            TransportError::SendPayloadFailed => write!(f, "send payload failed"),
            TransportError::NotConnected => write!(f, "not connected"),
            TransportError::ConnectionLost => write!(f, "connection lost"),
            TransportError::NoResponseStream => write!(f, "no response stream"),
            TransportError::NotAnHttpServer => write!(f, "not a HTTP server"),
            TransportError::OutOfMemory => write!(f, "not enough RAM"),
            TransportError::EncodingUnsupported => {
                write!(f, "transfer encoding not supported")
            }
            TransportError::StreamWriteFailed => write!(f, "stream write failed"),
            TransportError::ReadTimeout => write!(f, "read timeout"),
            TransportError::Cancelled => write!(f, "async request cancelled"),
            TransportError::Other(code) => write!(f, "transport error {}", code),
        }
    }
}

// ---------------------------------------------------------------------------
// Local validation errors
// ---------------------------------------------------------------------------

/// Input problems detected before any network I/O happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidParameter {
    EmptyToken,
    EmptyChannelId,
    EmptyThreadId,
    EmptyContent,
    /// Content exceeds the 2000-character platform cap.
    ContentTooLong,
    /// Message is ComponentV2 but the component list is empty.
    ComponentsV2Empty,
    /// ComponentV2 messages may not carry content or embeds.
    ComponentsV2Exclusive,
    TooManyEmbeds,
    EmptyMessageId,
    EmptyEmoji,
    /// `limit` outside 1..=100.
    LimitOutOfRange,
    /// More than one of `around`/`before`/`after` given.
    ConflictingAnchors,
    EmptyWebhookUrl,
    EmptyPhotoUrl,
    EmptyStickerId,
    EmptyAction,
}

impl std::fmt::Display for InvalidParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            InvalidParameter::EmptyToken => "token is empty",
            InvalidParameter::EmptyChannelId => "channel ID is empty",
            InvalidParameter::EmptyThreadId => "thread ID is empty",
            InvalidParameter::EmptyContent => "content is empty",
            InvalidParameter::ContentTooLong => "content exceeds 2000 characters",
            InvalidParameter::ComponentsV2Empty => {
                "message marked as ComponentV2 but has no components"
            }
            InvalidParameter::ComponentsV2Exclusive => {
                "message marked as ComponentV2 can only contain components"
            }
            InvalidParameter::TooManyEmbeds => {
                "cannot have more than 10 embeds in a message"
            }
            InvalidParameter::EmptyMessageId => "message ID is empty",
            InvalidParameter::EmptyEmoji => "emoji is empty",
            InvalidParameter::LimitOutOfRange => "limit must be between 1 and 100",
            InvalidParameter::ConflictingAnchors => {
                "only one of around, before, or after can be specified"
            }
            InvalidParameter::EmptyWebhookUrl => "webhook URL is empty",
            InvalidParameter::EmptyPhotoUrl => "photo URL is empty",
            InvalidParameter::EmptyStickerId => "sticker ID is empty",
            InvalidParameter::EmptyAction => "action is empty",
        };
        write!(f, "{}", reason)
    }
}

// ---------------------------------------------------------------------------
// HTTP status errors
// ---------------------------------------------------------------------------

/// The 4xx statuses the chat platforms actually hand back, named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    RequestTimeout,
    RateLimited,
    /// Any other non-success status.
    Other(u16),
}

impl HttpErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => HttpErrorKind::BadRequest,
            401 => HttpErrorKind::Unauthorized,
            403 => HttpErrorKind::Forbidden,
            404 => HttpErrorKind::NotFound,
            408 => HttpErrorKind::RequestTimeout,
            429 => HttpErrorKind::RateLimited,
            other => HttpErrorKind::Other(other),
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            HttpErrorKind::BadRequest => 400,
            HttpErrorKind::Unauthorized => 401,
            HttpErrorKind::Forbidden => 403,
            HttpErrorKind::NotFound => 404,
            HttpErrorKind::RequestTimeout => 408,
            HttpErrorKind::RateLimited => 429,
            HttpErrorKind::Other(status) => *status,
        }
    }
}

impl std::fmt::Display for HttpErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpErrorKind::BadRequest => write!(f, "bad request"),
            HttpErrorKind::Unauthorized => write!(f, "unauthorized"),
            HttpErrorKind::Forbidden => write!(f, "forbidden"),
            HttpErrorKind::NotFound => write!(f, "not found"),
            HttpErrorKind::RequestTimeout => write!(f, "request timeout"),
            HttpErrorKind::RateLimited => write!(f, "rate limit exceeded"),
            HttpErrorKind::Other(status) => write!(f, "unknown error (status {})", status),
        }
    }
}

// ---------------------------------------------------------------------------
// ClientError
// ---------------------------------------------------------------------------

/// Everything that can go wrong issuing a request.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Rejected before any I/O; the variant says which rule failed.
    InvalidParameter(InvalidParameter),
    /// The network link is down.
    NotConnected,
    /// The transport reported a negative status code.
    Transport(TransportError),
    /// The remote API answered with a non-success status. The raw JSON
    /// error body is preserved for caller inspection.
    Http { kind: HttpErrorKind, body: Value },
    /// Application-level error inside a 200 envelope (`ok: false`).
    Platform { code: i64, message: String },
    /// The response body was not valid JSON.
    Deserialization(String),
    /// The server closed the request without a body.
    EmptyResponse,
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::InvalidParameter(which) => {
                write!(f, "invalid parameter: {}", which)
            }
            ClientError::NotConnected => write!(f, "network not connected"),
            ClientError::Transport(e) => write!(f, "transport error: {}", e),
            ClientError::Http { kind, .. } => write!(f, "HTTP error: {}", kind),
            ClientError::Platform { code, message } => {
                write!(f, "API error {}: {}", code, message)
            }
            ClientError::Deserialization(e) => {
                write!(f, "JSON deserialization failed: {}", e)
            }
            ClientError::EmptyResponse => write!(f, "empty response from server"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<InvalidParameter> for ClientError {
    fn from(which: InvalidParameter) -> Self {
        ClientError::InvalidParameter(which)
    }
}

// ---------------------------------------------------------------------------
// ApiResponse + classification
// ---------------------------------------------------------------------------

/// A successful exchange: either a parsed JSON payload or a bodyless 204.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Success(Value),
    NoContent,
}

impl ApiResponse {
    /// The payload, if any.
    pub fn value(&self) -> Option<&Value> {
        match self {
            ApiResponse::Success(value) => Some(value),
            ApiResponse::NoContent => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            ApiResponse::Success(value) => Some(value),
            ApiResponse::NoContent => None,
        }
    }
}

pub type ApiResult = Result<ApiResponse, ClientError>;

/// Demultiplex a raw transport status + body into a typed result.
///
/// Negative statuses are transport failures; 204 succeeds without touching
/// the body; everything else must parse as JSON, after which 200/201 is a
/// success and any other status is a named HTTP error carrying the body.
pub fn classify(status: i32, body: &str) -> ApiResult {
    if status < 0 {
        return Err(ClientError::Transport(TransportError::from_code(status)));
    }
    if status == 204 {
        return Ok(ApiResponse::NoContent);
    }
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ClientError::Deserialization(e.to_string()))?;
    match status {
        200 | 201 => Ok(ApiResponse::Success(value)),
        other => Err(ClientError::Http {
            kind: HttpErrorKind::from_status(other as u16),
            body: value,
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // -- TransportError ----------------------------------------------------

    #[test]
    fn transport_codes_round_trip() {
        for code in -12..=-1 {
            assert_eq!(TransportError::from_code(code).code(), code);
        }
        assert_eq!(TransportError::from_code(-99), TransportError::Other(-99));
        assert_eq!(TransportError::Other(-99).code(), -99);
    }

    #[test]
    fn transport_messages_are_human_readable() {
        assert_eq!(
            TransportError::ConnectionFailed.to_string(),
            "connection failed"
        );
        assert_eq!(TransportError::ReadTimeout.to_string(), "read timeout");
        assert_eq!(
            TransportError::Cancelled.to_string(),
            "async request cancelled"
        );
    }

    // -- classify() --------------------------------------------------------

    #[test]
    fn negative_status_is_a_transport_error() {
        let err = classify(-1, "").unwrap_err();
        assert_eq!(err, ClientError::Transport(TransportError::ConnectionFailed));
    }

    #[test]
    fn no_content_skips_body_parsing() {
        // A 204 has no body; classification must not try to parse one.
        assert_eq!(classify(204, "").unwrap(), ApiResponse::NoContent);
    }

    #[test]
    fn success_wraps_the_parsed_body() {
        let resp = classify(200, r#"{"id":"42"}"#).unwrap();
        assert_eq!(resp.value().unwrap()["id"], "42");
    }

    #[test]
    fn created_also_counts_as_success() {
        assert!(classify(201, "{}").is_ok());
    }

    #[test]
    fn bad_request_preserves_the_error_body() {
        let err = classify(400, r#"{"message":"x"}"#).unwrap_err();
        match err {
            ClientError::Http { kind, body } => {
                assert_eq!(kind, HttpErrorKind::BadRequest);
                assert_eq!(body, json!({"message": "x"}));
            }
            other => panic!("expected Http error, got {:?}", other),
        }
    }

    #[test]
    fn unknown_status_maps_to_other() {
        let err = classify(500, "{}").unwrap_err();
        match err {
            ClientError::Http { kind, .. } => {
                assert_eq!(kind, HttpErrorKind::Other(500));
                assert_eq!(kind.status(), 500);
            }
            other => panic!("expected Http error, got {:?}", other),
        }
    }

    #[test]
    fn garbage_body_is_a_deserialization_error() {
        let err = classify(200, "not json").unwrap_err();
        assert!(matches!(err, ClientError::Deserialization(_)));
        assert!(err.to_string().starts_with("JSON deserialization failed"));
    }

    // -- named status table ------------------------------------------------

    #[test]
    fn named_statuses_cover_the_platform_codes() {
        for (status, kind) in [
            (400, HttpErrorKind::BadRequest),
            (401, HttpErrorKind::Unauthorized),
            (403, HttpErrorKind::Forbidden),
            (404, HttpErrorKind::NotFound),
            (408, HttpErrorKind::RequestTimeout),
            (429, HttpErrorKind::RateLimited),
        ] {
            assert_eq!(HttpErrorKind::from_status(status), kind);
            assert_eq!(kind.status(), status);
        }
    }

    // -- Display -----------------------------------------------------------

    #[test]
    fn validation_reasons_name_the_failed_rule() {
        assert_eq!(
            ClientError::from(InvalidParameter::ComponentsV2Exclusive).to_string(),
            "invalid parameter: message marked as ComponentV2 can only contain components"
        );
        assert_eq!(
            InvalidParameter::TooManyEmbeds.to_string(),
            "cannot have more than 10 embeds in a message"
        );
    }

    #[test]
    fn platform_errors_carry_code_and_description() {
        let err = ClientError::Platform {
            code: 404,
            message: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "API error 404: not found");
    }
}
