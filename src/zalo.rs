//! Client façade for the Zalo-style bot API.
//!
//! Endpoints hang off `https://bot-api.zapps.me/bot{token}/`, request bodies
//! are `application/x-www-form-urlencoded`, and every response is a JSON
//! envelope: `ok`, `result`, and on failure `error_code`/`description`.
//! The envelope is unwrapped here, so callers see the `result` payload or a
//! typed [`ClientError::Platform`].
//!
//! Update delivery is long polling through the shared single-flight
//! [`Poller`]. The transport has exactly one connection, so every
//! synchronous call cancels a pending poll before sending. That discipline
//! lives inside this client, not with the caller.

use serde_json::Value;
use tracing::debug;

use crate::encode::form_urlencode;
use crate::poller::{PollStatus, Poller};
use crate::response::{
    classify, ApiResponse, ApiResult, ClientError, InvalidParameter, TransportError,
};
use crate::transport::{apply_config, Method, Transport, TransportConfig};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://bot-api.zapps.me";

/// Platform cap on message content, in characters.
const CONTENT_MAX: usize = 2000;

// ---------------------------------------------------------------------------
// ZaloClient
// ---------------------------------------------------------------------------

/// Token-authenticated client for the Zalo bot API.
pub struct ZaloClient<T: Transport> {
    transport: T,
    token: String,
    poller: Poller,
}

impl<T: Transport> ZaloClient<T> {
    /// Create a client with default transport configuration.
    pub fn new(transport: T, token: impl Into<String>) -> Self {
        Self::with_config(transport, token, TransportConfig::default())
    }

    /// Create a client, applying `config` to the transport once.
    pub fn with_config(
        mut transport: T,
        token: impl Into<String>,
        config: TransportConfig,
    ) -> Self {
        apply_config(&mut transport, &config);
        Self {
            transport,
            token: token.into(),
            poller: Poller::new(),
        }
    }

    // ------------------------------------------------------------------
    // Bot operations
    // ------------------------------------------------------------------

    /// Fetch the bot's own account information.
    pub fn get_me(&mut self) -> ApiResult {
        self.get("getMe")
    }

    /// Send a text message to a thread.
    pub fn send_message(&mut self, thread_id: &str, content: &str) -> ApiResult {
        if thread_id.is_empty() {
            return Err(InvalidParameter::EmptyThreadId.into());
        }
        if content.is_empty() {
            return Err(InvalidParameter::EmptyContent.into());
        }
        if content.chars().count() > CONTENT_MAX {
            return Err(InvalidParameter::ContentTooLong.into());
        }
        self.post("sendMessage", &[("chat_id", thread_id), ("text", content)])
    }

    /// Send a photo by URL with a caption.
    pub fn send_photo(&mut self, thread_id: &str, photo_url: &str, caption: &str) -> ApiResult {
        if thread_id.is_empty() {
            return Err(InvalidParameter::EmptyThreadId.into());
        }
        if photo_url.is_empty() {
            return Err(InvalidParameter::EmptyPhotoUrl.into());
        }
        self.post(
            "sendPhoto",
            &[
                ("chat_id", thread_id),
                ("photo", photo_url),
                ("caption", caption),
            ],
        )
    }

    /// Send a sticker by its ID.
    pub fn send_sticker(&mut self, thread_id: &str, sticker_id: &str) -> ApiResult {
        if thread_id.is_empty() {
            return Err(InvalidParameter::EmptyThreadId.into());
        }
        if sticker_id.is_empty() {
            return Err(InvalidParameter::EmptyStickerId.into());
        }
        self.post(
            "sendSticker",
            &[("chat_id", thread_id), ("sticker", sticker_id)],
        )
    }

    /// Broadcast a chat action such as `typing`.
    pub fn send_chat_action(&mut self, thread_id: &str, action: &str) -> ApiResult {
        if thread_id.is_empty() {
            return Err(InvalidParameter::EmptyThreadId.into());
        }
        if action.is_empty() {
            return Err(InvalidParameter::EmptyAction.into());
        }
        self.post(
            "sendChatAction",
            &[("chat_id", thread_id), ("action", action)],
        )
    }

    // ------------------------------------------------------------------
    // Long polling
    // ------------------------------------------------------------------

    /// Non-blocking check for new updates.
    ///
    /// Starts a `getUpdates` long poll when none is pending, reports
    /// progress while it runs, and hands back the envelope-unwrapped
    /// result once the server answers. Call this from the firmware's main
    /// loop; it never blocks.
    pub fn poll_updates(&mut self) -> PollStatus {
        let url = self.endpoint_url("getUpdates");
        match self.poller.poll(&mut self.transport, &url) {
            PollStatus::Complete(result) => PollStatus::Complete(unwrap_envelope(result)),
            status => status,
        }
    }

    /// Whether a long poll is currently in flight.
    pub fn is_polling(&self) -> bool {
        self.poller.is_pending()
    }

    /// Borrow the underlying transport, e.g. to inspect or reconfigure it.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Consume the client and reclaim the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/bot{}/{}", BASE_URL, self.token, endpoint)
    }

    fn get(&mut self, endpoint: &str) -> ApiResult {
        if !self.transport.network_up() {
            return Err(ClientError::NotConnected);
        }
        // One physical connection: a pending poll must die first.
        self.poller.cancel(&mut self.transport);
        let url = self.endpoint_url(endpoint);
        debug!(%url, "GET");
        if !self.transport.begin(&url) {
            return Err(ClientError::Transport(TransportError::ConnectionFailed));
        }
        let status = self.transport.send_request(Method::Get, b"");
        self.finish(status)
    }

    fn post(&mut self, endpoint: &str, pairs: &[(&str, &str)]) -> ApiResult {
        if !self.transport.network_up() {
            return Err(ClientError::NotConnected);
        }
        self.poller.cancel(&mut self.transport);
        let body = form_urlencode(pairs);
        let url = self.endpoint_url(endpoint);
        debug!(%url, %body, "POST");
        if !self.transport.begin(&url) {
            return Err(ClientError::Transport(TransportError::ConnectionFailed));
        }
        self.transport
            .add_header("Content-Type", "application/x-www-form-urlencoded");
        self.transport
            .add_header("Content-Length", &body.len().to_string());
        let status = self.transport.send_request(Method::Post, body.as_bytes());
        self.finish(status)
    }

    fn finish(&mut self, status: i32) -> ApiResult {
        if status < 0 {
            self.transport.end();
            return Err(ClientError::Transport(TransportError::from_code(status)));
        }
        let body = self.transport.body();
        self.transport.end();
        debug!(status, "response received");
        if body.is_empty() {
            return Err(ClientError::EmptyResponse);
        }
        unwrap_envelope(classify(status, &body))
    }
}

impl<T: Transport> std::fmt::Debug for ZaloClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZaloClient")
            .field("token", &"<redacted>")
            .field("polling", &self.poller.is_pending())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Envelope unwrapping
// ---------------------------------------------------------------------------

/// Unwrap the `ok`/`result`/`error_code` envelope around every response.
fn unwrap_envelope(result: ApiResult) -> ApiResult {
    let mut envelope = match result? {
        ApiResponse::Success(value) => value,
        ApiResponse::NoContent => return Ok(ApiResponse::NoContent),
    };
    let ok = envelope
        .get("ok")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !ok {
        let code = envelope
            .get("error_code")
            .and_then(Value::as_i64)
            .unwrap_or(0);
        let message = envelope
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(ClientError::Platform { code, message });
    }
    let payload = envelope
        .get_mut("result")
        .map(Value::take)
        .unwrap_or(Value::Null);
    Ok(ApiResponse::Success(payload))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use serde_json::json;

    const OK_EMPTY: &str = r#"{"ok":true,"result":{}}"#;

    fn client(transport: MockTransport) -> ZaloClient<MockTransport> {
        ZaloClient::new(transport, "TOKEN")
    }

    // -- request assembly --------------------------------------------------

    #[test]
    fn endpoint_urls_embed_the_token() {
        let mut bot = client(MockTransport::answering(200, OK_EMPTY));
        bot.get_me().unwrap();
        assert_eq!(
            bot.transport.last_url(),
            "https://bot-api.zapps.me/botTOKEN/getMe"
        );
        assert_eq!(bot.transport.requests[0].0, Method::Get);
    }

    #[test]
    fn send_message_posts_a_form_body() {
        let mut bot = client(MockTransport::answering(200, OK_EMPTY));
        bot.send_message("thread", "hello world").unwrap();
        assert_eq!(bot.transport.last_body(), "chat_id=thread&text=hello+world");
        assert!(bot.transport.headers.contains(&(
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded".to_string()
        )));
        assert!(bot
            .transport
            .headers
            .iter()
            .any(|(name, value)| name == "Content-Length"
                && value == &bot.transport.last_body().len().to_string()));
    }

    #[test]
    fn send_photo_carries_all_three_fields() {
        let mut bot = client(MockTransport::answering(200, OK_EMPTY));
        bot.send_photo("t", "https://x/p.png", "a cat").unwrap();
        assert_eq!(
            bot.transport.last_body(),
            "chat_id=t&photo=https%3A%2F%2Fx%2Fp.png&caption=a+cat"
        );
    }

    #[test]
    fn send_sticker_and_chat_action_hit_their_endpoints() {
        let mut bot = client(MockTransport::answering(200, OK_EMPTY));
        bot.send_sticker("t", "st1").unwrap();
        assert!(bot.transport.last_url().ends_with("/sendSticker"));
        bot.send_chat_action("t", "typing").unwrap();
        assert!(bot.transport.last_url().ends_with("/sendChatAction"));
    }

    // -- validation --------------------------------------------------------

    #[test]
    fn empty_inputs_are_rejected_before_io() {
        let mut bot = client(MockTransport::answering(200, OK_EMPTY));
        assert_eq!(
            bot.send_message("", "hi").unwrap_err(),
            InvalidParameter::EmptyThreadId.into()
        );
        assert_eq!(
            bot.send_message("t", "").unwrap_err(),
            InvalidParameter::EmptyContent.into()
        );
        assert_eq!(
            bot.send_photo("t", "", "c").unwrap_err(),
            InvalidParameter::EmptyPhotoUrl.into()
        );
        assert_eq!(
            bot.send_sticker("t", "").unwrap_err(),
            InvalidParameter::EmptyStickerId.into()
        );
        assert_eq!(
            bot.send_chat_action("t", "").unwrap_err(),
            InvalidParameter::EmptyAction.into()
        );
        assert!(bot.transport.begun_urls.is_empty());
    }

    #[test]
    fn oversized_content_is_rejected() {
        let mut bot = client(MockTransport::answering(200, OK_EMPTY));
        let long = "x".repeat(2001);
        assert_eq!(
            bot.send_message("t", &long).unwrap_err(),
            InvalidParameter::ContentTooLong.into()
        );
    }

    #[test]
    fn offline_link_short_circuits() {
        let mut bot = client(MockTransport::offline());
        assert_eq!(bot.get_me().unwrap_err(), ClientError::NotConnected);
        assert!(bot.transport.begun_urls.is_empty());
    }

    // -- envelope unwrapping -----------------------------------------------

    #[test]
    fn success_unwraps_the_result_field() {
        let body = r#"{"ok":true,"result":{"id":"bot1","account_name":"demo"}}"#;
        let mut bot = client(MockTransport::answering(200, body));
        let resp = bot.get_me().unwrap();
        assert_eq!(resp.value().unwrap()["account_name"], "demo");
        assert!(resp.value().unwrap().get("ok").is_none());
    }

    #[test]
    fn ok_false_becomes_a_platform_error() {
        let body = r#"{"ok":false,"error_code":404,"description":"not found"}"#;
        let mut bot = client(MockTransport::answering(200, body));
        assert_eq!(
            bot.get_me().unwrap_err(),
            ClientError::Platform {
                code: 404,
                message: "not found".to_string()
            }
        );
    }

    #[test]
    fn missing_ok_field_is_treated_as_failure() {
        let mut bot = client(MockTransport::answering(200, r#"{"result":1}"#));
        assert!(matches!(
            bot.get_me().unwrap_err(),
            ClientError::Platform { code: 0, .. }
        ));
    }

    #[test]
    fn empty_body_is_an_empty_response_error() {
        let mut bot = client(MockTransport::answering(200, ""));
        assert_eq!(bot.get_me().unwrap_err(), ClientError::EmptyResponse);
    }

    #[test]
    fn negative_status_is_a_transport_error() {
        let mut bot = client(MockTransport::answering(-11, ""));
        assert_eq!(
            bot.get_me().unwrap_err(),
            ClientError::Transport(TransportError::ReadTimeout)
        );
    }

    // -- single-flight discipline ------------------------------------------

    #[test]
    fn foreground_send_cancels_a_pending_poll_exactly_once() {
        let mut bot = client(MockTransport::answering(200, OK_EMPTY));
        assert!(matches!(bot.poll_updates(), PollStatus::Started));
        assert!(bot.is_polling());

        bot.send_message("t", "interrupting").unwrap();
        assert!(!bot.is_polling());
        assert_eq!(bot.transport.cancels, 1);

        // No pending poll left, so the next send cancels nothing.
        bot.send_message("t", "again").unwrap();
        assert_eq!(bot.transport.cancels, 1);
    }

    #[test]
    fn poll_updates_walks_the_state_machine() {
        let updates = json!({
            "ok": true,
            "result": [{"update_id": 1, "message": {"text": "hi"}}]
        });
        let mut transport = MockTransport::answering(200, &updates.to_string());
        transport.async_ready = false;
        let mut bot = client(transport);

        assert!(matches!(bot.poll_updates(), PollStatus::Started));
        assert!(matches!(bot.poll_updates(), PollStatus::InProgress));

        bot.transport.async_ready = true;
        match bot.poll_updates() {
            PollStatus::Complete(Ok(ApiResponse::Success(payload))) => {
                assert_eq!(payload[0]["update_id"], 1);
            }
            other => panic!("expected completed updates, got {:?}", other),
        }
        assert!(!bot.is_polling());
    }

    #[test]
    fn poll_error_envelope_is_unwrapped_too() {
        let body = r#"{"ok":false,"error_code":401,"description":"invalid token"}"#;
        let mut transport = MockTransport::answering(200, body);
        transport.async_ready = true;
        let mut bot = client(transport);

        assert!(matches!(bot.poll_updates(), PollStatus::Started));
        match bot.poll_updates() {
            PollStatus::Complete(Err(ClientError::Platform { code, message })) => {
                assert_eq!(code, 401);
                assert_eq!(message, "invalid token");
            }
            other => panic!("expected a platform error, got {:?}", other),
        }
    }
}
