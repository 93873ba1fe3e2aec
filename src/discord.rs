//! Client façades for the Discord REST API.
//!
//! Two entry points share one request funnel: [`DiscordClient`] for
//! token-authenticated bot calls and [`WebhookClient`] for pre-authorized
//! webhook URLs. Both validate locally first, consult the connectivity
//! predicate, and only then touch the transport, so every failure mode is
//! typed before a single byte goes out.

use serde_json::{json, Value};
use tracing::debug;

use crate::encode::percent_encode;
use crate::message::MessageBuilder;
use crate::response::{
    classify, ApiResponse, ApiResult, ClientError, InvalidParameter, TransportError,
};
use crate::transport::{apply_config, Method, Transport, TransportConfig};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://discord.com/api/v10";
const USER_AGENT: &str = "chatwire (https://crates.io/crates/chatwire, 0.1)";

/// Platform cap on plain message content, in characters.
const CONTENT_MAX: usize = 2000;

// ---------------------------------------------------------------------------
// Shared request funnel
// ---------------------------------------------------------------------------

fn send_request<T: Transport>(
    transport: &mut T,
    url: &str,
    method: Method,
    auth: Option<&str>,
    payload: Option<&Value>,
) -> ApiResult {
    if !transport.begin(url) {
        return Err(ClientError::Transport(TransportError::ConnectionFailed));
    }
    if let Some(auth) = auth {
        transport.add_header("Authorization", auth);
    }
    transport.add_header("Content-Type", "application/json");
    let body = payload.map(Value::to_string).unwrap_or_default();
    debug!(method = method.as_str(), url, "sending request");
    let status = transport.send_request(method, body.as_bytes());
    if status < 0 {
        transport.end();
        return Err(ClientError::Transport(TransportError::from_code(status)));
    }
    if status == 204 {
        transport.end();
        return Ok(ApiResponse::NoContent);
    }
    let text = transport.body();
    transport.end();
    classify(status, &text)
}

// ---------------------------------------------------------------------------
// Message-history query
// ---------------------------------------------------------------------------

/// Query parameters for fetching channel message history.
///
/// At most one of the `around`/`before`/`after` anchors may be set, and
/// `limit` must stay within 1..=100; both are checked before any I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageQuery {
    around: Option<String>,
    before: Option<String>,
    after: Option<String>,
    limit: u8,
}

impl Default for MessageQuery {
    fn default() -> Self {
        Self {
            around: None,
            before: None,
            after: None,
            limit: 50,
        }
    }
}

impl MessageQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn around(mut self, message_id: impl Into<String>) -> Self {
        self.around = Some(message_id.into());
        self
    }

    pub fn before(mut self, message_id: impl Into<String>) -> Self {
        self.before = Some(message_id.into());
        self
    }

    pub fn after(mut self, message_id: impl Into<String>) -> Self {
        self.after = Some(message_id.into());
        self
    }

    pub fn limit(mut self, limit: u8) -> Self {
        self.limit = limit;
        self
    }

    fn validate(&self) -> Result<(), InvalidParameter> {
        if self.limit < 1 || self.limit > 100 {
            return Err(InvalidParameter::LimitOutOfRange);
        }
        let anchors = [&self.around, &self.before, &self.after]
            .iter()
            .filter(|anchor| anchor.is_some())
            .count();
        if anchors > 1 {
            return Err(InvalidParameter::ConflictingAnchors);
        }
        Ok(())
    }

    fn query_string(&self) -> String {
        let mut query = String::new();
        for (key, anchor) in [
            ("around", &self.around),
            ("before", &self.before),
            ("after", &self.after),
        ] {
            if let Some(id) = anchor {
                query.push_str(key);
                query.push('=');
                query.push_str(id);
                query.push('&');
            }
        }
        query.push_str("limit=");
        query.push_str(&self.limit.to_string());
        query
    }
}

// ---------------------------------------------------------------------------
// DiscordClient (bot API)
// ---------------------------------------------------------------------------

/// Token-authenticated client for the bot REST API.
pub struct DiscordClient<T: Transport> {
    transport: T,
    token: String,
}

impl<T: Transport> DiscordClient<T> {
    /// Create a client with default transport configuration.
    pub fn new(transport: T, token: impl Into<String>) -> Self {
        Self::with_config(transport, token, TransportConfig::default())
    }

    /// Create a client, applying `config` to the transport once.
    pub fn with_config(
        mut transport: T,
        token: impl Into<String>,
        mut config: TransportConfig,
    ) -> Self {
        if config.user_agent.is_none() {
            config.user_agent = Some(USER_AGENT.to_string());
        }
        apply_config(&mut transport, &config);
        Self {
            transport,
            token: token.into(),
        }
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    /// Send a plain text message to a channel.
    pub fn send_text(&mut self, channel_id: &str, content: &str) -> ApiResult {
        if self.token.is_empty() {
            return Err(InvalidParameter::EmptyToken.into());
        }
        if channel_id.is_empty() {
            return Err(InvalidParameter::EmptyChannelId.into());
        }
        if content.is_empty() {
            return Err(InvalidParameter::EmptyContent.into());
        }
        if !self.transport.network_up() {
            return Err(ClientError::NotConnected);
        }
        if content.chars().count() > CONTENT_MAX {
            return Err(InvalidParameter::ContentTooLong.into());
        }
        let payload = json!({ "content": content });
        let url = format!("{}/channels/{}/messages", BASE_URL, channel_id);
        self.request(&url, Method::Post, Some(&payload))
    }

    /// Send a rich message (embeds, components, flags) to a channel.
    pub fn send_message(&mut self, channel_id: &str, message: &MessageBuilder) -> ApiResult {
        if self.token.is_empty() {
            return Err(InvalidParameter::EmptyToken.into());
        }
        if channel_id.is_empty() {
            return Err(InvalidParameter::EmptyChannelId.into());
        }
        if !self.transport.network_up() {
            return Err(ClientError::NotConnected);
        }
        message.validate()?;
        let payload = message.to_payload(false);
        let url = format!("{}/channels/{}/messages", BASE_URL, channel_id);
        self.request(&url, Method::Post, Some(&payload))
    }

    /// React to a message. Unicode emoji are percent-encoded; custom
    /// emoji given as `name:id` are passed through.
    pub fn add_reaction(
        &mut self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> ApiResult {
        if self.token.is_empty() {
            return Err(InvalidParameter::EmptyToken.into());
        }
        if channel_id.is_empty() {
            return Err(InvalidParameter::EmptyChannelId.into());
        }
        if message_id.is_empty() {
            return Err(InvalidParameter::EmptyMessageId.into());
        }
        if emoji.is_empty() {
            return Err(InvalidParameter::EmptyEmoji.into());
        }
        if !self.transport.network_up() {
            return Err(ClientError::NotConnected);
        }
        let encoded = if emoji.contains(':') {
            emoji.to_string()
        } else {
            percent_encode(emoji)
        };
        let url = format!(
            "{}/channels/{}/messages/{}/reactions/{}/@me",
            BASE_URL, channel_id, message_id, encoded
        );
        self.request(&url, Method::Put, None)
    }

    /// Fetch channel message history.
    pub fn get_messages(&mut self, channel_id: &str, query: &MessageQuery) -> ApiResult {
        if self.token.is_empty() {
            return Err(InvalidParameter::EmptyToken.into());
        }
        if channel_id.is_empty() {
            return Err(InvalidParameter::EmptyChannelId.into());
        }
        query.validate()?;
        if !self.transport.network_up() {
            return Err(ClientError::NotConnected);
        }
        let url = format!(
            "{}/channels/{}/messages?{}",
            BASE_URL,
            channel_id,
            query.query_string()
        );
        self.request(&url, Method::Get, None)
    }

    /// Borrow the underlying transport, e.g. to inspect or reconfigure it.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Consume the client and reclaim the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    fn request(&mut self, url: &str, method: Method, payload: Option<&Value>) -> ApiResult {
        let auth = format!("Bot {}", self.token);
        send_request(&mut self.transport, url, method, Some(&auth), payload)
    }
}

impl<T: Transport> std::fmt::Debug for DiscordClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordClient")
            .field("token", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// WebhookClient
// ---------------------------------------------------------------------------

/// Client for a single pre-authorized webhook URL.
///
/// To post into an existing thread, append `?thread_id=<id>` to the webhook
/// URL; the query-string builders here respect a pre-existing query.
pub struct WebhookClient<T: Transport> {
    transport: T,
    url: String,
}

impl<T: Transport> WebhookClient<T> {
    pub fn new(transport: T, url: impl Into<String>) -> Self {
        Self::with_config(transport, url, TransportConfig::default())
    }

    pub fn with_config(
        mut transport: T,
        url: impl Into<String>,
        mut config: TransportConfig,
    ) -> Self {
        if config.user_agent.is_none() {
            config.user_agent = Some(USER_AGENT.to_string());
        }
        apply_config(&mut transport, &config);
        Self {
            transport,
            url: url.into(),
        }
    }

    /// Send a message and wait for the created message object in response.
    pub fn send(&mut self, message: &MessageBuilder) -> ApiResult {
        self.send_inner(message, true, None)
    }

    /// Send a message without asking for the created message back; the
    /// platform answers 204.
    pub fn send_no_wait(&mut self, message: &MessageBuilder) -> ApiResult {
        self.send_inner(message, false, None)
    }

    /// Send a message that opens a new forum thread named `thread_name`,
    /// tagged with `tag_ids`.
    pub fn send_in_thread(
        &mut self,
        message: &MessageBuilder,
        thread_name: &str,
        tag_ids: &[u64],
    ) -> ApiResult {
        self.send_inner(message, true, Some((thread_name, tag_ids)))
    }

    pub fn send_no_wait_in_thread(
        &mut self,
        message: &MessageBuilder,
        thread_name: &str,
        tag_ids: &[u64],
    ) -> ApiResult {
        self.send_inner(message, false, Some((thread_name, tag_ids)))
    }

    /// Send plain text.
    pub fn send_text(&mut self, content: &str) -> ApiResult {
        if content.is_empty() {
            return Err(InvalidParameter::EmptyContent.into());
        }
        let message = MessageBuilder::new().content(content);
        self.send(&message)
    }

    /// Borrow the underlying transport, e.g. to inspect or reconfigure it.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Consume the client and reclaim the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    fn send_inner(
        &mut self,
        message: &MessageBuilder,
        wait: bool,
        thread: Option<(&str, &[u64])>,
    ) -> ApiResult {
        if self.url.is_empty() {
            return Err(InvalidParameter::EmptyWebhookUrl.into());
        }
        if !self.transport.network_up() {
            return Err(ClientError::NotConnected);
        }
        message.validate()?;
        let url = webhook_send_url(&self.url, wait, message.is_components_v2());
        let mut payload = message.to_payload(true);
        if let Some((thread_name, tag_ids)) = thread {
            if !thread_name.is_empty() {
                payload["thread_name"] = json!(thread_name);
                payload["applied_tags"] = json!(tag_ids);
            }
        }
        send_request(&mut self.transport, &url, Method::Post, None, Some(&payload))
    }
}

impl<T: Transport> std::fmt::Debug for WebhookClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookClient")
            .field("url", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Webhook URL assembly
// ---------------------------------------------------------------------------

fn append_query_param(url: &mut String, param: &str) {
    if url.contains('?') {
        url.push('&');
    } else {
        url.push('?');
    }
    url.push_str(param);
}

fn webhook_send_url(base: &str, wait: bool, with_components: bool) -> String {
    let mut url = base.to_string();
    if wait && !base.contains("wait=true") {
        append_query_param(&mut url, "wait=true");
    }
    if with_components {
        append_query_param(&mut url, "with_components=true");
    }
    url
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
