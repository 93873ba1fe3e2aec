//! The transport seam: everything that actually touches a socket.
//!
//! Constrained targets typically have exactly one TLS-capable connection, a
//! platform HTTP client, and a platform predicate for "is the network link
//! up". This module abstracts all of that behind [`Transport`] so the client
//! façades and the single-flight poller never name a concrete backend, and
//! the whole crate tests against an in-memory fake. Swapping HTTP stacks
//! only requires implementing this one trait.

use tracing::debug;

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

/// HTTP methods the façades actually issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// One-time transport setup: trust anchor, timeouts, user agent.
///
/// Handed to [`Transport::configure`] exactly once when a client is
/// constructed. TLS and certificate verification are entirely the
/// transport's business; the library only carries the PEM blob through.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Root CA certificate in PEM form, if the backend wants one installed.
    pub root_ca_pem: Option<String>,
    /// Timeout for synchronous (foreground) requests, in milliseconds.
    pub sync_timeout_ms: u32,
    /// Timeout for the asynchronous long-poll request, in milliseconds.
    /// Long polls hold the connection open far longer than a foreground
    /// call, hence the separate knob.
    pub async_timeout_ms: u32,
    /// User-agent header value, if the backend sends one.
    pub user_agent: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            root_ca_pem: None,
            sync_timeout_ms: 5_000,
            async_timeout_ms: 60_000,
            user_agent: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Transport trait
// ---------------------------------------------------------------------------

/// A single-connection HTTP(S) transport.
///
/// Implementations own one physical connection. The synchronous cycle is
/// `begin` → `add_header`* → `send_request` → `body` → `end`; the
/// asynchronous cycle (used only for long polling) is `begin` →
/// `send_get_async` → [`available`](Transport::available) until data shows
/// up → `process_async`/`async_status`/`async_body` → `end`, with
/// `cancel_async` abandoning the request at any point.
///
/// Status codes follow the embedded-HTTP-client convention: HTTP statuses
/// are positive, transport failures are negative (see
/// [`TransportError`](crate::response::TransportError) for the mapping).
/// Bodies are returned fully decoded; chunked transfer encoding is the
/// transport's problem, not the caller's.
pub trait Transport {
    /// Apply one-time configuration. Called once per client construction.
    fn configure(&mut self, config: &TransportConfig);

    /// Whether the network link is up. Consulted before every request;
    /// when this returns `false` no other method will be called.
    fn network_up(&self) -> bool;

    /// Open a request to `url`. Returns `false` if the connection could
    /// not be set up.
    fn begin(&mut self, url: &str) -> bool;

    /// Add a request header. Only valid between `begin` and the send.
    fn add_header(&mut self, name: &str, value: &str);

    /// Send the request synchronously and block until the status line is
    /// read. Returns the HTTP status, or a negative transport error code.
    fn send_request(&mut self, method: Method, body: &[u8]) -> i32;

    /// The response body of the last synchronous request, fully decoded.
    fn body(&mut self) -> String;

    /// Issue an asynchronous GET on the connection opened by `begin`.
    fn send_get_async(&mut self);

    /// Bytes of response data currently available on the async request.
    fn available(&self) -> usize;

    /// Drive the async response forward (read status line + headers).
    /// Returns a negative transport error code on failure.
    fn process_async(&mut self) -> i32;

    /// HTTP status of the completed async response, or a negative
    /// transport error code.
    fn async_status(&self) -> i32;

    /// The async response body, fully decoded.
    fn async_body(&mut self) -> String;

    /// Abandon the in-flight async request and its socket.
    fn cancel_async(&mut self);

    /// Release the connection after a completed request.
    fn end(&mut self);
}

pub(crate) fn apply_config<T: Transport>(transport: &mut T, config: &TransportConfig) {
    debug!(
        sync_timeout_ms = config.sync_timeout_ms,
        async_timeout_ms = config.async_timeout_ms,
        has_ca = config.root_ca_pem.is_some(),
        "configuring transport"
    );
    transport.configure(config);
}

// ---------------------------------------------------------------------------
// Test transport
// ---------------------------------------------------------------------------

/// A scriptable in-memory transport used by the unit tests.
#[cfg(test)]
pub(crate) mod mock {
    use super::{Method, Transport, TransportConfig};

    #[derive(Debug, Default)]
    pub struct MockTransport {
        // Scripted behavior.
        pub link_up: bool,
        pub begin_ok: bool,
        pub status: i32,
        pub response: String,
        pub async_ready: bool,
        pub process_status: i32,
        pub async_response_status: i32,
        pub async_response: String,
        // Recorded interactions.
        pub configured: Vec<TransportConfig>,
        pub begun_urls: Vec<String>,
        pub headers: Vec<(String, String)>,
        pub requests: Vec<(Method, String)>,
        pub async_gets: usize,
        pub cancels: usize,
        pub ends: usize,
    }

    impl MockTransport {
        /// A transport with the link up that answers `status` + `response`.
        pub fn answering(status: i32, response: &str) -> Self {
            Self {
                link_up: true,
                begin_ok: true,
                status,
                response: response.to_string(),
                process_status: 0,
                async_response_status: status,
                async_response: response.to_string(),
                ..Self::default()
            }
        }

        pub fn offline() -> Self {
            Self {
                link_up: false,
                ..Self::default()
            }
        }

        pub fn last_url(&self) -> &str {
            self.begun_urls.last().map(String::as_str).unwrap_or("")
        }

        pub fn last_body(&self) -> &str {
            self.requests.last().map(|(_, b)| b.as_str()).unwrap_or("")
        }
    }

    impl Transport for MockTransport {
        fn configure(&mut self, config: &TransportConfig) {
            self.configured.push(config.clone());
        }

        fn network_up(&self) -> bool {
            self.link_up
        }

        fn begin(&mut self, url: &str) -> bool {
            self.begun_urls.push(url.to_string());
            self.begin_ok
        }

        fn add_header(&mut self, name: &str, value: &str) {
            self.headers.push((name.to_string(), value.to_string()));
        }

        fn send_request(&mut self, method: Method, body: &[u8]) -> i32 {
            self.requests
                .push((method, String::from_utf8_lossy(body).into_owned()));
            self.status
        }

        fn body(&mut self) -> String {
            self.response.clone()
        }

        fn send_get_async(&mut self) {
            self.async_gets += 1;
        }

        fn available(&self) -> usize {
            if self.async_ready {
                self.async_response.len().max(1)
            } else {
                0
            }
        }

        fn process_async(&mut self) -> i32 {
            self.process_status
        }

        fn async_status(&self) -> i32 {
            self.async_response_status
        }

        fn async_body(&mut self) -> String {
            self.async_response.clone()
        }

        fn cancel_async(&mut self) {
            self.cancels += 1;
        }

        fn end(&mut self) {
            self.ends += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_strings_match_http() {
        assert_eq!(Method::Get.as_str(), "GET");
        assert_eq!(Method::Post.as_str(), "POST");
        assert_eq!(Method::Put.as_str(), "PUT");
    }

    #[test]
    fn default_config_has_embedded_timeouts() {
        let config = TransportConfig::default();
        assert_eq!(config.sync_timeout_ms, 5_000);
        assert_eq!(config.async_timeout_ms, 60_000);
        assert!(config.root_ca_pem.is_none());
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn apply_config_reaches_the_transport() {
        let mut transport = mock::MockTransport::default();
        let config = TransportConfig {
            user_agent: Some("chatwire/0.1".to_string()),
            ..TransportConfig::default()
        };
        apply_config(&mut transport, &config);
        assert_eq!(transport.configured.len(), 1);
        assert_eq!(
            transport.configured[0].user_agent.as_deref(),
            Some("chatwire/0.1")
        );
    }
}
