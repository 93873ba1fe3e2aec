//! Single-flight async poller.
//!
//! Connection-constrained targets cannot hold a long-poll and a foreground
//! request open at once, so at most one logical request is ever in flight.
//! [`Poller`] tracks that one pending request and exposes a non-blocking
//! [`poll`](Poller::poll): callers invoke it from their own loop and get
//! control back immediately. The suspension point is the caller's loop,
//! never a block inside the library.
//!
//! A foreground call that needs the connection invokes
//! [`cancel`](Poller::cancel) first; the pending request is abandoned at
//! the transport level and no partial response ever escapes.

use tracing::debug;

use crate::response::{classify, ApiResult, ClientError, TransportError};
use crate::transport::Transport;

/// Outcome of a single [`Poller::poll`] call.
#[derive(Debug)]
pub enum PollStatus {
    /// No request was pending; one has been issued. Poll again later.
    Started,
    /// The pending request has produced no data yet. Poll again later.
    InProgress,
    /// The pending request finished; the classified result is inside.
    Complete(ApiResult),
}

/// Tracks the one in-flight polling request.
///
/// All I/O goes through the borrowed [`Transport`], so the state machine
/// itself is plain data and tests drive it with a fake.
#[derive(Debug, Default)]
pub struct Poller {
    pending: bool,
}

impl Poller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Advance the poll state machine by one step.
    ///
    /// Idle: issues an async GET on `url` and returns
    /// [`PollStatus::Started`]. Pending without data: returns
    /// [`PollStatus::InProgress`]. Pending with data: harvests the
    /// response, returns to idle, and hands back the classified result.
    /// Every completion path (success, transport failure, parse failure)
    /// resets the state to idle.
    pub fn poll<T: Transport>(&mut self, transport: &mut T, url: &str) -> PollStatus {
        if !self.pending {
            if !transport.network_up() {
                return PollStatus::Complete(Err(ClientError::NotConnected));
            }
            debug!(url, "starting long poll");
            if !transport.begin(url) {
                return PollStatus::Complete(Err(ClientError::Transport(
                    TransportError::ConnectionFailed,
                )));
            }
            transport.send_get_async();
            self.pending = true;
            return PollStatus::Started;
        }

        if transport.available() == 0 {
            return PollStatus::InProgress;
        }

        self.pending = false;
        PollStatus::Complete(harvest(transport))
    }

    /// Abandon the pending request, if any.
    ///
    /// Every foreground request on the shared connection must call this
    /// first; the transport-level cancel is issued exactly once and any
    /// partial response is discarded.
    pub fn cancel<T: Transport>(&mut self, transport: &mut T) {
        if self.pending {
            debug!("cancelling pending long poll");
            transport.cancel_async();
            self.pending = false;
        }
    }
}

fn harvest<T: Transport>(transport: &mut T) -> ApiResult {
    if !transport.network_up() {
        transport.end();
        return Err(ClientError::NotConnected);
    }
    let process_status = transport.process_async();
    if process_status < 0 {
        transport.end();
        return Err(ClientError::Transport(TransportError::from_code(
            process_status,
        )));
    }
    let body = transport.async_body();
    let status = transport.async_status();
    if status < 0 {
        transport.end();
        return Err(ClientError::Transport(TransportError::from_code(status)));
    }
    transport.end();
    debug!(status, "long poll completed");
    if body.is_empty() {
        return Err(ClientError::EmptyResponse);
    }
    classify(status, &body)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ApiResponse;
    use crate::transport::mock::MockTransport;

    const URL: &str = "https://bot.example/getUpdates";

    #[test]
    fn poll_on_idle_starts_a_request() {
        let mut transport = MockTransport::answering(200, r#"{"ok":true}"#);
        let mut poller = Poller::new();

        assert!(matches!(poller.poll(&mut transport, URL), PollStatus::Started));
        assert!(poller.is_pending());
        assert_eq!(transport.async_gets, 1);
        assert_eq!(transport.last_url(), URL);
    }

    #[test]
    fn poll_before_data_reports_in_progress() {
        let mut transport = MockTransport::answering(200, "{}");
        transport.async_ready = false;
        let mut poller = Poller::new();

        poller.poll(&mut transport, URL);
        assert!(matches!(
            poller.poll(&mut transport, URL),
            PollStatus::InProgress
        ));
        assert!(poller.is_pending());
        // No second request was issued.
        assert_eq!(transport.async_gets, 1);
    }

    #[test]
    fn poll_with_data_harvests_and_returns_to_idle() {
        let mut transport = MockTransport::answering(200, r#"{"ok":true,"result":[]}"#);
        let mut poller = Poller::new();

        poller.poll(&mut transport, URL);
        transport.async_ready = true;

        match poller.poll(&mut transport, URL) {
            PollStatus::Complete(Ok(ApiResponse::Success(value))) => {
                assert_eq!(value["ok"], true);
            }
            other => panic!("expected a completed poll, got {:?}", other),
        }
        assert!(!poller.is_pending());
        assert_eq!(transport.ends, 1);
    }

    #[test]
    fn negative_process_status_surfaces_as_transport_error() {
        let mut transport = MockTransport::answering(200, "{}");
        let mut poller = Poller::new();
        poller.poll(&mut transport, URL);

        transport.async_ready = true;
        transport.process_status = -11;

        match poller.poll(&mut transport, URL) {
            PollStatus::Complete(Err(ClientError::Transport(e))) => {
                assert_eq!(e, TransportError::ReadTimeout);
            }
            other => panic!("expected a transport error, got {:?}", other),
        }
        assert!(!poller.is_pending());
    }

    #[test]
    fn negative_response_code_surfaces_as_transport_error() {
        let mut transport = MockTransport::answering(200, "{}");
        let mut poller = Poller::new();
        poller.poll(&mut transport, URL);

        transport.async_ready = true;
        transport.async_response_status = -5;

        assert!(matches!(
            poller.poll(&mut transport, URL),
            PollStatus::Complete(Err(ClientError::Transport(TransportError::ConnectionLost)))
        ));
    }

    #[test]
    fn malformed_body_resets_to_idle_with_a_parse_error() {
        let mut transport = MockTransport::answering(200, "not json");
        let mut poller = Poller::new();
        poller.poll(&mut transport, URL);
        transport.async_ready = true;

        assert!(matches!(
            poller.poll(&mut transport, URL),
            PollStatus::Complete(Err(ClientError::Deserialization(_)))
        ));
        assert!(!poller.is_pending());

        // The machine is reusable: the next poll starts a fresh request.
        assert!(matches!(poller.poll(&mut transport, URL), PollStatus::Started));
    }

    #[test]
    fn cancel_while_pending_cancels_the_transport_once() {
        let mut transport = MockTransport::answering(200, "{}");
        let mut poller = Poller::new();
        poller.poll(&mut transport, URL);

        poller.cancel(&mut transport);
        assert!(!poller.is_pending());
        assert_eq!(transport.cancels, 1);

        // Idempotent: a second cancel is a no-op.
        poller.cancel(&mut transport);
        assert_eq!(transport.cancels, 1);
    }

    #[test]
    fn cancel_on_idle_does_nothing() {
        let mut transport = MockTransport::answering(200, "{}");
        let mut poller = Poller::new();
        poller.cancel(&mut transport);
        assert_eq!(transport.cancels, 0);
    }

    #[test]
    fn poll_with_the_link_down_fails_without_io() {
        let mut transport = MockTransport::offline();
        let mut poller = Poller::new();

        assert!(matches!(
            poller.poll(&mut transport, URL),
            PollStatus::Complete(Err(ClientError::NotConnected))
        ));
        assert!(!poller.is_pending());
        assert!(transport.begun_urls.is_empty());
    }

    #[test]
    fn failed_begin_surfaces_connection_failed() {
        let mut transport = MockTransport::answering(200, "{}");
        transport.begin_ok = false;
        let mut poller = Poller::new();

        assert!(matches!(
            poller.poll(&mut transport, URL),
            PollStatus::Complete(Err(ClientError::Transport(
                TransportError::ConnectionFailed
            )))
        ));
        assert!(!poller.is_pending());
    }
}
