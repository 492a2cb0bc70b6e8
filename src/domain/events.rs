use std::fmt::Display;
use tokio::sync::mpsc;

/// Named channels used on the register connection.
pub mod channel {
    /// Outbound: employee sign-in.
    pub const EMPLOYEE: &str = "employee";
    /// Inbound: the register is ready to receive the employee.
    pub const READY: &str = "ready";
    /// Inbound: a customer checked in.
    pub const CUSTOMER: &str = "customer";
    /// Both directions: orders and rewards.
    pub const ORDER: &str = "order";
}

/// Disconnect reason reported when the server closed the session.
pub const SERVER_DISCONNECT: &str = "io server disconnect";
/// Disconnect reason reported when this client closed the session.
pub const CLIENT_DISCONNECT: &str = "io client disconnect";

/// An event produced by a transport and consumed by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected,
    Disconnected { reason: String },
    Message {
        event: String,
        payload: Option<String>,
    },
}

impl TransportEvent {
    pub fn disconnected(reason: impl Into<String>) -> Self {
        Self::Disconnected {
            reason: reason.into(),
        }
    }

    pub fn message(event: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::Message {
            event: event.into(),
            payload: Some(payload.into()),
        }
    }

    pub fn signal(event: impl Into<String>) -> Self {
        Self::Message {
            event: event.into(),
            payload: None,
        }
    }

    /// Reported when a connect never reached the register.
    pub fn connect_failed(detail: impl Display) -> Self {
        Self::disconnected(format!("connect error: {detail}"))
    }
}

/// Where transports push their events. Sending never blocks, so it is safe
/// to call from a transport's own callback thread.
pub type EventSink = mpsc::UnboundedSender<TransportEvent>;
pub type EventStream = mpsc::UnboundedReceiver<TransportEvent>;

pub fn event_channel() -> (EventSink, EventStream) {
    mpsc::unbounded_channel()
}

/// Whether a disconnect reason means the server ended the session.
pub fn is_server_disconnect(reason: &str) -> bool {
    reason == SERVER_DISCONNECT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_disconnect_detection() {
        assert!(is_server_disconnect("io server disconnect"));
        assert!(!is_server_disconnect("io client disconnect"));
        assert!(!is_server_disconnect("transport close"));
        assert!(!is_server_disconnect(""));
    }

    #[test]
    fn test_connect_failure_is_not_a_server_disconnect() {
        let event = TransportEvent::connect_failed("connection refused");
        assert_eq!(
            event,
            TransportEvent::disconnected("connect error: connection refused")
        );
        let TransportEvent::Disconnected { reason } = event else {
            unreachable!();
        };
        assert!(!is_server_disconnect(&reason));
    }

    #[tokio::test]
    async fn test_event_channel_preserves_order() {
        let (sink, mut stream) = event_channel();
        sink.send(TransportEvent::Connected).unwrap();
        sink.send(TransportEvent::signal(channel::READY)).unwrap();
        sink.send(TransportEvent::disconnected(SERVER_DISCONNECT))
            .unwrap();

        assert_eq!(stream.recv().await, Some(TransportEvent::Connected));
        assert_eq!(
            stream.recv().await,
            Some(TransportEvent::Message {
                event: "ready".into(),
                payload: None
            })
        );
        assert_eq!(
            stream.recv().await,
            Some(TransportEvent::Disconnected {
                reason: "io server disconnect".into()
            })
        );
    }
}
