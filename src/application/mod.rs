//! Application layer: the session client and its event dispatcher.
//!
//! Transports push events into a `tokio` channel; a single dispatcher task
//! per session drains it, so inbound events are handled one at a time while
//! the host keeps calling the client from its own tasks.

pub mod dispatcher;
pub mod reconnect;
pub mod session;
