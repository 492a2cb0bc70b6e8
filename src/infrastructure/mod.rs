//! Transport adapters.

pub mod in_memory;
#[cfg(feature = "transport-socketio")]
pub mod socketio;
