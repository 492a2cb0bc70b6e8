//! Domain layer: value objects exchanged with the register, wire envelopes,
//! transport events and the ports the application layer depends on.

pub mod events;
pub mod model;
pub mod payload;
pub mod ports;
