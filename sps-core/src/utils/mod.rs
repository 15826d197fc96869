//! Utility re-exports for the SPS30 serial link.
//!
//! This module re-exports the frame definitions, the serial dispatcher and the
//! simulated sensor:
//!
//! - `protocol`: the fixed command frames and SHDLC framing helpers
//! - `link`: the serial dispatcher and the start-up handshake sequence
//! - `sim`: an in-memory sensor that answers SHDLC requests

pub mod link;
pub mod protocol;
pub mod sim;

pub use link::dispatcher::{Exchange, LinkError, SerialDispatcher};
pub use link::sequence::{run_handshake, HandshakeObserver};
pub use protocol::frames::{CommandFrame, HANDSHAKE};
pub use sim::SimulatedSensor;
