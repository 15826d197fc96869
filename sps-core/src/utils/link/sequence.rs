//! Fixed start-up handshake.
//!
//! Frames go out strictly in order with a full pause after each one. The first
//! failure stops the sequence; later frames are not attempted.

use alloc::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_io::{Read, ReadReady, Write};

use super::dispatcher::{Exchange, LinkError, SerialDispatcher};
use crate::utils::protocol::frames::{CommandFrame, HANDSHAKE};

/// Pause after every dispatch in a sequence.
pub const INTER_FRAME_MS: u32 = 1000;

/// Receives progress while the handshake runs.
///
/// Any `FnMut(&Exchange)` closure is an observer that only sees completed
/// exchanges.
pub trait HandshakeObserver {
    /// Called with the decoded frame just before it is written.
    fn on_sent(
        &mut self,
        _frame: CommandFrame,
        _bytes: &[u8],
    ) {
    }

    /// Called once the reply has been drained, before the following pause.
    fn on_exchange(
        &mut self,
        exchange: &Exchange,
    );
}

impl<F> HandshakeObserver for F
where
    F: FnMut(&Exchange),
{
    fn on_exchange(
        &mut self,
        exchange: &Exchange,
    ) {
        self(exchange)
    }
}

/// Issue wake-up, device-identify, start, read and stop.
pub fn run_handshake<P, D, O>(
    dispatcher: &mut SerialDispatcher<P, D>,
    observer: &mut O,
) -> Result<Vec<Exchange>, LinkError<P::Error>>
where
    P: Read + Write + ReadReady,
    D: DelayNs,
    O: HandshakeObserver + ?Sized,
{
    let mut exchanges = Vec::with_capacity(HANDSHAKE.len());
    for frame in HANDSHAKE {
        let exchange = dispatcher.dispatch_with(frame, |bytes| observer.on_sent(frame, bytes))?;
        observer.on_exchange(&exchange);
        exchanges.push(exchange);
        dispatcher.pause_ms(INTER_FRAME_MS);
    }
    tracing::info!("handshake complete");
    Ok(exchanges)
}
