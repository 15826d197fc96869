//! In-memory SPS30 that answers SHDLC requests.
//!
//! Implements the same `embedded_io` traits as a real serial handle, so the
//! dispatcher can run the full handshake without hardware. Replies are queued
//! as soon as a complete request frame has been written, which makes them
//! available to the next drain.

use alloc::{collections::VecDeque, vec::Vec};
use core::convert::Infallible;

use embedded_io::{ErrorType, Read, ReadReady, Write};

use crate::utils::protocol::shdlc::{self, command, MosiFrame, START_STOP};

/// Product type string returned for device information subcommand `0x00`.
pub const PRODUCT_TYPE: &[u8] = b"00080000\0";
/// Serial number returned for device information subcommand `0x03`.
pub const SERIAL_NUMBER: &[u8] = b"SIM0000000000000\0";

const STATE_OK: u8 = 0x00;
const STATE_ILLEGAL_PARAMETER: u8 = 0x04;

/// Mass and number concentrations reported while measuring.
pub const SAMPLE_READING: [f32; 10] = [12.5, 18.25, 20.0, 21.0, 80.0, 95.0, 97.5, 98.0, 98.5, 0.6];

/// Simulated sensor on the far end of a serial line.
#[derive(Debug, Default)]
pub struct SimulatedSensor {
    partial: Option<Vec<u8>>,
    outbox: VecDeque<u8>,
    requests: Vec<MosiFrame>,
    measuring: bool,
}

impl SimulatedSensor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every well-formed request handled so far, oldest first.
    pub fn requests(&self) -> &[MosiFrame] {
        &self.requests
    }

    pub fn is_measuring(&self) -> bool {
        self.measuring
    }

    fn feed(
        &mut self,
        byte: u8,
    ) {
        if byte != START_STOP {
            // bytes outside a frame, e.g. the 0xFF wake pulse, are ignored
            if let Some(body) = self.partial.as_mut() {
                body.push(byte);
            }
            return;
        }

        match self.partial.take() {
            Some(body) if !body.is_empty() => {
                let mut raw = Vec::with_capacity(body.len() + 2);
                raw.push(START_STOP);
                raw.extend(body);
                raw.push(START_STOP);
                self.handle(&raw);
            }
            _ => self.partial = Some(Vec::new()),
        }
    }

    fn handle(
        &mut self,
        raw: &[u8],
    ) {
        let request = match shdlc::decode_mosi(raw) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("simulated sensor dropped request: {}", e);
                return;
            }
        };

        let (state, data): (u8, Vec<u8>) = match request.command {
            command::START_MEASUREMENT => {
                self.measuring = true;
                (STATE_OK, Vec::new())
            }
            command::STOP_MEASUREMENT => {
                self.measuring = false;
                (STATE_OK, Vec::new())
            }
            command::READ_MEASUREMENT if self.measuring => (
                STATE_OK,
                SAMPLE_READING.iter().flat_map(|v| v.to_be_bytes()).collect(),
            ),
            command::READ_MEASUREMENT | command::SLEEP | command::WAKE_UP => {
                (STATE_OK, Vec::new())
            }
            command::DEVICE_INFORMATION => match request.data.first() {
                Some(0x00) => (STATE_OK, PRODUCT_TYPE.to_vec()),
                Some(0x03) => (STATE_OK, SERIAL_NUMBER.to_vec()),
                _ => (STATE_ILLEGAL_PARAMETER, Vec::new()),
            },
            _ => (shdlc::STATE_UNKNOWN_COMMAND, Vec::new()),
        };

        match shdlc::encode_miso(request.address, request.command, state, &data) {
            Ok(reply) => self.outbox.extend(reply),
            Err(e) => tracing::error!("simulated sensor could not build reply: {}", e),
        }
        self.requests.push(request);
    }
}

impl ErrorType for SimulatedSensor {
    type Error = Infallible;
}

impl Write for SimulatedSensor {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> Result<usize, Self::Error> {
        for &b in buf {
            self.feed(b);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Read for SimulatedSensor {
    fn read(
        &mut self,
        buf: &mut [u8],
    ) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.outbox.len());
        for (slot, byte) in buf.iter_mut().zip(self.outbox.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl ReadReady for SimulatedSensor {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.outbox.is_empty())
    }
}
