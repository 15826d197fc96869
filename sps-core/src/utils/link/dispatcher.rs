//! Serial dispatcher for the SPS30.
//!
//! The dispatcher owns the serial handle and the clock for as long as it
//! lives. Each call writes one frame, waits a fixed settle interval and then
//! drains whatever the device has already answered, without blocking for more.

use alloc::{string::String, vec::Vec};
use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_io::{Read, ReadReady, Write};

use crate::utils::protocol::{
    frames::{decode_hex, CommandFrame},
    shdlc,
};

/// Pause between writing a frame and draining the reply.
pub const SETTLE_MS: u32 = 100;
/// Prefix of the console line showing the bytes sent.
pub const SENT_PREFIX: &str = "(0x)>";
/// Prefix of the console line showing the bytes received.
pub const RECEIVED_PREFIX: &str = "  <";

const DRAIN_CHUNK: usize = 64;

/// Errors that end a dispatch.
#[derive(Debug)]
pub enum LinkError<E: fmt::Debug> {
    /// The frame text was not valid hex.
    Decode(hex::FromHexError),
    /// Writing to or reading from the serial handle failed.
    Io(E),
}

impl<E: fmt::Debug> fmt::Display for LinkError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::Decode(e) => write!(f, "invalid hex frame: {e}"),
            LinkError::Io(e) => write!(f, "serial I/O failed: {e:?}"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for LinkError<E> {}

impl<E: fmt::Debug> From<hex::FromHexError> for LinkError<E> {
    fn from(e: hex::FromHexError) -> Self {
        LinkError::Decode(e)
    }
}

/// One frame written and the bytes collected after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// Which handshake frame was sent, `None` for caller-supplied hex.
    pub frame: Option<CommandFrame>,
    pub sent: Vec<u8>,
    pub received: Vec<u8>,
}

impl Exchange {
    pub fn sent_hex(&self) -> String {
        hex::encode(&self.sent)
    }

    pub fn received_hex(&self) -> String {
        hex::encode(&self.received)
    }
}

/// Console line for bytes about to be written.
pub fn sent_line(bytes: &[u8]) -> String {
    let mut line = String::from(SENT_PREFIX);
    line.push_str(&hex::encode(bytes));
    line
}

/// Console line for bytes drained after a write.
pub fn received_line(bytes: &[u8]) -> String {
    let mut line = String::from(RECEIVED_PREFIX);
    line.push_str(&hex::encode(bytes));
    line
}

/// Renders the two console lines for this exchange.
impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", sent_line(&self.sent))?;
        write!(f, "{}", received_line(&self.received))
    }
}

/// Writes frames to an owned serial handle and collects the replies.
pub struct SerialDispatcher<P, D> {
    port: P,
    delay: D,
}

impl<P, D> SerialDispatcher<P, D>
where
    P: Read + Write + ReadReady,
    D: DelayNs,
{
    /// Take ownership of an opened serial handle and a clock.
    pub fn new(
        port: P,
        delay: D,
    ) -> Self {
        SerialDispatcher { port, delay }
    }

    /// Give back the serial handle and the clock.
    pub fn into_parts(self) -> (P, D) {
        (self.port, self.delay)
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    /// Write `frame`, wait [`SETTLE_MS`], then drain the receive buffer.
    ///
    /// Returns an empty vector when the device has not answered; there is no
    /// retry and no wait beyond the settle interval.
    pub fn send(
        &mut self,
        frame: &[u8],
    ) -> Result<Vec<u8>, LinkError<P::Error>> {
        self.port.write_all(frame).map_err(LinkError::Io)?;
        self.port.flush().map_err(LinkError::Io)?;
        tracing::debug!(len = frame.len(), "frame written");

        self.delay.delay_ms(SETTLE_MS);

        let received = self.drain()?;
        log_response(&received);
        Ok(received)
    }

    /// Read everything currently buffered at the receiver.
    ///
    /// Stops as soon as the port reports nothing ready.
    pub fn drain(&mut self) -> Result<Vec<u8>, LinkError<P::Error>> {
        let mut received = Vec::new();
        let mut chunk = [0u8; DRAIN_CHUNK];
        while self.port.read_ready().map_err(LinkError::Io)? {
            let n = self.port.read(&mut chunk).map_err(LinkError::Io)?;
            if n == 0 {
                break;
            }
            received.extend_from_slice(&chunk[..n]);
        }
        Ok(received)
    }

    /// Decode `text` and send it.
    pub fn send_hex(
        &mut self,
        text: &str,
    ) -> Result<Exchange, LinkError<P::Error>> {
        let sent = decode_hex(text)?;
        let received = self.send(&sent)?;
        Ok(Exchange {
            frame: None,
            sent,
            received,
        })
    }

    /// Send one of the handshake frames.
    pub fn dispatch(
        &mut self,
        frame: CommandFrame,
    ) -> Result<Exchange, LinkError<P::Error>> {
        self.dispatch_with(frame, |_| {})
    }

    /// Send one of the handshake frames, handing its decoded bytes to
    /// `before_write` first.
    ///
    /// `before_write` runs even when the write itself then fails.
    pub fn dispatch_with<F>(
        &mut self,
        frame: CommandFrame,
        before_write: F,
    ) -> Result<Exchange, LinkError<P::Error>>
    where
        F: FnOnce(&[u8]),
    {
        tracing::info!(frame = frame.name(), "dispatching");
        let sent = frame.bytes()?;
        before_write(&sent);
        let received = self.send(&sent)?;
        Ok(Exchange {
            frame: Some(frame),
            sent,
            received,
        })
    }

    /// Sleep on the owned clock.
    pub fn pause_ms(
        &mut self,
        ms: u32,
    ) {
        self.delay.delay_ms(ms);
    }
}

/// Log any SHDLC responses found in `received`. Never fails.
fn log_response(received: &[u8]) {
    if received.is_empty() {
        tracing::debug!("no response");
        return;
    }
    for raw in shdlc::split_frames(received) {
        match shdlc::decode_miso(raw) {
            Ok(miso) => {
                tracing::debug!(
                    "response cmd=0x{:02X} state=0x{:02X} data={} bytes",
                    miso.command,
                    miso.state,
                    miso.data.len()
                );
                log_payload(&miso);
            }
            Err(e) => tracing::trace!("unparsed response frame: {}", e),
        }
    }
}

fn log_payload(miso: &shdlc::MisoFrame) {
    match miso.command {
        shdlc::command::READ_MEASUREMENT => {
            if let Some(m) = shdlc::Measurement::from_be_bytes(&miso.data) {
                tracing::debug!(
                    "pm1.0:{:.2} pm2.5:{:.2} pm4.0:{:.2} pm10.0:{:.2} nc0.5:{:.2} nc1.0:{:.2} \
                     nc2.5:{:.2} nc4.5:{:.2} nc10.0:{:.2} typical-size:{:.2}",
                    m.mc_1p0,
                    m.mc_2p5,
                    m.mc_4p0,
                    m.mc_10p0,
                    m.nc_0p5,
                    m.nc_1p0,
                    m.nc_2p5,
                    m.nc_4p0,
                    m.nc_10p0,
                    m.typical_particle_size
                );
            }
        }
        shdlc::command::DEVICE_INFORMATION => {
            if let Some(text) = shdlc::ascii_string(&miso.data) {
                tracing::debug!("device information: {}", text);
            }
        }
        _ => {}
    }
}
