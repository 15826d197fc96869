//! `embedded_io` adapter over a host serial port.

use std::{fmt, io};

use embedded_io::{ErrorKind, ErrorType, Read, ReadReady, Write};
use serialport::SerialPort;

use crate::config::SerialSettings;

/// Failures reported by the host serial port.
#[derive(Debug)]
pub enum PortError {
    Io(io::Error),
    Serial(serialport::Error),
}

impl fmt::Display for PortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortError::Io(e) => write!(f, "{e}"),
            PortError::Serial(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PortError {}

impl embedded_io::Error for PortError {
    fn kind(&self) -> ErrorKind {
        match self {
            PortError::Io(e) if e.kind() == io::ErrorKind::TimedOut => ErrorKind::TimedOut,
            PortError::Io(e) if e.kind() == io::ErrorKind::BrokenPipe => ErrorKind::BrokenPipe,
            _ => ErrorKind::Other,
        }
    }
}

/// An opened serial device. Closed when dropped.
pub struct SerialLink {
    port: Box<dyn SerialPort>,
}

impl SerialLink {
    pub fn open(settings: &SerialSettings) -> Result<Self, serialport::Error> {
        let port = settings.builder().open()?;
        tracing::info!(
            path = %settings.path,
            baud = settings.baud_rate,
            "serial port opened"
        );
        Ok(SerialLink { port })
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        tracing::debug!("closing serial port");
    }
}

impl ErrorType for SerialLink {
    type Error = PortError;
}

impl Read for SerialLink {
    fn read(
        &mut self,
        buf: &mut [u8],
    ) -> Result<usize, Self::Error> {
        io::Read::read(&mut self.port, buf).map_err(PortError::Io)
    }
}

impl Write for SerialLink {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> Result<usize, Self::Error> {
        io::Write::write(&mut self.port, buf).map_err(PortError::Io)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        io::Write::flush(&mut self.port).map_err(PortError::Io)
    }
}

impl ReadReady for SerialLink {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        self.port
            .bytes_to_read()
            .map(|n| n > 0)
            .map_err(PortError::Serial)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::{
        io::{Read as _, Write as _},
        time::Duration,
    };

    use serialport::TTYPort;
    use sps_core::utils::{CommandFrame, SerialDispatcher};

    use super::*;
    use crate::clock::ThreadDelay;

    /// Host end wrapped as a `SerialLink`, plus the far end standing in for the sensor.
    fn pty_link() -> (SerialLink, TTYPort) {
        let (host, device) = TTYPort::pair().unwrap();
        (
            SerialLink {
                port: Box::new(host),
            },
            device,
        )
    }

    #[test]
    fn open_missing_device_fails() {
        let settings = SerialSettings {
            path: "/dev/does-not-exist-sps30".into(),
            ..SerialSettings::fixed()
        };
        assert!(SerialLink::open(&settings).is_err());
    }

    #[test]
    fn send_over_pty_writes_frame_and_drains_reply() {
        let (link, mut device) = pty_link();
        device.write_all(&[0xAA, 0xBB, 0xCC]).unwrap();
        device.flush().unwrap();

        let mut dispatcher = SerialDispatcher::new(link, ThreadDelay);
        let frame = CommandFrame::Read.bytes().unwrap();
        let received = dispatcher.send(&frame).unwrap();
        assert_eq!(received, vec![0xAA, 0xBB, 0xCC]);

        device.set_timeout(Duration::from_millis(500)).unwrap();
        let mut seen = vec![0u8; frame.len()];
        device.read_exact(&mut seen).unwrap();
        assert_eq!(seen, frame);
    }

    #[test]
    fn silent_pty_peer_yields_empty_reply() {
        let (link, _device) = pty_link();
        let mut dispatcher = SerialDispatcher::new(link, ThreadDelay);
        let received = dispatcher
            .send(&CommandFrame::Stop.bytes().unwrap())
            .unwrap();
        assert!(received.is_empty());
    }
}
