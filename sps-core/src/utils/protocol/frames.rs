//! Hard-coded command frames for the SPS30 start-up handshake.
//!
//! Each frame is kept as the literal hex text the device expects and is only
//! decoded at the moment it is sent. Nothing here validates frame contents;
//! see [`super::shdlc`] for diagnostics.

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

/// The five frames of the device initialization handshake.
///
/// Serialized in transcripts as a snake_case string.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandFrame {
    /// Wake pulse (`0xFF`) followed by two wake-up requests.
    WakeUp,
    /// Device information request (product type).
    DeviceIdentify,
    /// Start measurement in big-endian float mode.
    Start,
    /// Read measured values.
    Read,
    /// Stop measurement.
    Stop,
}

/// Fixed order in which the handshake frames are issued.
pub const HANDSHAKE: [CommandFrame; 5] = [
    CommandFrame::WakeUp,
    CommandFrame::DeviceIdentify,
    CommandFrame::Start,
    CommandFrame::Read,
    CommandFrame::Stop,
];

impl CommandFrame {
    /// Literal hex text of the frame, sent verbatim.
    pub const fn hex(self) -> &'static str {
        match self {
            CommandFrame::WakeUp => "ff7e001100ee7e7e001100ee7e",
            CommandFrame::DeviceIdentify => "7e00d001002e7e",
            CommandFrame::Start => "7e0000020103f97e",
            CommandFrame::Read => "7e000300fc7e",
            CommandFrame::Stop => "7e000100fe7e",
        }
    }

    /// Short name used in log lines.
    pub const fn name(self) -> &'static str {
        match self {
            CommandFrame::WakeUp => "wake-up",
            CommandFrame::DeviceIdentify => "device-identify",
            CommandFrame::Start => "start",
            CommandFrame::Read => "read",
            CommandFrame::Stop => "stop",
        }
    }

    /// Decode the frame's hex text into the bytes written to the port.
    pub fn bytes(self) -> Result<Vec<u8>, hex::FromHexError> {
        decode_hex(self.hex())
    }
}

/// Decode caller-supplied hex text into a frame.
///
/// No repair is attempted: odd lengths and non-hex characters are returned as
/// errors.
pub fn decode_hex(text: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(text)
}
