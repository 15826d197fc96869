//! Sensirion SHDLC framing.
//!
//! A request (MOSI) frame is `7E ADR CMD LEN DATA.. CHK 7E`, a response (MISO)
//! frame carries an extra state byte after the command: `7E ADR CMD STATE LEN
//! DATA.. CHK 7E`. Everything between the delimiters is byte-stuffed.
//!
//! These helpers are used for diagnostics and by the simulated sensor; the
//! dispatcher never rejects or rewrites a frame based on them.

use alloc::vec::Vec;
use core::fmt;

/// Frame delimiter.
pub const START_STOP: u8 = 0x7E;
/// Escape marker for stuffed bytes.
pub const ESCAPE: u8 = 0x7D;
const ESCAPE_XOR: u8 = 0x20;
const XON: u8 = 0x11;
const XOFF: u8 = 0x13;

/// Longest payload a single frame can carry.
pub const MAX_DATA_LEN: usize = 255;

/// SHDLC command codes understood by the SPS30.
pub mod command {
    pub const START_MEASUREMENT: u8 = 0x00;
    pub const STOP_MEASUREMENT: u8 = 0x01;
    pub const READ_MEASUREMENT: u8 = 0x03;
    pub const SLEEP: u8 = 0x10;
    pub const WAKE_UP: u8 = 0x11;
    pub const DEVICE_INFORMATION: u8 = 0xD0;
}

/// Response state reported for a command the device does not know.
pub const STATE_UNKNOWN_COMMAND: u8 = 0x02;

/// Errors raised while parsing or building SHDLC frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShdlcError {
    MissingDelimiter,
    TooShort(usize),
    DanglingEscape,
    LengthMismatch { declared: usize, actual: usize },
    Checksum { expected: u8, actual: u8 },
    DataTooLong(usize),
}

impl fmt::Display for ShdlcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShdlcError::MissingDelimiter => write!(f, "frame is not enclosed in 0x7E delimiters"),
            ShdlcError::TooShort(len) => write!(f, "frame too short ({len} bytes)"),
            ShdlcError::DanglingEscape => write!(f, "escape byte at end of frame"),
            ShdlcError::LengthMismatch { declared, actual } => {
                write!(f, "length byte says {declared}, frame carries {actual}")
            }
            ShdlcError::Checksum { expected, actual } => {
                write!(f, "checksum 0x{actual:02X}, expected 0x{expected:02X}")
            }
            ShdlcError::DataTooLong(len) => write!(f, "{len} data bytes exceed one frame"),
        }
    }
}

impl core::error::Error for ShdlcError {}

/// A parsed request frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MosiFrame {
    pub address: u8,
    pub command: u8,
    pub data: Vec<u8>,
}

/// A parsed response frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MisoFrame {
    pub address: u8,
    pub command: u8,
    pub state: u8,
    pub data: Vec<u8>,
}

impl MisoFrame {
    /// Error code reported by the device, ignoring the device-error flag (bit 7).
    pub fn error_code(&self) -> u8 {
        self.state & 0x7F
    }

    /// `true` when the device flagged an internal error condition.
    pub fn device_error(&self) -> bool {
        self.state & 0x80 != 0
    }
}

/// Bitwise inverse of the least significant byte of the sum.
pub fn checksum(bytes: &[u8]) -> u8 {
    !bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

fn needs_escape(byte: u8) -> bool {
    matches!(byte, START_STOP | ESCAPE | XON | XOFF)
}

/// Escape reserved bytes for transmission between delimiters.
pub fn stuff(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 4);
    for &b in bytes {
        if needs_escape(b) {
            out.push(ESCAPE);
            out.push(b ^ ESCAPE_XOR);
        } else {
            out.push(b);
        }
    }
    out
}

/// Reverse [`stuff`].
pub fn unstuff(bytes: &[u8]) -> Result<Vec<u8>, ShdlcError> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter();
    while let Some(&b) = iter.next() {
        if b == ESCAPE {
            let next = iter.next().ok_or(ShdlcError::DanglingEscape)?;
            out.push(next ^ ESCAPE_XOR);
        } else {
            out.push(b);
        }
    }
    Ok(out)
}

fn wrap(header: &[u8], data: &[u8]) -> Result<Vec<u8>, ShdlcError> {
    if data.len() > MAX_DATA_LEN {
        return Err(ShdlcError::DataTooLong(data.len()));
    }
    let mut payload = Vec::with_capacity(header.len() + data.len() + 2);
    payload.extend_from_slice(header);
    payload.push(data.len() as u8);
    payload.extend_from_slice(data);
    payload.push(checksum(&payload));

    let mut frame = Vec::with_capacity(payload.len() + 4);
    frame.push(START_STOP);
    frame.extend(stuff(&payload));
    frame.push(START_STOP);
    Ok(frame)
}

/// Build a stuffed request frame.
pub fn encode_mosi(
    address: u8,
    command: u8,
    data: &[u8],
) -> Result<Vec<u8>, ShdlcError> {
    wrap(&[address, command], data)
}

/// Build a stuffed response frame.
pub fn encode_miso(
    address: u8,
    command: u8,
    state: u8,
    data: &[u8],
) -> Result<Vec<u8>, ShdlcError> {
    wrap(&[address, command, state], data)
}

/// Strip delimiters, unstuff, and check length and checksum.
///
/// Returns the unstuffed payload, checksum included.
fn unwrap_frame(
    frame: &[u8],
    header_len: usize,
) -> Result<Vec<u8>, ShdlcError> {
    if frame.len() < 2 || frame[0] != START_STOP || frame[frame.len() - 1] != START_STOP {
        return Err(ShdlcError::MissingDelimiter);
    }
    let payload = unstuff(&frame[1..frame.len() - 1])?;
    // header, length byte and checksum
    if payload.len() < header_len + 2 {
        return Err(ShdlcError::TooShort(payload.len()));
    }

    let declared = payload[header_len] as usize;
    let actual = payload.len() - header_len - 2;
    if declared != actual {
        return Err(ShdlcError::LengthMismatch { declared, actual });
    }

    let (body, chk) = payload.split_at(payload.len() - 1);
    let expected = checksum(body);
    if chk[0] != expected {
        return Err(ShdlcError::Checksum {
            expected,
            actual: chk[0],
        });
    }
    Ok(payload)
}

/// Parse a single request frame including its delimiters.
pub fn decode_mosi(frame: &[u8]) -> Result<MosiFrame, ShdlcError> {
    let payload = unwrap_frame(frame, 2)?;
    Ok(MosiFrame {
        address: payload[0],
        command: payload[1],
        data: payload[3..payload.len() - 1].to_vec(),
    })
}

/// Parse a single response frame including its delimiters.
pub fn decode_miso(frame: &[u8]) -> Result<MisoFrame, ShdlcError> {
    let payload = unwrap_frame(frame, 3)?;
    Ok(MisoFrame {
        address: payload[0],
        command: payload[1],
        state: payload[2],
        data: payload[4..payload.len() - 1].to_vec(),
    })
}

/// Split a byte stream into delimited frames.
///
/// Bytes outside of delimiters (such as the `0xFF` wake pulse) are skipped.
/// Each returned slice starts and ends with [`START_STOP`].
pub fn split_frames(stream: &[u8]) -> Vec<&[u8]> {
    let mut frames = Vec::new();
    let mut start = None;
    for (i, &b) in stream.iter().enumerate() {
        if b != START_STOP {
            continue;
        }
        match start {
            // back-to-back delimiters open a new frame
            Some(s) if i > s + 1 => {
                frames.push(&stream[s..=i]);
                start = None;
            }
            _ => start = Some(i),
        }
    }
    frames
}

/// Values carried by a read-measurement reply in big-endian float mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub mc_1p0: f32,
    pub mc_2p5: f32,
    pub mc_4p0: f32,
    pub mc_10p0: f32,
    pub nc_0p5: f32,
    pub nc_1p0: f32,
    pub nc_2p5: f32,
    pub nc_4p0: f32,
    pub nc_10p0: f32,
    pub typical_particle_size: f32,
}

impl Measurement {
    /// Size of the reply payload.
    pub const LEN: usize = 40;

    /// Decode ten big-endian `f32` values. `None` unless `data` is exactly
    /// [`Measurement::LEN`] bytes; an empty reply means no new data yet.
    pub fn from_be_bytes(data: &[u8]) -> Option<Self> {
        if data.len() != Self::LEN {
            return None;
        }
        let mut v = [0f32; 10];
        for (slot, word) in v.iter_mut().zip(data.chunks_exact(4)) {
            *slot = f32::from_be_bytes([word[0], word[1], word[2], word[3]]);
        }
        Some(Measurement {
            mc_1p0: v[0],
            mc_2p5: v[1],
            mc_4p0: v[2],
            mc_10p0: v[3],
            nc_0p5: v[4],
            nc_1p0: v[5],
            nc_2p5: v[6],
            nc_4p0: v[7],
            nc_10p0: v[8],
            typical_particle_size: v[9],
        })
    }
}

/// Null-terminated ASCII text from a device information reply.
pub fn ascii_string(data: &[u8]) -> Option<&str> {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    let text = &data[..end];
    if text.is_ascii() {
        core::str::from_utf8(text).ok()
    } else {
        None
    }
}
