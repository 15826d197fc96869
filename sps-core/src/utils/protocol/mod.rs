//! Module Exports
//!
//! - `frames`: the hard-coded command frames and their hex encoding.
//! - `shdlc`: checksum, byte-stuffing and frame parsing for Sensirion SHDLC.

pub mod frames;
pub mod shdlc;
