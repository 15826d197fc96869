//! Core serial dispatch and frame utilities for the SPS30 particulate sensor on
//! no-std platforms.
//!
//! For a runnable host binary, see the `sps-app/handshake` crate.
#![no_std]

extern crate alloc;

pub mod utils;
