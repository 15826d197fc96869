//! Module Exports
//!
//! This file exports the serial link used to talk to the sensor.
//!
//! # Modules
//! - `dispatcher`: writes a frame, waits for the device to settle and drains
//!   the reply.
//! - `sequence`: issues frames in order with a fixed pause between them.

/// Module for sending single frames over an owned serial handle.
pub mod dispatcher;
pub mod sequence;
