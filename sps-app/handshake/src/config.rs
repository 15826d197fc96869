//! Fixed serial line settings.
//!
//! The device path and the line parameters are dictated by the sensor wiring
//! and are not configurable.

use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPortBuilder, StopBits};

/// Device the sensor is attached to.
pub const DEFAULT_PORT: &str = "/dev/ttyAMA0";
pub const BAUD_RATE: u32 = 115_200;

/// Parameters the serial handle is opened with, once, for the whole run.
#[derive(Debug, Clone)]
pub struct SerialSettings {
    pub path: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    /// Upper bound for a single read; drains only read bytes already buffered.
    pub read_timeout: Duration,
}

impl SerialSettings {
    /// 115200 baud, 8N1, no flow control, on [`DEFAULT_PORT`].
    pub fn fixed() -> Self {
        SerialSettings {
            path: DEFAULT_PORT.to_owned(),
            baud_rate: BAUD_RATE,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            read_timeout: Duration::from_millis(10),
        }
    }

    pub fn builder(&self) -> SerialPortBuilder {
        serialport::new(self.path.as_str(), self.baud_rate)
            .data_bits(self.data_bits)
            .parity(self.parity)
            .stop_bits(self.stop_bits)
            .flow_control(self.flow_control)
            .timeout(self.read_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_settings_are_8n1_at_115200() {
        let s = SerialSettings::fixed();
        assert_eq!(s.path, "/dev/ttyAMA0");
        assert_eq!(s.baud_rate, 115_200);
        assert_eq!(s.data_bits, DataBits::Eight);
        assert_eq!(s.parity, Parity::None);
        assert_eq!(s.stop_bits, StopBits::One);
        assert_eq!(s.flow_control, FlowControl::None);
    }
}
