use std::{thread, time::Duration};

use embedded_hal::delay::DelayNs;

/// Blocking delay backed by `std::thread::sleep`.
pub struct ThreadDelay;

impl DelayNs for ThreadDelay {
    fn delay_ns(
        &mut self,
        ns: u32,
    ) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(
        &mut self,
        ms: u32,
    ) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
