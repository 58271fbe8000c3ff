//! Time source for write-latency telemetry.

/// A free-running microsecond counter (e.g. the Teensy `micros()` timer).
///
/// Only differences between two readings are used, so the counter may wrap.
pub trait Clock {
    fn now_micros(&self) -> u32;
}

/// Elapsed microseconds between two readings of a wrapping counter.
#[inline]
pub fn elapsed_micros(start: u32, end: u32) -> u32 {
    end.wrapping_sub(start)
}

/// [`Clock`] backed by `std::time::Instant`.
#[cfg(any(test, feature = "std"))]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(any(test, feature = "std"))]
impl StdClock {
    pub fn new() -> Self {
        StdClock {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(any(test, feature = "std"))]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "std"))]
impl Clock for StdClock {
    fn now_micros(&self) -> u32 {
        // truncation is the wrap
        self.origin.elapsed().as_micros() as u32
    }
}
