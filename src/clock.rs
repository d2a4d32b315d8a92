// PixelPal — Monotonic Time Source
//
// All protocol and classifier timing works on wrapping u32 millisecond
// timestamps compared with `elapsed_ms` (wraps at ~49 days — fine for
// timeouts). The trait keeps the core schedulable from any loop: the
// firmware binds it to the esp timer, tests drive a fake.

/// Milliseconds elapsed between two wrapping timestamps.
#[inline]
pub fn elapsed_ms(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

pub trait Clock {
    /// Milliseconds since boot, wrapping.
    fn now_ms(&self) -> u32;

    /// Block the cooperative loop for `ms` milliseconds.
    fn sleep_ms(&self, ms: u32);
}

/// Host-side clock backed by `std::time::Instant`. Used by the binary when
/// not running on the device and handy for soak-style tests.
pub struct StdClock {
    epoch: std::time::Instant,
}

impl StdClock {
    pub fn new() -> Self {
        Self {
            epoch: std::time::Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now_ms(&self) -> u32 {
        self.epoch.elapsed().as_millis() as u32
    }

    fn sleep_ms(&self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(ms as u64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_survives_wraparound() {
        let before = u32::MAX - 5;
        let after = before.wrapping_add(20);
        assert_eq!(elapsed_ms(after, before), 20);
    }

    #[test]
    fn elapsed_zero_for_equal_stamps() {
        assert_eq!(elapsed_ms(1234, 1234), 0);
    }
}
