//! Monotonic uptime clock.
//!
//! All loop timers (blanking, alert flash, group refresh, reconnect
//! rate limit) work on wrapping `u32` milliseconds from this source.

pub struct Uptime {
    #[cfg(not(target_os = "espidf"))]
    started: std::time::Instant,
}

impl Uptime {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            started: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot, truncated to u32 (wraps after ~49 days;
    /// every consumer compares with `wrapping_sub`).
    #[cfg(target_os = "espidf")]
    pub fn now_ms(&self) -> u32 {
        // SAFETY: esp_timer_get_time is a simple monotonic counter read.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() } / 1000) as u32
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn now_ms(&self) -> u32 {
        self.started.elapsed().as_millis() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_is_monotonic() {
        let clock = Uptime::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b.wrapping_sub(a) < 1000);
    }
}
