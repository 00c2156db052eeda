//! ISR-debounced push-button driver with multi-click counting.
//!
//! ## Hardware
//!
//! Active-low momentary switch (the encoder's push axis) with external
//! pull-up.  GPIO fires on the falling edge; the ISR records the raw
//! timestamp into an atomic, and the `tick()` method (called from the
//! main loop) runs the debounce + counting state machine.
//!
//! ## Events
//!
//! | Gesture             | Emitted count |
//! |---------------------|---------------|
//! | N clicks < 300ms apart | `N`        |
//! | Hold >= 3s          | `-1` (held)   |

use core::sync::atomic::{AtomicU32, Ordering};

const DEBOUNCE_MS: u32 = 50;
const LONG_PRESS_MS: u32 = 3000;
const MULTI_CLICK_WINDOW_MS: u32 = 300;

/// Raw ISR timestamp (milliseconds since boot, truncated to u32).
/// Written by the ISR, read by the main loop.
static BUTTON_ISR_TIMESTAMP: AtomicU32 = AtomicU32::new(0);

/// Internal state machine for click counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClickState {
    Idle,
    DebounceWait { since_ms: u32, count: i8 },
    Pressed { since_ms: u32, count: i8 },
    WaitNextPress { release_ms: u32, count: i8 },
}

pub struct ButtonDriver {
    gpio: i32,
    state: ClickState,
    last_isr_ms: u32,
}

impl ButtonDriver {
    pub fn new(gpio: i32) -> Self {
        Self {
            gpio,
            state: ClickState::Idle,
            last_isr_ms: 0,
        }
    }

    /// GPIO pin this button is attached to.
    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Call from the main loop each cycle.  `now_ms` is the current
    /// monotonic time in milliseconds.  Returns a completed click count
    /// (`-1` for a hold), if any.
    pub fn tick(&mut self, now_ms: u32) -> Option<i8> {
        let isr_ms = BUTTON_ISR_TIMESTAMP.load(Ordering::Acquire);
        let new_press = isr_ms != self.last_isr_ms && isr_ms != 0;

        match self.state {
            ClickState::Idle => {
                if new_press {
                    self.last_isr_ms = isr_ms;
                    self.state = ClickState::DebounceWait {
                        since_ms: now_ms,
                        count: 0,
                    };
                }
                None
            }

            ClickState::DebounceWait { since_ms, count } => {
                if now_ms.wrapping_sub(since_ms) >= DEBOUNCE_MS {
                    self.state = ClickState::Pressed {
                        since_ms: now_ms,
                        count,
                    };
                }
                None
            }

            ClickState::Pressed { since_ms, count } => {
                let held_ms = now_ms.wrapping_sub(since_ms);

                if held_ms >= LONG_PRESS_MS {
                    self.state = ClickState::Idle;
                    return Some(-1);
                }

                if !Self::is_pressed_hw() && held_ms >= DEBOUNCE_MS {
                    self.state = ClickState::WaitNextPress {
                        release_ms: now_ms,
                        count: count.saturating_add(1),
                    };
                }

                None
            }

            ClickState::WaitNextPress { release_ms, count } => {
                let gap = now_ms.wrapping_sub(release_ms);

                if new_press && gap <= MULTI_CLICK_WINDOW_MS {
                    self.last_isr_ms = isr_ms;
                    self.state = ClickState::DebounceWait {
                        since_ms: now_ms,
                        count,
                    };
                    return None;
                }

                if gap > MULTI_CLICK_WINDOW_MS {
                    self.state = ClickState::Idle;
                    return Some(count);
                }

                None
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn is_pressed_hw() -> bool {
        // Active low: pressed reads 0.  Wired through the shared GPIO
        // helper once the encoder board lands.
        false
    }

    #[cfg(not(target_os = "espidf"))]
    fn is_pressed_hw() -> bool {
        false
    }
}

/// ISR handler — register this on the button GPIO falling edge.
/// Safe to call from interrupt context (lock-free atomic store).
#[allow(unused)]
pub fn button_isr_handler(now_ms: u32) {
    BUTTON_ISR_TIMESTAMP.store(now_ms, Ordering::Release);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reset_isr() {
        BUTTON_ISR_TIMESTAMP.store(0, Ordering::SeqCst);
    }

    // BUTTON_ISR_TIMESTAMP is a process-wide static; scenarios share one
    // test body so parallel test threads cannot interleave.
    #[test]
    fn click_counting_and_hold() {
        reset_isr();
        let mut btn = ButtonDriver::new(16);

        // No events without a press.
        assert_eq!(btn.tick(100), None);

        // ── Single click ──────────────────────────────────────
        button_isr_handler(1000);
        assert_eq!(btn.tick(1000), None); // debounce wait
        assert_eq!(btn.tick(1060), None); // -> pressed
        assert_eq!(btn.tick(1120), None); // released -> wait next
        assert_eq!(btn.tick(1500), Some(1)); // window expired

        // ── Double click ──────────────────────────────────────
        button_isr_handler(2000);
        btn.tick(2000);
        btn.tick(2060);
        btn.tick(2120); // first release
        button_isr_handler(2200); // second press inside window
        assert_eq!(btn.tick(2200), None);
        btn.tick(2260);
        btn.tick(2320); // second release
        assert_eq!(btn.tick(2700), Some(2));

        // ── Long hold ─────────────────────────────────────────
        button_isr_handler(5000);
        btn.tick(5000);
        btn.tick(5060); // -> pressed
        assert_eq!(btn.tick(8100), Some(-1));
    }
}
