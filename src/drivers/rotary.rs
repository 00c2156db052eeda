//! Rotary-encoder driver with a bounded position.
//!
//! ## Hardware
//!
//! Quadrature encoder on two GPIOs.  The edge ISR decodes the rotation
//! direction and accumulates signed detents into an atomic; the `tick()`
//! method (called from the main loop) folds them into a position clamped
//! to the bounds the UI pushed for the active mode.
//!
//! Positions therefore arrive at the UI pre-clamped — turning the knob
//! past an end stop changes nothing, exactly like a hardware detent rail.

use core::sync::atomic::{AtomicI32, Ordering};

use crate::app::ports::RotaryPort;

/// Signed detent count accumulated by the ISR since the last tick.
static ROTARY_STEPS: AtomicI32 = AtomicI32::new(0);

pub struct RotaryDriver {
    clk_gpio: i32,
    dt_gpio: i32,
    position: i32,
    max: i32,
}

impl RotaryDriver {
    pub fn new(clk_gpio: i32, dt_gpio: i32) -> Self {
        Self {
            clk_gpio,
            dt_gpio,
            position: 0,
            max: 0,
        }
    }

    /// GPIO pair this encoder is attached to.
    pub fn gpios(&self) -> (i32, i32) {
        (self.clk_gpio, self.dt_gpio)
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    /// Fold accumulated detents into the bounded position.
    /// Returns the new position when it changed, `None` otherwise.
    pub fn tick(&mut self) -> Option<i32> {
        let steps = ROTARY_STEPS.swap(0, Ordering::AcqRel);
        if steps == 0 {
            return None;
        }
        let next = self
            .position
            .saturating_add(steps)
            .clamp(0, self.max);
        if next == self.position {
            return None;
        }
        self.position = next;
        Some(next)
    }
}

impl RotaryPort for RotaryDriver {
    fn set_limits(&mut self, max: i32) {
        self.max = max.max(0);
        self.position = self.position.clamp(0, self.max);
    }

    fn set_position(&mut self, position: i32) {
        self.position = position.clamp(0, self.max);
    }
}

/// ISR handler — register on the CLK edge; `clockwise` comes from the DT
/// phase sampled by the decoder.  Safe to call from interrupt context
/// (lock-free atomic add).
#[allow(unused)]
pub fn rotary_isr_handler(clockwise: bool) {
    let delta = if clockwise { 1 } else { -1 };
    ROTARY_STEPS.fetch_add(delta, Ordering::Release);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reset_isr() {
        ROTARY_STEPS.store(0, Ordering::SeqCst);
    }

    // ROTARY_STEPS is a process-wide static; keep each scenario inside one
    // test body so parallel test threads cannot interleave.
    #[test]
    fn detents_move_the_bounded_position() {
        reset_isr();
        let mut rot = RotaryDriver::new(4, 5);
        rot.set_limits(10);

        assert_eq!(rot.tick(), None);

        rotary_isr_handler(true);
        rotary_isr_handler(true);
        assert_eq!(rot.tick(), Some(2));

        rotary_isr_handler(false);
        assert_eq!(rot.tick(), Some(1));

        // Clamped at the low end stop: no event.
        rotary_isr_handler(false);
        rotary_isr_handler(false);
        assert_eq!(rot.tick(), Some(0));
        rotary_isr_handler(false);
        assert_eq!(rot.tick(), None);

        // Clamped at the high end stop.
        for _ in 0..30 {
            rotary_isr_handler(true);
        }
        assert_eq!(rot.tick(), Some(10));
        rotary_isr_handler(true);
        assert_eq!(rot.tick(), None);
    }

    #[test]
    fn new_limits_reclamp_the_position() {
        reset_isr();
        let mut rot = RotaryDriver::new(4, 5);
        rot.set_limits(24);
        rot.set_position(20);
        assert_eq!(rot.position(), 20);
        rot.set_limits(10);
        assert_eq!(rot.position(), 10);
        rot.set_position(-3);
        assert_eq!(rot.position(), 0);
    }
}
