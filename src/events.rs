//! Interrupt-driven input event queue.
//!
//! Events are produced by the rotary-encoder and push-button drivers
//! (ISR edges classified in their `tick()` methods) and consumed by the
//! main loop, which processes them one at a time in FIFO order at the
//! top of every cycle.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Encoder ISR │────▶│              │     │              │
//! │ Button ISR  │────▶│  Input Queue │────▶│  Main Loop   │
//! │ Software    │────▶│  (lock-free) │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use core::sync::atomic::{AtomicU8, Ordering};

/// Maximum number of pending input events.
/// Power of 2 for efficient ring buffer modulo.
const INPUT_QUEUE_CAP: usize = 32;

/// Input events delivered by the encoder/button drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Encoder moved to this bounded position.
    Rotated(i16),
    /// Button clicked this many times; `-1` is the held (long-press)
    /// signal.
    Clicked(i8),
}

const TAG_ROTATED: u32 = 1;
const TAG_CLICKED: u32 = 2;

impl InputEvent {
    fn encode(self) -> u32 {
        match self {
            Self::Rotated(pos) => (TAG_ROTATED << 16) | u32::from(pos as u16),
            Self::Clicked(n) => (TAG_CLICKED << 16) | u32::from(n as u8),
        }
    }

    fn decode(raw: u32) -> Option<Self> {
        let value = (raw & 0xFFFF) as u16;
        match raw >> 16 {
            TAG_ROTATED => Some(Self::Rotated(value as i16)),
            TAG_CLICKED => Some(Self::Clicked(value as u8 as i8)),
            _ => None,
        }
    }
}

// ── Lock-free SPSC ring buffer ────────────────────────────────
//
// ISRs/driver ticks write (produce), main loop reads (consume).
// Uses atomic head/tail indices.  The buffer is intentionally kept in a
// static so ISR callbacks can access it.

static INPUT_HEAD: AtomicU8 = AtomicU8::new(0);
static INPUT_TAIL: AtomicU8 = AtomicU8::new(0);
// SAFETY: one producer (driver tick / ISR context), one consumer (main
// loop).  Slots are written before the head is released and read before
// the tail is released, so no slot is ever accessed concurrently.
static mut INPUT_BUFFER: [u32; INPUT_QUEUE_CAP] = [0; INPUT_QUEUE_CAP];

/// Push an input event into the queue.
/// Safe to call from ISR context (lock-free).
/// Returns `false` if the queue is full (event dropped).
pub fn push_input(event: InputEvent) -> bool {
    let head = INPUT_HEAD.load(Ordering::Relaxed);
    let tail = INPUT_TAIL.load(Ordering::Acquire);
    let next_head = (head + 1) % INPUT_QUEUE_CAP as u8;

    if next_head == tail {
        return false; // Queue full — drop event.
    }

    // SAFETY: single producer; the slot at `head` is not visible to the
    // consumer until the Release store below.
    unsafe {
        INPUT_BUFFER[head as usize] = event.encode();
    }

    INPUT_HEAD.store(next_head, Ordering::Release);
    true
}

/// Pop the next input event from the queue.
/// Called from the main loop (single consumer).
/// Returns `None` if the queue is empty.
pub fn pop_input() -> Option<InputEvent> {
    let tail = INPUT_TAIL.load(Ordering::Relaxed);
    let head = INPUT_HEAD.load(Ordering::Acquire);

    if tail == head {
        return None; // Empty.
    }

    // SAFETY: single consumer; the producer released this slot with the
    // head store.
    let raw = unsafe { INPUT_BUFFER[tail as usize] };
    INPUT_TAIL.store((tail + 1) % INPUT_QUEUE_CAP as u8, Ordering::Release);

    InputEvent::decode(raw)
}

/// Drain all pending input events into a callback, FIFO order.
pub fn drain_inputs(mut handler: impl FnMut(InputEvent)) {
    while let Some(event) = pop_input() {
        handler(event);
    }
}

/// Number of pending input events.
pub fn queue_len() -> usize {
    let head = INPUT_HEAD.load(Ordering::Relaxed) as usize;
    let tail = INPUT_TAIL.load(Ordering::Relaxed) as usize;
    (head + INPUT_QUEUE_CAP - tail) % INPUT_QUEUE_CAP
}
