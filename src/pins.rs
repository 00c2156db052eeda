//! GPIO / peripheral pin assignments for the dial main board.
//!
//! Single source of truth — every driver references this module rather
//! than hard-coding pin numbers.  Change a pin here and it propagates
//! everywhere.

// ---------------------------------------------------------------------------
// Rotary encoder with push button (EC11, external pull-ups)
// ---------------------------------------------------------------------------

/// Encoder phase A ("CLK") — edge interrupt.
pub const ENCODER_CLK_GPIO: i32 = 4;
/// Encoder phase B ("DT") — sampled by the ISR for direction.
pub const ENCODER_DT_GPIO: i32 = 5;
/// Push-button axis, active low.
pub const ENCODER_SW_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// I²C bus — SSD1306 128×64 OLED at 0x3C
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
/// SSD1306 7-bit address.
pub const OLED_I2C_ADDR: u8 = 0x3C;

// ---------------------------------------------------------------------------
// UART debug
// ---------------------------------------------------------------------------

pub const UART_TX_GPIO: i32 = 21;
pub const UART_RX_GPIO: i32 = 20;
