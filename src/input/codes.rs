//! Event type and code values shared with the Zephyr input subsystem, so
//! traces captured from existing firmware replay unchanged.

pub const INPUT_EV_KEY: u8 = 0x01;
pub const INPUT_EV_REL: u8 = 0x02;
pub const INPUT_EV_ABS: u8 = 0x03;

pub const INPUT_ABS_X: u16 = 0x00;
pub const INPUT_ABS_Y: u16 = 0x01;

pub const INPUT_REL_X: u16 = 0x00;
pub const INPUT_REL_Y: u16 = 0x01;

/// First generic button; the default code a tap clicks.
pub const INPUT_BTN_0: u16 = 0x100;
/// Contact indicator some sensors report alongside coordinates.
pub const INPUT_BTN_TOUCH: u16 = 0x14a;
/// Highest key code the input subsystem defines.
pub const INPUT_KEY_MAX: u16 = 0x2ff;
