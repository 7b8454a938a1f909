//! GPIO / peripheral pin assignments for the SoarSense sensor board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Sensor I2C bus (SHT31 and friends)
// ---------------------------------------------------------------------------

/// I2C0 data line.
pub const I2C_SDA_GPIO: i32 = 8;
/// I2C0 clock line.
pub const I2C_SCL_GPIO: i32 = 9;
/// Bus clock.  The SHT31 supports fast mode.
pub const I2C_FREQ_HZ: u32 = 400_000;
