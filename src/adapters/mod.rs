//! Adapters — concrete implementations of the port traits.
//!
//! | Adapter        | Implements   | Connects to                     |
//! |----------------|--------------|---------------------------------|
//! | `i2c_bus`      | SensorBus    | `embedded-hal` I2C + semaphore  |
//! | `time`         | Clock        | ESP32 system timer / `Instant`  |
//! | `tone_channel` | ToneDevice   | `embassy-sync` queue to player  |

pub mod i2c_bus;
pub mod time;
pub mod tone_channel;
