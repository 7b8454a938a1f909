//! Sensirion SHT31 temperature / humidity sensor driver.
//!
//! Single-shot, high-repeatability measurements without clock stretching,
//! driven by a non-blocking state machine that the scheduler ticks at
//! ~1 kHz:
//!
//! ```text
//!           period elapsed            > 20 ms and CRC ok
//!   Idle ─────────────────▶ Measuring ─────────────────▶ Idle (publish)
//!    ▲                          │
//!    └──── soft reset ok ───────┘  stuck for > 2 × period
//! ```
//!
//! `tick()` never waits on the bus lock.  If another user holds it, the
//! tick is skipped and the next one tries again.  Only `init()` blocks,
//! for the fixed reset and conversion times.
//!
//! ## Frame layout
//!
//! A measurement read-back is 6 bytes: `T_msb T_lsb T_crc RH_msb RH_lsb RH_crc`.
//! Each CRC covers the two bytes before it.

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::app::ports::{Clock, SensorBus};
use crate::error::{BusError, InitError};

/// 7-bit I2C address with the ADDR pin pulled low.
pub const SHT31_DEFAULT_ADDR: u8 = 0x44;

/// Command opcodes, sent big-endian.
pub mod cmd {
    pub const MEAS_HIGHREP_STRETCH: u16 = 0x2C06;
    pub const MEAS_MEDREP_STRETCH: u16 = 0x2C0D;
    pub const MEAS_LOWREP_STRETCH: u16 = 0x2C10;
    pub const MEAS_HIGHREP: u16 = 0x2400;
    pub const MEAS_MEDREP: u16 = 0x240B;
    pub const MEAS_LOWREP: u16 = 0x2416;
    pub const READ_STATUS: u16 = 0xF32D;
    pub const CLEAR_STATUS: u16 = 0x3041;
    pub const SOFT_RESET: u16 = 0x30A2;
    pub const HEATER_ENABLE: u16 = 0x306D;
    pub const HEATER_DISABLE: u16 = 0x3066;
}

/// Shortest accepted update period.
pub const MIN_UPDATE_PERIOD_MS: u32 = 25;

/// High-repeatability conversion time (datasheet max is 15 ms).
const CONVERSION_TIME_MS: u32 = 20;

/// Settling time after a soft reset.
const RESET_SETTLE_MS: u32 = 5;

/// Lock timeout for the blocking (non-tick) paths.
const LOCK_TIMEOUT_MS: u32 = 200;

/// After a recovery reset the next measurement becomes due this soon.
const RESET_RETRY_DELAY_MS: u32 = 10;

// ───────────────────────────────────────────────────────────────
// Pure helpers
// ───────────────────────────────────────────────────────────────

/// CRC-8 as specified by Sensirion: polynomial 0x31, init 0xFF, no
/// final XOR.  `[0xBE, 0xEF]` yields `0x92`.
pub fn crc8(data: &[u8]) -> u8 {
    const POLYNOMIAL: u8 = 0x31;
    let mut crc: u8 = 0xFF;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ POLYNOMIAL
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Raw temperature code to degrees Celsius.
///
/// The product is rounded to `f32` before the offset is subtracted in
/// double precision, matching the reference driver bit for bit.
pub fn raw_to_celsius(st: u16) -> f32 {
    let scaled = 0.002_670_328_8_f32 * f32::from(st);
    (f64::from(scaled) - 45.0) as f32
}

/// Raw humidity code to percent relative humidity.
pub fn raw_to_relative_humidity(srh: u16) -> f32 {
    0.001_525_902_2_f32 * f32::from(srh)
}

/// Check both CRCs of a measurement frame and return `(ST, SRH)`.
pub fn decode_frame(frame: &[u8; 6]) -> Result<(u16, u16), BusError> {
    if frame[2] != crc8(&frame[0..2]) || frame[5] != crc8(&frame[3..5]) {
        return Err(BusError::Crc);
    }
    let st = u16::from_be_bytes([frame[0], frame[1]]);
    let srh = u16::from_be_bytes([frame[3], frame[4]]);
    Ok((st, srh))
}

// ───────────────────────────────────────────────────────────────
// Driver
// ───────────────────────────────────────────────────────────────

/// One published sample.  Replaced wholesale on every successful collect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub sampled_at_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    /// Waiting for the update period to elapse.
    Idle,
    /// A measurement command is in flight and not yet collected.
    Measuring,
    /// Not initialised (or init failed); ticks are ignored.
    Error,
}

pub struct Sht31<B, C> {
    bus: B,
    clock: C,
    state: AcquisitionState,
    reading: Option<SensorReading>,
    measurement_started_ms: u32,
    update_period_ms: u32,
}

impl<B: SensorBus, C: Clock> Sht31<B, C> {
    pub fn new(bus: B, clock: C) -> Self {
        Self {
            bus,
            clock,
            state: AcquisitionState::Error,
            reading: None,
            measurement_started_ms: 0,
            update_period_ms: MIN_UPDATE_PERIOD_MS,
        }
    }

    /// Reset the chip and seed the first reading.
    ///
    /// Blocks for about 25 ms.  On success the caller should register
    /// [`tick`](Self::tick) with a ~1 kHz periodic task.
    pub fn init(&mut self, update_period_ms: u16, delay: &mut impl DelayNs) -> Result<(), InitError> {
        if !self.bus.take(LOCK_TIMEOUT_MS) {
            warn!("SHT31: bus lock not available within {}ms", LOCK_TIMEOUT_MS);
            self.state = AcquisitionState::Error;
            return Err(InitError::LockTimeout);
        }
        let seeded = self.seed(delay);
        self.bus.give();

        if let Err(e) = seeded {
            warn!("SHT31: init failed ({})", e);
            self.state = AcquisitionState::Error;
            return Err(e);
        }

        self.update_period_ms = u32::from(update_period_ms).max(MIN_UPDATE_PERIOD_MS);
        self.state = AcquisitionState::Idle;
        info!("SHT31: ready, update period {}ms", self.update_period_ms);
        Ok(())
    }

    fn seed(&mut self, delay: &mut impl DelayNs) -> Result<(), InitError> {
        self.reset().map_err(|_| InitError::ResetFailed)?;
        delay.delay_ms(RESET_SETTLE_MS);
        let now = self.clock.millis();
        if self.start_measurement(now).is_err() {
            return Err(InitError::NoValidSample);
        }
        delay.delay_ms(CONVERSION_TIME_MS);
        self.collect().map_err(|_| InitError::NoValidSample)?;
        Ok(())
    }

    /// Advance the acquisition state machine.  Never blocks.
    pub fn tick(&mut self) {
        if self.state == AcquisitionState::Error {
            return;
        }
        if !self.bus.try_take() {
            return;
        }
        self.advance();
        self.bus.give();
    }

    fn advance(&mut self) {
        let now = self.clock.millis();
        let elapsed = now.wrapping_sub(self.measurement_started_ms);

        match self.state {
            AcquisitionState::Idle => {
                if elapsed >= self.update_period_ms {
                    // A failed send leaves us Idle; the next tick retries.
                    let _ = self.start_measurement(now);
                }
            }
            AcquisitionState::Measuring => {
                if elapsed <= CONVERSION_TIME_MS || self.collect().is_ok() {
                    return;
                }
                if elapsed > 2 * self.update_period_ms {
                    self.recover(now);
                }
            }
            AcquisitionState::Error => {}
        }
    }

    fn start_measurement(&mut self, now: u32) -> Result<(), BusError> {
        self.send_command(cmd::MEAS_HIGHREP)?;
        self.measurement_started_ms = now;
        self.state = AcquisitionState::Measuring;
        Ok(())
    }

    fn collect(&mut self) -> Result<SensorReading, BusError> {
        let mut frame = [0u8; 6];
        self.bus.read(&mut frame)?;
        let (st, srh) = decode_frame(&frame)?;

        let reading = SensorReading {
            temperature_c: raw_to_celsius(st),
            humidity_pct: raw_to_relative_humidity(srh),
            sampled_at_ms: self.clock.millis(),
        };
        self.reading = Some(reading);
        self.state = AcquisitionState::Idle;
        Ok(reading)
    }

    /// Measurement stuck: soft-reset and make the next one due in 10 ms.
    fn recover(&mut self, now: u32) {
        match self.reset() {
            Ok(()) => {
                warn!(
                    "SHT31: no data for {}ms, soft reset issued",
                    now.wrapping_sub(self.measurement_started_ms)
                );
                self.measurement_started_ms = now
                    .wrapping_sub(self.update_period_ms)
                    .wrapping_add(RESET_RETRY_DELAY_MS);
                self.state = AcquisitionState::Idle;
            }
            Err(e) => debug!("SHT31: soft reset failed ({}), will retry", e),
        }
    }

    fn reset(&mut self) -> Result<(), BusError> {
        self.send_command(cmd::SOFT_RESET)
    }

    fn send_command(&mut self, command: u16) -> Result<(), BusError> {
        self.bus.write(&command.to_be_bytes())
    }

    // ── Freshness-gated getters ───────────────────────────────

    /// Last reading, if it is no older than one update period.
    pub fn reading(&self) -> Option<SensorReading> {
        let reading = self.reading?;
        let age = self.clock.millis().wrapping_sub(reading.sampled_at_ms);
        (age <= self.update_period_ms).then_some(reading)
    }

    /// Current temperature (°C) if a fresh reading exists.
    pub fn temperature(&self) -> Option<f32> {
        self.reading().map(|r| r.temperature_c)
    }

    /// Current relative humidity (%) if a fresh reading exists.
    pub fn humidity(&self) -> Option<f32> {
        self.reading().map(|r| r.humidity_pct)
    }

    /// Last published reading regardless of age.
    pub fn last_reading(&self) -> Option<SensorReading> {
        self.reading
    }

    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    pub fn update_period_ms(&self) -> u32 {
        self.update_period_ms
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    // ── Blocking maintenance commands ─────────────────────────
    //
    // These take the bus lock with a timeout and are meant for setup or
    // ground-test code, never for the periodic callback.  The sensor
    // NACKs commands while a conversion is running.

    /// Switch the on-chip heater (used to drive off condensation).
    pub fn set_heater(&mut self, on: bool) -> Result<(), BusError> {
        let command = if on { cmd::HEATER_ENABLE } else { cmd::HEATER_DISABLE };
        self.locked(|s| s.send_command(command))
    }

    /// Read the 16-bit status register.
    pub fn read_status(&mut self) -> Result<u16, BusError> {
        self.locked(|s| {
            let mut buf = [0u8; 3];
            s.bus.write_read(&cmd::READ_STATUS.to_be_bytes(), &mut buf)?;
            if buf[2] != crc8(&buf[0..2]) {
                return Err(BusError::Crc);
            }
            Ok(u16::from_be_bytes([buf[0], buf[1]]))
        })
    }

    /// Clear the alert flags in the status register.
    pub fn clear_status(&mut self) -> Result<(), BusError> {
        self.locked(|s| s.send_command(cmd::CLEAR_STATUS))
    }

    fn locked<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, BusError>) -> Result<T, BusError> {
        if !self.bus.take(LOCK_TIMEOUT_MS) {
            return Err(BusError::Busy);
        }
        let result = f(self);
        self.bus.give();
        result
    }
}
