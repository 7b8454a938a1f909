//! Mock hardware for integration tests.
//!
//! `MockSht31` simulates the sensor at the I2C command level and counts
//! every command so tests can assert on the full bus history without a
//! real chip.  `MockTone` records every tone command.

use core::cell::Cell;

use embedded_hal::delay::DelayNs;
use soarsense::app::ports::{Clock, SensorBus, ToneDevice};
use soarsense::error::BusError;
use soarsense::sensors::sht31::{cmd, crc8};

// ── Clock / delay ─────────────────────────────────────────────

pub struct MockClock(Cell<u32>);

#[allow(dead_code)]
impl MockClock {
    pub fn at(ms: u32) -> Self {
        Self(Cell::new(ms))
    }

    pub fn advance(&self, ms: u32) {
        self.0.set(self.0.get().wrapping_add(ms));
    }
}

impl Clock for MockClock {
    fn millis(&self) -> u32 {
        self.0.get()
    }
}

/// Blocking delay that moves the mock clock instead of sleeping.
pub struct MockDelay<'a>(pub &'a MockClock);

impl DelayNs for MockDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.0.advance(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.advance(ms);
    }
}

// ── Simulated SHT31 ───────────────────────────────────────────

pub struct MockSht31 {
    /// Raw temperature / humidity words the chip will report.
    pub raw: (u16, u16),
    /// When false the chip NACKs every read (sensor hung).
    pub responsive: bool,
    /// Another bus user holds the lock.
    pub locked_elsewhere: bool,
    /// Corrupt the humidity checksum of the next frame.
    pub corrupt_next: bool,
    pub status: u16,
    pub measurements: u32,
    pub resets: u32,
    pub reads: u32,
    held: bool,
    pending: bool,
}

#[allow(dead_code)]
impl MockSht31 {
    pub fn new(raw: (u16, u16)) -> Self {
        Self {
            raw,
            responsive: true,
            locked_elsewhere: false,
            corrupt_next: false,
            status: 0x8010,
            measurements: 0,
            resets: 0,
            reads: 0,
            held: false,
            pending: false,
        }
    }

    pub fn holding_lock(&self) -> bool {
        self.held
    }

    fn word(value: u16) -> [u8; 3] {
        let [hi, lo] = value.to_be_bytes();
        [hi, lo, crc8(&[hi, lo])]
    }
}

impl SensorBus for MockSht31 {
    fn take(&mut self, _timeout_ms: u32) -> bool {
        self.try_take()
    }

    fn try_take(&mut self) -> bool {
        if self.locked_elsewhere || self.held {
            return false;
        }
        self.held = true;
        true
    }

    fn give(&mut self) {
        self.held = false;
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), BusError> {
        match u16::from_be_bytes([bytes[0], bytes[1]]) {
            cmd::MEAS_HIGHREP => {
                self.measurements += 1;
                self.pending = self.responsive;
            }
            cmd::SOFT_RESET => {
                self.resets += 1;
                self.pending = false;
            }
            cmd::CLEAR_STATUS => self.status = 0,
            _ => {}
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), BusError> {
        self.reads += 1;
        if !self.pending {
            return Err(BusError::Nack);
        }
        self.pending = false;

        buf[..3].copy_from_slice(&Self::word(self.raw.0));
        buf[3..6].copy_from_slice(&Self::word(self.raw.1));
        if self.corrupt_next {
            self.corrupt_next = false;
            buf[5] ^= 0xFF;
        }
        Ok(())
    }

    fn write_read(&mut self, bytes: &[u8], buf: &mut [u8]) -> Result<(), BusError> {
        if u16::from_be_bytes([bytes[0], bytes[1]]) != cmd::READ_STATUS {
            return Err(BusError::Io);
        }
        buf[..3].copy_from_slice(&Self::word(self.status));
        Ok(())
    }
}

// ── Tone recorder ─────────────────────────────────────────────

#[derive(Default)]
pub struct MockTone {
    pub played: Vec<String>,
}

#[allow(dead_code)]
impl MockTone {
    /// Commands other than `stop`.
    pub fn tunes(&self) -> Vec<&str> {
        self.played
            .iter()
            .map(String::as_str)
            .filter(|c| *c != "stop")
            .collect()
    }
}

impl ToneDevice for MockTone {
    fn play(&mut self, command: &str) {
        self.played.push(command.to_string());
    }
}
