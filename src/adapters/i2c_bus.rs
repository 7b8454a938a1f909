//! `embedded-hal` I2C adapter for the [`SensorBus`] port.
//!
//! Wraps any [`embedded_hal::i2c::I2c`] implementation (the ESP-IDF
//! `I2cDriver` on target, a scripted fake on host) together with a
//! device address and a [`BusSemaphore`] shared by every user of the
//! physical bus.
//!
//! The semaphore is a single `AtomicBool`: `try_take` is one
//! compare-exchange, so the 1 kHz sensor tick can probe it without
//! blocking.  The timed `take` spins on the injected clock and is only
//! used on setup paths.

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

use crate::app::ports::{Clock, SensorBus};
use crate::error::BusError;

/// Advisory lock for one physical I2C bus.
pub struct BusSemaphore {
    taken: AtomicBool,
}

impl Default for BusSemaphore {
    fn default() -> Self {
        Self::new()
    }
}

impl BusSemaphore {
    pub const fn new() -> Self {
        Self {
            taken: AtomicBool::new(false),
        }
    }

    pub fn try_take(&self) -> bool {
        self.taken
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    pub fn give(&self) {
        self.taken.store(false, Ordering::Release);
    }

    pub fn is_taken(&self) -> bool {
        self.taken.load(Ordering::Relaxed)
    }
}

/// One device on a shared I2C bus.
pub struct I2cSensorBus<'a, I2C, C> {
    i2c: I2C,
    address: u8,
    lock: &'a BusSemaphore,
    clock: C,
    /// Whether *this* handle holds the lock.
    held: bool,
}

impl<'a, I2C: I2c, C: Clock> I2cSensorBus<'a, I2C, C> {
    pub fn new(i2c: I2C, address: u8, lock: &'a BusSemaphore, clock: C) -> Self {
        Self {
            i2c,
            address,
            lock,
            clock,
            held: false,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Give back the underlying driver.
    pub fn release(self) -> I2C {
        if self.held {
            self.lock.give();
        }
        self.i2c
    }
}

fn map_err(e: &impl embedded_hal::i2c::Error) -> BusError {
    match e.kind() {
        ErrorKind::NoAcknowledge(_) => BusError::Nack,
        _ => BusError::Io,
    }
}

impl<I2C: I2c, C: Clock> SensorBus for I2cSensorBus<'_, I2C, C> {
    fn take(&mut self, timeout_ms: u32) -> bool {
        let start = self.clock.millis();
        loop {
            if self.try_take() {
                return true;
            }
            if self.clock.millis().wrapping_sub(start) >= timeout_ms {
                return false;
            }
            core::hint::spin_loop();
        }
    }

    fn try_take(&mut self) -> bool {
        if self.held {
            return false;
        }
        self.held = self.lock.try_take();
        self.held
    }

    fn give(&mut self) {
        if self.held {
            self.held = false;
            self.lock.give();
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), BusError> {
        self.i2c.write(self.address, bytes).map_err(|e| map_err(&e))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), BusError> {
        self.i2c.read(self.address, buf).map_err(|e| map_err(&e))
    }

    fn write_read(&mut self, bytes: &[u8], buf: &mut [u8]) -> Result<(), BusError> {
        self.i2c
            .write_read(self.address, bytes, buf)
            .map_err(|e| map_err(&e))
    }
}
