//! Port traits — the boundary between driver logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Sht31 / AudioVario (domain)
//! ```
//!
//! Driven adapters (I2C bus, tone player, clock) implement these traits.
//! The drivers consume them via generics, so the state machines never
//! touch hardware directly and can be exercised with fake clocks and
//! scripted devices on the host.

use crate::error::BusError;

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.
///
/// The value wraps at `u32::MAX`; every consumer compares timestamps with
/// `wrapping_sub`.
pub trait Clock {
    fn millis(&self) -> u32;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn millis(&self) -> u32 {
        (**self).millis()
    }
}

// ───────────────────────────────────────────────────────────────
// Sensor bus port (driven adapter: domain ↔ I2C device)
// ───────────────────────────────────────────────────────────────

/// One addressed device on a shared bus, plus the bus's lock.
///
/// Transactions are atomic.  The lock is advisory: callers take it
/// around a sequence of transactions that must not interleave with other
/// users of the same physical bus.
pub trait SensorBus {
    /// Take the bus lock, waiting at most `timeout_ms`.
    fn take(&mut self, timeout_ms: u32) -> bool;

    /// Take the bus lock only if it is free right now.
    fn try_take(&mut self) -> bool;

    /// Release the bus lock.
    fn give(&mut self);

    /// Write `bytes` to the device.
    fn write(&mut self, bytes: &[u8]) -> Result<(), BusError>;

    /// Read exactly `buf.len()` bytes from the device.
    fn read(&mut self, buf: &mut [u8]) -> Result<(), BusError>;

    /// Write `bytes`, then read `buf.len()` bytes in one transaction.
    fn write_read(&mut self, bytes: &[u8], buf: &mut [u8]) -> Result<(), BusError>;
}

// ───────────────────────────────────────────────────────────────
// Tone device port (driven adapter: domain → buzzer)
// ───────────────────────────────────────────────────────────────

/// A tone sequencer that plays textual tune commands asynchronously.
pub trait ToneDevice {
    /// Command that halts any playback in progress.
    const STOP: &'static str = "stop";

    /// Queue `command` for playback and return immediately.
    fn play(&mut self, command: &str);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the drivers)
// ───────────────────────────────────────────────────────────────

/// Identifies a periodic task registered with the
/// [`Scheduler`](crate::scheduler::Scheduler).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskId {
    /// High-rate sensor acquisition tick (~1 kHz).
    SensorTick,
    /// Audio vario update (~50 Hz).
    AudioUpdate,
    /// Low-rate housekeeping (status logging).
    Housekeeping,
}

/// Callback trait that the scheduler invokes when a task is due.
///
/// The scheduler knows nothing about sensors or tones; the wiring code
/// implements this to forward into the right driver.
pub trait SchedulerDelegate {
    /// * `label` — the human-readable label of the task that fired.
    /// * `id`    — which task it was.
    fn on_task_due(&mut self, label: &str, id: TaskId);
}
