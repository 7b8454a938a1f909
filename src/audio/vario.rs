//! Audio vario: vertical speed to beeps, with alarm arbitration.
//!
//! Called at 50 Hz with the energy-compensated vertical speed in cm/s.
//! Climb produces short beeps that rise in pitch and repeat faster as the
//! climb strengthens.  Sink beyond the deadzone produces a falling
//! arpeggio.  Inside the deadzone the vario stays quiet.
//!
//! ## Arbitration
//!
//! Discrete alarms from the [`AlarmCatalog`] always win: while one is
//! sounding, `update()` returns without touching the tone device.  A new
//! alarm pre-empts the current one only with strictly higher priority.
//!
//! ## Hysteresis
//!
//! A beep normally plays to completion before the next one starts.  A
//! climb rate that jumps by more than 20 % (and at least 50 cm/s) in
//! either direction interrupts it immediately.
//!
//! Handy note: 1 cm/s ≈ 2 ft/min.

use log::{debug, info, warn};

use super::alarms::{AlarmCatalog, AlarmId};
use crate::error::CatalogError;
use super::tune::{climb_beep, sink_tune};
use crate::app::ports::{Clock, ToneDevice};

/// Notes are numbered 1..=84, C0..B6.
pub const MIN_NOTE: u8 = 10;
pub const ZERO_NOTE: u8 = 37;
pub const MAX_NOTE: u8 = 68;

/// Beep + silence length limits for climb.
pub const MIN_BEEP_DURATION_MS: u16 = 145;
pub const MAX_BEEP_DURATION_MS: u16 = 600;

/// Fixed length of the sink arpeggio.
pub const SINK_BEEP_DURATION_MS: u16 = 800;

// ───────────────────────────────────────────────────────────────
// Limits
// ───────────────────────────────────────────────────────────────

/// Saturation range and deadzone, in cm/s.
///
/// Always satisfies `rate_lower < deadzone_lower <= 0 <= deadzone_upper < rate_upper`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeepLimits {
    rate_lower: i16,
    rate_upper: i16,
    deadzone_lower: i16,
    deadzone_upper: i16,
}

impl Default for BeepLimits {
    fn default() -> Self {
        Self {
            rate_lower: -500,
            rate_upper: 500,
            deadzone_lower: -250,
            deadzone_upper: 5,
        }
    }
}

impl BeepLimits {
    /// `None` unless the deadzone straddles zero strictly inside the
    /// saturation range.
    pub fn new(rate_lower: i16, rate_upper: i16, deadzone_lower: i16, deadzone_upper: i16) -> Option<Self> {
        let nested = rate_lower < deadzone_lower
            && deadzone_lower <= 0
            && deadzone_upper >= 0
            && deadzone_upper < rate_upper;
        nested.then_some(Self {
            rate_lower,
            rate_upper,
            deadzone_lower,
            deadzone_upper,
        })
    }

    pub fn rate_lower(&self) -> i16 {
        self.rate_lower
    }

    pub fn rate_upper(&self) -> i16 {
        self.rate_upper
    }

    pub fn deadzone_lower(&self) -> i16 {
        self.deadzone_lower
    }

    pub fn deadzone_upper(&self) -> i16 {
        self.deadzone_upper
    }

    /// Inclusive on both edges.
    pub fn in_deadzone(&self, rate: i16) -> bool {
        (self.deadzone_lower..=self.deadzone_upper).contains(&rate)
    }

    /// Map a rate to pitch and beep length.
    ///
    /// Climb interpolates from `ZERO_NOTE` at the deadzone edge to
    /// `MAX_NOTE` at saturation; sink from `MIN_NOTE` at saturation to
    /// `ZERO_NOTE` at the deadzone edge.  Integer arithmetic throughout.
    pub fn tone_for(&self, rate: i16) -> ToneParameters {
        let rate = i32::from(rate.max(self.rate_lower).min(self.rate_upper));
        let (lower, upper) = (i32::from(self.rate_lower), i32::from(self.rate_upper));
        let (dz_lower, dz_upper) = (i32::from(self.deadzone_lower), i32::from(self.deadzone_upper));
        let (min_note, zero_note, max_note) = (i32::from(MIN_NOTE), i32::from(ZERO_NOTE), i32::from(MAX_NOTE));

        let note = if rate > 0 {
            (rate - dz_upper) * (max_note - zero_note) / (upper - dz_upper) + zero_note
        } else {
            (rate - lower) * (zero_note - min_note) / (dz_lower - lower) + min_note
        };

        let duration_ms = if rate >= 0 {
            let (min_d, max_d) = (i32::from(MIN_BEEP_DURATION_MS), i32::from(MAX_BEEP_DURATION_MS));
            (min_d + (upper - rate) * (max_d - min_d) / upper) as u16
        } else {
            SINK_BEEP_DURATION_MS
        };

        ToneParameters {
            note: note.clamp(min_note, max_note) as u8,
            duration_ms,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// State
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneParameters {
    pub note: u8,
    /// Length of beep plus trailing silence.
    pub duration_ms: u16,
}

/// The most recent continuous-tone beep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeepTimingState {
    pub tone: ToneParameters,
    pub started_ms: u32,
    pub last_rate: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveAlarm {
    id: AlarmId,
    started_ms: u32,
}

pub struct AudioVario<T, C> {
    device: T,
    clock: C,
    catalog: AlarmCatalog,
    limits: BeepLimits,
    beep: BeepTimingState,
    alarm: Option<ActiveAlarm>,
}

impl<T: ToneDevice, C: Clock> AudioVario<T, C> {
    /// Vario with the built-in alarm table.  Fails only if that table
    /// is malformed.
    pub fn new(device: T, clock: C) -> Result<Self, CatalogError> {
        Ok(Self::with_catalog(device, clock, AlarmCatalog::standard()?))
    }

    pub fn with_catalog(device: T, clock: C, catalog: AlarmCatalog) -> Self {
        Self {
            device,
            clock,
            catalog,
            limits: BeepLimits::default(),
            beep: BeepTimingState {
                tone: ToneParameters {
                    note: ZERO_NOTE,
                    duration_ms: 0,
                },
                started_ms: 0,
                last_rate: 0,
            },
            alarm: None,
        }
    }

    /// Main update, called at 50 Hz with vertical speed in cm/s.
    pub fn update(&mut self, rate: i16) {
        if self.alarm_sounding() {
            return;
        }
        if self.limits.in_deadzone(rate) {
            // Let any beep in progress finish on its own.
            return;
        }

        let elapsed = self.clock.millis().wrapping_sub(self.beep.started_ms);
        let finished = elapsed > u32::from(self.beep.tone.duration_ms);
        if finished || self.rate_jumped(rate) {
            self.start_beep(rate);
        }
    }

    /// Climb changed enough to cut the current beep short.
    fn rate_jumped(&self, rate: i16) -> bool {
        if rate <= 0 {
            return false;
        }
        let rate = f64::from(rate);
        let last = f64::from(self.beep.last_rate);
        rate > (1.2 * last).max(last + 50.0) || rate < (0.83 * last).min(last - 50.0)
    }

    fn start_beep(&mut self, rate: i16) {
        let tone = self.limits.tone_for(rate);
        let command = if rate >= 0 {
            climb_beep(tone.note, tone.duration_ms)
        } else {
            sink_tune(tone.note)
        };

        self.device.play(T::STOP);
        let started_ms = self.clock.millis();
        self.device.play(&command);

        self.beep = BeepTimingState {
            tone,
            started_ms,
            last_rate: rate,
        };
    }

    // ── Limits ────────────────────────────────────────────────

    /// Update the saturation range.  Each bound is applied only if it
    /// stays outside the deadzone; an invalid bound is ignored.
    pub fn set_rate_limits(&mut self, min: i16, max: i16) {
        if min < self.limits.deadzone_lower {
            self.limits.rate_lower = min;
        } else {
            debug!("Vario: rejected rate lower bound {}", min);
        }
        if max > self.limits.deadzone_upper {
            self.limits.rate_upper = max;
        } else {
            debug!("Vario: rejected rate upper bound {}", max);
        }
    }

    /// Update the deadzone.  Each edge is applied only if it keeps zero
    /// inside and stays within the saturation range.
    pub fn set_deadzone(&mut self, min: i16, max: i16) {
        if min <= 0 && min > self.limits.rate_lower {
            self.limits.deadzone_lower = min;
        } else {
            debug!("Vario: rejected deadzone lower edge {}", min);
        }
        if max >= 0 && max < self.limits.rate_upper {
            self.limits.deadzone_upper = max;
        } else {
            debug!("Vario: rejected deadzone upper edge {}", max);
        }
    }

    /// Replace all limits at once (e.g. from persisted config).
    pub fn set_limits(&mut self, limits: BeepLimits) {
        self.limits = limits;
    }

    pub fn limits(&self) -> BeepLimits {
        self.limits
    }

    // ── Alarms ────────────────────────────────────────────────

    /// Sound `id` unless an alarm of equal or higher priority is playing.
    pub fn trigger_alarm(&mut self, id: AlarmId) {
        let Some(record) = self.catalog.get(id).copied() else {
            warn!("Vario: unknown alarm id {}", id.0);
            return;
        };
        if id == AlarmId::NONE {
            return;
        }

        // Expire first so a finished alarm cannot block a quieter one.
        let active = if self.alarm_sounding() { self.alarm } else { None };
        if let Some(active) = active {
            let active_priority = self.catalog.get(active.id).map_or(0, |r| r.priority);
            if record.priority <= active_priority {
                debug!(
                    "Vario: alarm {} (priority {}) dropped, {} is sounding",
                    id.0, record.priority, active.id.0
                );
                return;
            }
        }

        self.device.play(T::STOP);
        self.device.play(record.command);
        self.alarm = Some(ActiveAlarm {
            id,
            started_ms: self.clock.millis(),
        });
        info!("Vario: alarm {} started (priority {})", id.0, record.priority);
    }

    /// Whether an alarm is playing.  Also the only place alarms expire,
    /// so call it every cycle (`update()` does).
    pub fn alarm_sounding(&mut self) -> bool {
        if let Some(active) = self.alarm {
            let duration = self.catalog.get(active.id).map_or(0, |r| r.duration_ms);
            if self.clock.millis().wrapping_sub(active.started_ms) > duration {
                self.alarm = None;
            }
        }
        self.alarm.is_some()
    }

    /// Alarm currently marked active (without running the expiry check).
    pub fn active_alarm(&self) -> Option<AlarmId> {
        self.alarm.map(|a| a.id)
    }

    pub fn last_tone(&self) -> BeepTimingState {
        self.beep
    }

    pub fn device(&self) -> &T {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut T {
        &mut self.device
    }
}
