//! System configuration parameters
//!
//! All tunable parameters for the SoarSense peripherals.  Defaults match
//! the reference board; a persisted copy can be deserialised with serde
//! and must pass [`SystemConfig::validate`] before use.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::TaskId;
use crate::audio::BeepLimits;
use crate::error::ConfigError;
use crate::scheduler::Task;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Humidity sensor ---
    /// 7-bit I2C address of the SHT31
    pub sht31_address: u8,
    /// Time between measurements (milliseconds, floored at 25)
    pub humidity_update_period_ms: u16,

    // --- Scheduler ---
    /// Sensor state-machine tick interval (milliseconds)
    pub sensor_tick_interval_ms: u32,
    /// Audio vario update interval (milliseconds)
    pub audio_update_interval_ms: u32,
    /// Status log interval (milliseconds)
    pub housekeeping_interval_ms: u32,

    // --- Vario (cm/s) ---
    pub vario_rate_lower: i16,
    pub vario_rate_upper: i16,
    pub vario_deadzone_lower: i16,
    pub vario_deadzone_upper: i16,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let limits = BeepLimits::default();
        Self {
            // Humidity sensor
            sht31_address: crate::sensors::sht31::SHT31_DEFAULT_ADDR,
            humidity_update_period_ms: 100, // 10 Hz

            // Scheduler
            sensor_tick_interval_ms: 1,    // 1 kHz
            audio_update_interval_ms: 20,  // 50 Hz
            housekeeping_interval_ms: 5000,

            // Vario
            vario_rate_lower: limits.rate_lower(),
            vario_rate_upper: limits.rate_upper(),
            vario_deadzone_lower: limits.deadzone_lower(),
            vario_deadzone_upper: limits.deadzone_upper(),
        }
    }
}

impl SystemConfig {
    /// Reject values the drivers cannot honour.  Nothing is clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sht31_address != 0x44 && self.sht31_address != 0x45 {
            return Err(ConfigError::ValidationFailed("sht31_address must be 0x44 or 0x45"));
        }
        if self.sensor_tick_interval_ms == 0 || self.audio_update_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("task intervals must be non-zero"));
        }
        if self.sensor_tick_interval_ms >= u32::from(self.humidity_update_period_ms) {
            return Err(ConfigError::ValidationFailed(
                "sensor tick must be faster than the humidity update period",
            ));
        }
        self.beep_limits()
            .map(|_| ())
            .ok_or(ConfigError::ValidationFailed("vario deadzone must nest inside rate limits"))
    }

    /// Compact binary form for persistent storage.
    pub fn to_bytes(&self) -> Vec<u8> {
        // Serialising plain integers into a growable buffer cannot fail.
        postcard::to_allocvec(self).unwrap_or_default()
    }

    /// Decode and validate a stored blob.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Boot-time config: the stored blob if it decodes and validates,
    /// defaults otherwise.
    pub fn load(stored: Option<&[u8]>) -> Self {
        let Some(bytes) = stored else {
            info!("Config: nothing stored, using defaults");
            return Self::default();
        };
        match Self::from_bytes(bytes) {
            Ok(config) => {
                info!("Config: loaded {} bytes from storage", bytes.len());
                config
            }
            Err(e) => {
                warn!("Config: stored blob rejected ({}), using defaults", e);
                Self::default()
            }
        }
    }

    /// Periodic tasks for the main loop.  The sensor tick is left out
    /// when the humidity sensor failed to initialise.
    pub fn tasks(&self, humidity_ready: bool) -> impl Iterator<Item = Task> {
        let all = [
            Task {
                label: "sht31",
                id: TaskId::SensorTick,
                period_ms: self.sensor_tick_interval_ms,
                enabled: true,
            },
            Task {
                label: "vario",
                id: TaskId::AudioUpdate,
                period_ms: self.audio_update_interval_ms,
                enabled: true,
            },
            Task {
                label: "status",
                id: TaskId::Housekeeping,
                period_ms: self.housekeeping_interval_ms,
                enabled: true,
            },
        ];
        all.into_iter()
            .filter(move |task| humidity_ready || task.id != TaskId::SensorTick)
    }

    /// Human-readable dump for the boot log.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Vario limits, if they satisfy the nesting invariant.
    pub fn beep_limits(&self) -> Option<BeepLimits> {
        BeepLimits::new(
            self.vario_rate_lower,
            self.vario_rate_upper,
            self.vario_deadzone_lower,
            self.vario_deadzone_upper,
        )
    }
}
