//! SoarSense Firmware — Main Entry Point
//!
//! Port/adapter wiring around two periodic drivers.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  I2cSensorBus        SystemClock        ChannelToneDevice      │
//! │  (SensorBus)         (Clock)            (ToneDevice)           │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │        Sht31 (humidity)   ·   AudioVario (tones)       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (delegate-driven, 1 ms main loop)                   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::AnyIOPin;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs};
use log::{debug, error, info, warn};

use soarsense::adapters::i2c_bus::{BusSemaphore, I2cSensorBus};
use soarsense::adapters::time::SystemClock;
use soarsense::adapters::tone_channel::{ChannelToneDevice, TONE_CHANNEL};
use soarsense::app::ports::{Clock, SchedulerDelegate, TaskId};
use soarsense::audio::{latest_vertical_speed, AudioVario};
use soarsense::config::SystemConfig;
use soarsense::error::InitError;
use soarsense::pins;
use soarsense::scheduler::Scheduler;
use soarsense::sensors::Sht31;

/// Shared by every device on I2C0.
static I2C0_LOCK: BusSemaphore = BusSemaphore::new();

const CONFIG_NAMESPACE: &str = "soarsense";
const CONFIG_KEY: &str = "syscfg";

type HumiditySensor<'d> = Sht31<I2cSensorBus<'static, I2cDriver<'d>, SystemClock>, SystemClock>;
type Vario = AudioVario<ChannelToneDevice<'static>, SystemClock>;

// ── Scheduler delegate ────────────────────────────────────────
//
// Bridges the scheduler (which knows nothing about the drivers) to the
// periodic entry points.

struct Drivers<'d> {
    /// `None` when the sensor never came up; its tick is not scheduled.
    humidity: Option<HumiditySensor<'d>>,
    vario: Vario,
}

impl SchedulerDelegate for Drivers<'_> {
    fn on_task_due(&mut self, label: &str, id: TaskId) {
        match id {
            TaskId::SensorTick => {
                if let Some(humidity) = self.humidity.as_mut() {
                    humidity.tick();
                }
            }
            TaskId::AudioUpdate => self.vario.update(latest_vertical_speed()),
            TaskId::Housekeeping => match self.humidity.as_ref() {
                Some(humidity) => match humidity.reading() {
                    Some(r) => info!(
                        "[{}] {:.2}°C {:.1}%RH, vario {}cm/s",
                        label,
                        r.temperature_c,
                        r.humidity_pct,
                        latest_vertical_speed()
                    ),
                    None => warn!("[{}] no fresh humidity reading ({:?})", label, humidity.state()),
                },
                None => info!("[{}] vario {}cm/s, no humidity sensor", label, latest_vertical_speed()),
            },
        }
    }
}

/// Read the persisted config blob into `buf`, if there is one.
fn stored_config(buf: &mut [u8]) -> Option<&[u8]> {
    let partition = EspDefaultNvsPartition::take()
        .inspect_err(|e| warn!("NVS: partition unavailable ({})", e))
        .ok()?;
    // A missing namespace just means nothing was ever saved.
    let nvs = EspNvs::new(partition, CONFIG_NAMESPACE, false)
        .inspect_err(|e| debug!("NVS: namespace {} not opened ({})", CONFIG_NAMESPACE, e))
        .ok()?;
    nvs.get_blob(CONFIG_KEY, buf)
        .inspect_err(|e| warn!("NVS: reading {} failed ({})", CONFIG_KEY, e))
        .ok()
        .flatten()
}

/// Bring up the SHT31 on an already-running I2C driver.
fn start_humidity<'d>(i2c: I2cDriver<'d>, config: &SystemConfig) -> Result<HumiditySensor<'d>, InitError> {
    let bus = I2cSensorBus::new(i2c, config.sht31_address, &I2C0_LOCK, SystemClock::new());
    let mut sensor = Sht31::new(bus, SystemClock::new());
    sensor.init(config.humidity_update_period_ms, &mut FreeRtos)?;
    Ok(sensor)
}

/// Drains the tone queue.
fn spawn_tone_player() -> Result<()> {
    std::thread::Builder::new()
        .name("tone".into())
        .stack_size(4096)
        .spawn(|| {
            loop {
                while let Ok(tune) = TONE_CHANNEL.try_receive() {
                    // Buzzer backend plugs in here; until then commands
                    // are only traced.
                    debug!("Tone: {}", tune);
                }
                FreeRtos::delay_ms(5);
            }
        })?;
    Ok(())
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SoarSense v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let mut blob = [0u8; 64];
    let config = SystemConfig::load(stored_config(&mut blob));
    config.validate()?;
    info!("Config: {}", config.to_json());

    // ── 2. I2C bus + humidity sensor ──────────────────────────
    let peripherals = Peripherals::take()?;
    // SAFETY: the pin numbers come from the board map and are not
    // claimed by any other driver.
    let (sda, scl) = unsafe {
        (
            AnyIOPin::new(pins::I2C_SDA_GPIO),
            AnyIOPin::new(pins::I2C_SCL_GPIO),
        )
    };
    let i2c_config = I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ));
    let humidity = match I2cDriver::new(peripherals.i2c0, sda, scl, &i2c_config) {
        Ok(i2c) => start_humidity(i2c, &config),
        Err(e) => {
            error!("I2C0 driver failed: {}", e);
            Err(InitError::DeviceUnavailable)
        }
    };
    // Keep flying without humidity; the vario matters more.
    let humidity = humidity
        .inspect_err(|e| error!("SHT31 init failed: {}", e))
        .ok();

    // ── 3. Audio vario ────────────────────────────────────────
    spawn_tone_player()?;
    let mut vario = AudioVario::new(ChannelToneDevice::new(&TONE_CHANNEL), SystemClock::new())?;
    if let Some(limits) = config.beep_limits() {
        vario.set_limits(limits);
    }

    // ── 4. Scheduler ──────────────────────────────────────────
    let mut sched = Scheduler::new();
    for task in config.tasks(humidity.is_some()) {
        if sched.add(task).is_none() {
            warn!("Scheduler full, task dropped");
        }
    }

    let mut drivers = Drivers { humidity, vario };
    let clock = SystemClock::new();

    info!("System ready. Entering main loop.");

    // ── 5. Main loop ──────────────────────────────────────────
    loop {
        sched.tick(clock.millis(), &mut drivers);
        FreeRtos::delay_ms(1);
    }
}
