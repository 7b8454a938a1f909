//! End-to-end wiring: one scheduler driving both periodic drivers, the
//! same way the firmware main loop does.

use super::mock_hw::{MockClock, MockDelay, MockSht31, MockTone};

use soarsense::app::ports::{Clock, SchedulerDelegate, TaskId};
use soarsense::audio::{latest_vertical_speed, publish_vertical_speed, AudioVario};
use soarsense::config::SystemConfig;
use soarsense::error::InitError;
use soarsense::scheduler::Scheduler;
use soarsense::sensors::{AcquisitionState, Sht31};

struct Drivers<'a> {
    humidity: Sht31<MockSht31, &'a MockClock>,
    vario: AudioVario<MockTone, &'a MockClock>,
    sensor_ticks: u32,
    status_logs: u32,
}

impl SchedulerDelegate for Drivers<'_> {
    fn on_task_due(&mut self, _label: &str, id: TaskId) {
        match id {
            TaskId::SensorTick => {
                self.sensor_ticks += 1;
                self.humidity.tick();
            }
            TaskId::AudioUpdate => self.vario.update(latest_vertical_speed()),
            TaskId::Housekeeping => self.status_logs += 1,
        }
    }
}

/// Wire the scheduler exactly as the firmware does after init.
fn wire(config: &SystemConfig, humidity_ready: bool) -> Scheduler {
    let mut sched = Scheduler::new();
    for task in config.tasks(humidity_ready) {
        assert!(sched.add(task).is_some());
    }
    sched
}

#[test]
fn main_loop_drives_sensor_and_vario() {
    let config = SystemConfig::default();
    config.validate().unwrap();

    let clock = MockClock::at(0);
    let mut humidity = Sht31::new(MockSht31::new((0x6666, 0x8000)), &clock);
    let ready = humidity
        .init(config.humidity_update_period_ms, &mut MockDelay(&clock))
        .is_ok();
    assert!(ready);

    let mut vario = AudioVario::new(MockTone::default(), &clock).unwrap();
    vario.set_limits(config.beep_limits().unwrap());

    let mut sched = wire(&config, ready);
    assert_eq!(sched.active_count(), 3);

    let mut drivers = Drivers {
        humidity,
        vario,
        sensor_ticks: 0,
        status_logs: 0,
    };

    publish_vertical_speed(250);
    for _ in 0..1_000 {
        clock.advance(1);
        sched.tick(clock.millis(), &mut drivers);
    }

    // Ten sensor cycles plus the seed.
    assert_eq!(drivers.humidity.bus().measurements, 11);
    assert!(drivers.humidity.reading().is_some());

    // 372ms beeps polled at 50 Hz.
    assert_eq!(drivers.vario.device().tunes().len(), 3);
    assert_eq!(drivers.status_logs, 1);
}

#[test]
fn failed_sensor_init_leaves_only_the_vario_running() {
    let config = SystemConfig::default();
    let clock = MockClock::at(0);

    let mut bus = MockSht31::new((0x6666, 0x8000));
    bus.responsive = false;
    let mut humidity = Sht31::new(bus, &clock);
    let init = humidity.init(config.humidity_update_period_ms, &mut MockDelay(&clock));
    assert_eq!(init, Err(InitError::NoValidSample));
    assert_eq!(humidity.state(), AcquisitionState::Error);

    let mut sched = wire(&config, init.is_ok());
    assert_eq!(sched.active_count(), 2);

    let mut drivers = Drivers {
        humidity,
        vario: AudioVario::new(MockTone::default(), &clock).unwrap(),
        sensor_ticks: 0,
        status_logs: 0,
    };
    let measurements_after_init = drivers.humidity.bus().measurements;

    publish_vertical_speed(250);
    for _ in 0..1_000 {
        clock.advance(1);
        sched.tick(clock.millis(), &mut drivers);
    }

    assert_eq!(drivers.sensor_ticks, 0);
    assert_eq!(drivers.humidity.bus().measurements, measurements_after_init);
    assert_eq!(drivers.humidity.reading(), None);
    assert!(!drivers.vario.device().tunes().is_empty());
    assert_eq!(drivers.status_logs, 1);
}
