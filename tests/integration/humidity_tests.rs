//! Integration tests for the SHT31 acquisition cycle.
//!
//! Drives the driver millisecond by millisecond against the simulated
//! chip, the way the 1 kHz sensor task does on hardware.

use super::mock_hw::{MockClock, MockDelay, MockSht31};

use soarsense::app::ports::Clock;
use soarsense::error::InitError;
use soarsense::sensors::sht31::{raw_to_celsius, raw_to_relative_humidity};
use soarsense::sensors::{AcquisitionState, Sht31};

const RAW: (u16, u16) = (0x6666, 0x8000);

fn ready_sensor(clock: &MockClock, period_ms: u16) -> Sht31<MockSht31, &MockClock> {
    let mut sht = Sht31::new(MockSht31::new(RAW), clock);
    sht.init(period_ms, &mut MockDelay(clock)).unwrap();
    sht
}

/// Tick once per millisecond until `until` (inclusive).
fn run_until(sht: &mut Sht31<MockSht31, &MockClock>, clock: &MockClock, until: u32) {
    while clock.millis() < until {
        clock.advance(1);
        sht.tick();
    }
}

// ── Init ──────────────────────────────────────────────────────

#[test]
fn init_publishes_a_reading_immediately() {
    let clock = MockClock::at(1_000);
    let sht = ready_sensor(&clock, 100);

    assert_eq!(sht.state(), AcquisitionState::Idle);
    assert_eq!(sht.bus().resets, 1);
    assert_eq!(sht.bus().measurements, 1);
    assert!(!sht.bus().holding_lock(), "init must release the bus");

    let reading = sht.reading().unwrap();
    assert_eq!(reading.sampled_at_ms, 1_025);
    assert_eq!(reading.temperature_c, raw_to_celsius(RAW.0));
    assert_eq!(reading.humidity_pct, raw_to_relative_humidity(RAW.1));
}

#[test]
fn init_fails_when_bus_is_held() {
    let clock = MockClock::at(0);
    let mut bus = MockSht31::new(RAW);
    bus.locked_elsewhere = true;
    let mut sht = Sht31::new(bus, &clock);

    assert_eq!(sht.init(100, &mut MockDelay(&clock)), Err(InitError::LockTimeout));
    assert_eq!(sht.state(), AcquisitionState::Error);

    // Ticks are ignored until a successful init.
    sht.bus_mut().locked_elsewhere = false;
    run_until(&mut sht, &clock, 500);
    assert_eq!(sht.bus().measurements, 0);
}

#[test]
fn init_fails_without_a_valid_sample() {
    let clock = MockClock::at(0);
    let mut bus = MockSht31::new(RAW);
    bus.responsive = false;
    let mut sht = Sht31::new(bus, &clock);

    assert_eq!(sht.init(100, &mut MockDelay(&clock)), Err(InitError::NoValidSample));
    assert_eq!(sht.reading(), None);
}

// ── Periodic acquisition ──────────────────────────────────────

#[test]
fn one_measurement_per_update_period() {
    let clock = MockClock::at(1_000);
    let mut sht = ready_sensor(&clock, 100);

    run_until(&mut sht, &clock, 2_025);

    // Seed measurement plus one every 100ms starting at 1105.
    assert_eq!(sht.bus().measurements, 11);
    assert_eq!(sht.bus().resets, 1);
    let reading = sht.reading().unwrap();
    assert_eq!(reading.sampled_at_ms, 1_926);
    assert!(!sht.bus().holding_lock());
}

#[test]
fn update_period_is_floored() {
    let clock = MockClock::at(0);
    let mut sht = ready_sensor(&clock, 5);
    assert_eq!(sht.update_period_ms(), 25);

    run_until(&mut sht, &clock, 125);
    assert_eq!(sht.bus().measurements, 5);
}

#[test]
fn contended_bus_delays_the_cycle() {
    let clock = MockClock::at(1_000);
    let mut sht = ready_sensor(&clock, 100);

    sht.bus_mut().locked_elsewhere = true;
    run_until(&mut sht, &clock, 1_300);
    assert_eq!(sht.bus().measurements, 1);

    sht.bus_mut().locked_elsewhere = false;
    clock.advance(1);
    sht.tick();
    assert_eq!(sht.bus().measurements, 2);
    assert_eq!(sht.state(), AcquisitionState::Measuring);
}

#[test]
fn corrupted_frame_is_retried_without_publishing() {
    let clock = MockClock::at(1_000);
    let mut sht = ready_sensor(&clock, 100);

    // Measurement starts at 1105.  The first collect at 1126 sees a bad
    // checksum; the chip has nothing more to send, so nothing is
    // published until the next measurement after the stuck reset.
    sht.bus_mut().corrupt_next = true;
    run_until(&mut sht, &clock, 1_126);
    assert_eq!(sht.state(), AcquisitionState::Measuring);
    assert_eq!(sht.last_reading().unwrap().sampled_at_ms, 1_025);
}

// ── Stuck sensor ──────────────────────────────────────────────

#[test]
fn silent_sensor_is_reset_once_per_window() {
    let clock = MockClock::at(1_000);
    let mut sht = ready_sensor(&clock, 100);
    sht.bus_mut().responsive = false;

    let mut reset_times = Vec::new();
    let mut resets = sht.bus().resets;
    while clock.millis() < 2_000 {
        clock.advance(1);
        sht.tick();
        if sht.bus().resets != resets {
            resets = sht.bus().resets;
            reset_times.push(clock.millis());
        }
    }

    assert_eq!(reset_times.first(), Some(&1_306));
    assert!(reset_times.len() >= 3);
    for pair in reset_times.windows(2) {
        assert!(pair[1] - pair[0] > 200, "resets too close: {:?}", reset_times);
    }

    // Nothing fresh while the chip is hung.
    assert_eq!(sht.reading(), None);
    assert_eq!(sht.humidity(), None);
    assert!(sht.last_reading().is_some());
}

#[test]
fn sensor_recovers_after_reset() {
    let clock = MockClock::at(1_000);
    let mut sht = ready_sensor(&clock, 100);
    sht.bus_mut().responsive = false;
    run_until(&mut sht, &clock, 1_400);
    assert!(sht.bus().resets >= 2);

    sht.bus_mut().responsive = true;
    run_until(&mut sht, &clock, 1_800);
    let reading = sht.reading().unwrap();
    assert!(clock.millis() - reading.sampled_at_ms <= 100);
    assert_eq!(sht.temperature(), Some(raw_to_celsius(RAW.0)));
}

// ── Maintenance commands ──────────────────────────────────────

#[test]
fn status_register_round_trip() {
    let clock = MockClock::at(0);
    let mut sht = ready_sensor(&clock, 100);

    assert_eq!(sht.read_status(), Ok(0x8010));
    sht.clear_status().unwrap();
    assert_eq!(sht.read_status(), Ok(0));
    assert!(sht.set_heater(true).is_ok());
    assert!(!sht.bus().holding_lock());
}

// ── Clock wraparound ──────────────────────────────────────────

/// Tick once per millisecond, `ms` times.
fn run_for(sht: &mut Sht31<MockSht31, &MockClock>, clock: &MockClock, ms: u32) {
    for _ in 0..ms {
        clock.advance(1);
        sht.tick();
    }
}

#[test]
fn measurement_cycle_continues_across_clock_wrap() {
    let clock = MockClock::at(u32::MAX - 50);
    let mut sht = ready_sensor(&clock, 100);
    assert_eq!(sht.reading().unwrap().sampled_at_ms, u32::MAX - 25);

    // Seeded at MAX-45; cycles start at 54, 154, .. 954.
    for _ in 0..1_000 {
        clock.advance(1);
        sht.tick();
        assert!(sht.reading().is_some(), "stale at {}", clock.millis());
    }
    assert_eq!(clock.millis(), 974);
    assert_eq!(sht.bus().measurements, 11);
    assert_eq!(sht.bus().resets, 1);
    assert_eq!(sht.reading().unwrap().sampled_at_ms, 875);
}

#[test]
fn freshness_is_judged_across_clock_wrap() {
    let clock = MockClock::at(u32::MAX - 50);
    let sht = ready_sensor(&clock, 100);

    // Sampled at MAX-25: exactly one period old at 74.
    clock.advance(99);
    assert_eq!(clock.millis(), 74);
    assert!(sht.humidity().is_some());

    clock.advance(1);
    assert_eq!(sht.reading(), None);
    assert_eq!(sht.last_reading().unwrap().sampled_at_ms, u32::MAX - 25);
}

#[test]
fn stuck_sensor_resets_across_clock_wrap() {
    let clock = MockClock::at(u32::MAX - 50);
    let mut sht = ready_sensor(&clock, 100);
    sht.bus_mut().responsive = false;

    // Measurements at 54, 265, 476, 687, 898; resets 201ms after each.
    run_for(&mut sht, &clock, 1_000);
    assert_eq!(sht.bus().measurements, 6);
    assert_eq!(sht.bus().resets, 5);
    assert!(!sht.bus().holding_lock());
}
