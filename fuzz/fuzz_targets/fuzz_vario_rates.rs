//! Fuzz target: `AudioVario::update` with arbitrary limits and rates.
//!
//! Every pair of input bytes is one 50 Hz update.  The vario must never
//! panic, and every command it emits must be a stop or a well-formed
//! tune that fits the tone queue slot.
//!
//! cargo fuzz run fuzz_vario_rates

#![no_main]

use core::cell::Cell;

use libfuzzer_sys::fuzz_target;
use soarsense::app::ports::{Clock, ToneDevice};
use soarsense::audio::tune::TUNE_CAPACITY;
use soarsense::audio::AudioVario;

struct StepClock(Cell<u32>);

impl Clock for StepClock {
    fn millis(&self) -> u32 {
        self.0.get()
    }
}

struct CheckingDevice;

impl ToneDevice for CheckingDevice {
    fn play(&mut self, command: &str) {
        assert!(command == Self::STOP || command.starts_with("MF"), "bad command {command}");
        assert!(command.len() <= TUNE_CAPACITY);
    }
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 8 {
        return;
    }
    let word = |i: usize| i16::from_le_bytes([data[i], data[i + 1]]);

    let clock = StepClock(Cell::new(0));
    let Ok(mut vario) = AudioVario::new(CheckingDevice, &clock) else {
        return;
    };
    // Invalid bounds are rejected one by one, so any input is fine.
    vario.set_rate_limits(word(0), word(2));
    vario.set_deadzone(word(4), word(6));

    for pair in data[8..].chunks_exact(2) {
        clock.0.set(clock.0.get().wrapping_add(20));
        vario.update(i16::from_le_bytes([pair[0], pair[1]]));
    }
});
