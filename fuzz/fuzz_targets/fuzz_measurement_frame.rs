//! Fuzz target: `sht31::decode_frame`
//!
//! Feeds arbitrary 6-byte frames into the measurement decoder and
//! asserts that it never panics, accepts a frame only when both
//! checksums match, and that accepted words convert to finite values.
//!
//! cargo fuzz run fuzz_measurement_frame

#![no_main]

use libfuzzer_sys::fuzz_target;
use soarsense::sensors::sht31::{crc8, decode_frame, raw_to_celsius, raw_to_relative_humidity};

fuzz_target!(|data: &[u8]| {
    let Ok(frame) = <[u8; 6]>::try_from(data) else {
        return;
    };

    let checksums_ok = frame[2] == crc8(&frame[0..2]) && frame[5] == crc8(&frame[3..5]);
    match decode_frame(&frame) {
        Ok((st, srh)) => {
            assert!(checksums_ok, "frame accepted with a bad checksum");
            assert!(raw_to_celsius(st).is_finite());
            assert!(raw_to_relative_humidity(srh).is_finite());
        }
        Err(_) => assert!(!checksums_ok, "valid frame rejected"),
    }
});
