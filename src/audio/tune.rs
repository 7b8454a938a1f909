//! Tune command strings for the tone sequencer.
//!
//! The sequencer speaks a compact MML dialect: `T` tempo, `L` default
//! note length, `O` octave, `N` note, `MF`/`ML` play modes, and a
//! trailing `.` to sustain.  Notes are numbered 1..=84 for C0..B6.
//!
//! Everything is written into a fixed-capacity [`TuneString`] so the
//! 50 Hz update path never allocates.

use core::fmt::Write;

use heapless::String;

/// Longest command we emit is the sink tune at 52 bytes.
pub const TUNE_CAPACITY: usize = 64;

pub type TuneString = String<TUNE_CAPACITY>;

const TONE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Semitone offsets of the descending natural-minor run played while
/// sinking, starting an octave above the base note.
const SINK_STEPS: [u8; 8] = [12, 10, 8, 7, 5, 3, 2, 0];

/// Letter name of `note` ("C", "C#", ... "B").
pub fn tone_name(note: u8) -> &'static str {
    TONE_NAMES[usize::from(note.saturating_sub(1) % 12)]
}

/// Octave of `note`, 0..=6.
pub fn octave(note: u8) -> u8 {
    note.saturating_sub(1) / 12
}

/// Sequencer tempo whose `L32` note lasts about `duration_ms`.
///
/// 3/2 × 60 / 4 × 1000 = 22500.
pub fn tempo(duration_ms: u16) -> u8 {
    (22_500 / u32::from(duration_ms.max(1))) as u8
}

/// A climb beep: a short blip at full tempo to wake the sequencer, then
/// the sustained note at a tempo derived from `duration_ms`.
pub fn climb_beep(note: u8, duration_ms: u16) -> TuneString {
    let mut out = TuneString::new();
    let (oct, name) = (octave(note), tone_name(note));
    // Capacity covers the longest possible output; a write error is unreachable.
    let _ = write!(
        out,
        "MFMLT255L64O{}N{}T{}L32O{}N{}",
        oct,
        name,
        tempo(duration_ms),
        oct,
        name
    );
    out
}

/// The sink warning: eight fast notes falling an octave onto `note`,
/// with the last one sustained.
pub fn sink_tune(note: u8) -> TuneString {
    let mut out = TuneString::new();
    let _ = out.push_str("MFMLT255L64");
    for step in SINK_STEPS {
        let n = note.saturating_add(step);
        let _ = write!(out, "O{}N{}", octave(n), tone_name(n));
    }
    let _ = out.push('.');
    out
}
