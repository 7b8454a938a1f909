//! Application boundary.
//!
//! The driver state machines live in [`crate::sensors`] and
//! [`crate::audio`]; everything they need from the platform comes in
//! through the **port traits** defined in [`ports`], keeping them fully
//! testable without real peripherals.

pub mod ports;
