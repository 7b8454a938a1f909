//! Unified error types for the SoarSense firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping
//! the top-level wiring code's error handling uniform.  All variants are
//! `Copy` so they can be passed around the periodic callbacks without
//! allocation.
//!
//! Only setup failures ever reach the caller of a periodic entry point's
//! owner.  Transient bus faults inside `tick()` are retried silently and
//! stale readings are reported as `None`, not as errors.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A driver could not be brought up.
    Init(InitError),
    /// A bus transaction failed.
    Bus(BusError),
    /// The alarm table failed validation.
    Catalog(CatalogError),
    /// Configuration is invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(e) => write!(f, "init: {e}"),
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Catalog(e) => write!(f, "alarm catalog: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Init errors
// ---------------------------------------------------------------------------

/// Fatal to `init`; the caller must not register the driver for ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// The bus peripheral itself could not be brought up.
    DeviceUnavailable,
    /// The bus lock could not be taken within the init timeout.
    LockTimeout,
    /// The soft-reset command was not acknowledged.
    ResetFailed,
    /// The seeding measurement produced no valid sample.
    NoValidSample,
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceUnavailable => write!(f, "device unavailable"),
            Self::LockTimeout => write!(f, "bus lock timeout"),
            Self::ResetFailed => write!(f, "soft reset failed"),
            Self::NoValidSample => write!(f, "no valid sample"),
        }
    }
}

impl From<InitError> for Error {
    fn from(e: InitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The device did not acknowledge its address or a data byte.
    Nack,
    /// The transaction did not complete in time.
    Timeout,
    /// Any other transport failure.
    Io,
    /// Data arrived but its checksum did not match.
    Crc,
    /// The bus lock is held by someone else.
    Busy,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nack => write!(f, "no acknowledge"),
            Self::Timeout => write!(f, "timeout"),
            Self::Io => write!(f, "I/O error"),
            Self::Crc => write!(f, "CRC mismatch"),
            Self::Busy => write!(f, "bus busy"),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Alarm catalog errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogError {
    /// The table has no entries at all.
    Empty,
    /// Entry 0 is not the silent, zero-priority null alarm.
    MissingNullEntry,
    /// An entry's id does not match its position in the table.
    IdMismatch { index: usize },
    /// A real alarm was given priority 0.
    ZeroPriority { id: u8 },
    /// A real alarm has nothing to play.
    EmptyCommand { id: u8 },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "table is empty"),
            Self::MissingNullEntry => write!(f, "entry 0 must be the null alarm"),
            Self::IdMismatch { index } => write!(f, "id mismatch at index {index}"),
            Self::ZeroPriority { id } => write!(f, "alarm {id} has priority 0"),
            Self::EmptyCommand { id } => write!(f, "alarm {id} has an empty command"),
        }
    }
}

impl From<CatalogError> for Error {
    fn from(e: CatalogError) -> Self {
        Self::Catalog(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// A stored config blob could not be decoded.
    Malformed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::Malformed => write!(f, "malformed config blob"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// Lets `anyhow` absorb setup failures in the binary.
impl core::error::Error for Error {}
impl core::error::Error for InitError {}
impl core::error::Error for BusError {}
impl core::error::Error for CatalogError {}
impl core::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
