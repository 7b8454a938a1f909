//! Discrete audio alarms and their priorities.
//!
//! The catalog is a `'static` table validated once when the
//! [`AudioVario`](super::vario::AudioVario) is built: both
//! [`AlarmCatalog::new`] and [`AlarmCatalog::standard`] run the checks.  Lookups after that
//! are plain indexing by [`AlarmId`].
//!
//! | id | alarm            | priority | duration |
//! |----|------------------|----------|----------|
//! | 0  | none             | 0        | 0 ms     |
//! | 1  | waypoint reached | 20       | 900 ms   |
//! | 2  | airspace warning | 30       | 1050 ms  |
//! | 3  | terrain warning  | 40       | 500 ms   |

use crate::error::CatalogError;

/// Index into an [`AlarmCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlarmId(pub u8);

impl AlarmId {
    pub const NONE: Self = Self(0);
    pub const WAYPOINT_REACHED: Self = Self(1);
    pub const AIRSPACE_WARNING: Self = Self(2);
    pub const TERRAIN_WARNING: Self = Self(3);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmRecord {
    pub id: AlarmId,
    /// Higher is more urgent.  Only the null alarm may use 0.
    pub priority: u8,
    /// Tune command handed to the tone device.
    pub command: &'static str,
    pub duration_ms: u32,
}

pub static STANDARD_ALARMS: [AlarmRecord; 4] = [
    AlarmRecord {
        id: AlarmId::NONE,
        priority: 0,
        command: "",
        duration_ms: 0,
    },
    AlarmRecord {
        id: AlarmId::WAYPOINT_REACHED,
        priority: 20,
        command: "MFT250L4O3AL16BCDEFG>ABCDEFL4G",
        duration_ms: 900,
    },
    AlarmRecord {
        id: AlarmId::AIRSPACE_WARNING,
        priority: 30,
        command: "MFT100L16>B<C>B<C>B<C>B",
        duration_ms: 1050,
    },
    AlarmRecord {
        id: AlarmId::TERRAIN_WARNING,
        priority: 40,
        command: "MFT200L2A-G-A-G-A-G-",
        duration_ms: 500,
    },
];

/// Validated, read-only alarm table.
#[derive(Debug, Clone, Copy)]
pub struct AlarmCatalog {
    records: &'static [AlarmRecord],
}

impl AlarmCatalog {
    /// Validate `records`: entry 0 must be the silent null alarm, every
    /// id must equal its index, and every other entry needs a non-zero
    /// priority and something to play.
    pub fn new(records: &'static [AlarmRecord]) -> Result<Self, CatalogError> {
        let first = records.first().ok_or(CatalogError::Empty)?;
        if first.id != AlarmId::NONE || first.priority != 0 || !first.command.is_empty() {
            return Err(CatalogError::MissingNullEntry);
        }
        for (index, record) in records.iter().enumerate().skip(1) {
            if usize::from(record.id.0) != index {
                return Err(CatalogError::IdMismatch { index });
            }
            if record.priority == 0 {
                return Err(CatalogError::ZeroPriority { id: record.id.0 });
            }
            if record.command.is_empty() {
                return Err(CatalogError::EmptyCommand { id: record.id.0 });
            }
        }
        Ok(Self { records })
    }

    /// The built-in table, validated like any other.
    pub fn standard() -> Result<Self, CatalogError> {
        Self::new(&STANDARD_ALARMS)
    }

    pub fn get(&self, id: AlarmId) -> Option<&AlarmRecord> {
        self.records.get(usize::from(id.0))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
