//! Audio feedback — the vario tone generator and its alarm table.
//!
//! The flight stack publishes vertical speed through
//! [`publish_vertical_speed`]; the 50 Hz audio task picks up the latest
//! value with [`latest_vertical_speed`] and feeds it to
//! [`AudioVario::update`].

pub mod alarms;
pub mod tune;
pub mod vario;

use core::sync::atomic::{AtomicI16, Ordering};

pub use alarms::{AlarmCatalog, AlarmId, AlarmRecord};
pub use vario::{AudioVario, BeepLimits, BeepTimingState, ToneParameters};

/// Latest energy-compensated vertical speed, cm/s.
static VERTICAL_SPEED_CM_S: AtomicI16 = AtomicI16::new(0);

/// Lock-free, callable from any task.
pub fn publish_vertical_speed(cm_per_s: i16) {
    VERTICAL_SPEED_CM_S.store(cm_per_s, Ordering::Release);
}

pub fn latest_vertical_speed() -> i16 {
    VERTICAL_SPEED_CM_S.load(Ordering::Acquire)
}
