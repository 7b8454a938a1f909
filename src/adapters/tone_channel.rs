//! Tone device adapter backed by a bounded `embassy-sync` channel.
//!
//! The vario runs in the 50 Hz audio task; the tone player runs in its
//! own thread and drains the queue at its own pace.  Neither side
//! blocks: a full queue drops the command with a warning.
//!
//! ```text
//! ┌──────────────┐   TuneString   ┌──────────────┐
//! │  AudioVario  │──────────────▶│  Tone player  │
//! │  (50 Hz)     │  TONE_CHANNEL  │  (thread)     │
//! └──────────────┘                └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::app::ports::ToneDevice;
use crate::audio::tune::TuneString;

/// Queue depth for pending tone commands.
pub const TONE_QUEUE_DEPTH: usize = 4;

pub type ToneChannel = Channel<CriticalSectionRawMutex, TuneString, TONE_QUEUE_DEPTH>;

/// Audio task → tone player.
pub static TONE_CHANNEL: ToneChannel = Channel::new();

pub struct ChannelToneDevice<'a> {
    channel: &'a ToneChannel,
    dropped: u32,
}

impl<'a> ChannelToneDevice<'a> {
    pub fn new(channel: &'a ToneChannel) -> Self {
        Self { channel, dropped: 0 }
    }

    /// Commands lost to a full queue or an oversized string.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl ToneDevice for ChannelToneDevice<'_> {
    fn play(&mut self, command: &str) {
        // Anything still queued is superseded by a stop.
        if command == Self::STOP {
            self.channel.clear();
        }

        let mut tune = TuneString::new();
        if tune.push_str(command).is_err() {
            self.dropped = self.dropped.wrapping_add(1);
            warn!("Tone: command of {} bytes exceeds queue slot", command.len());
            return;
        }

        if self.channel.try_send(tune).is_err() {
            self.dropped = self.dropped.wrapping_add(1);
            warn!("Tone: queue full, dropped '{}'", command);
        }
    }
}
