use std::fmt;
use std::time::Duration;

use crossbeam_channel::Receiver;
use thiserror::Error;

/// One of the two interchangeable playback slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotId {
    A,
    B,
}

impl SlotId {
    pub const ALL: [SlotId; 2] = [SlotId::A, SlotId::B];

    pub fn other(self) -> Self {
        match self {
            SlotId::A => SlotId::B,
            SlotId::B => SlotId::A,
        }
    }

    pub fn index(self) -> usize {
        match self {
            SlotId::A => 0,
            SlotId::B => 1,
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SlotId::A => "A",
            SlotId::B => "B",
        })
    }
}

/// Events a slot broadcasts to its subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    /// Duration (and the slot's default rate) became available.
    LoadedMetadata,
    /// A non-looping slot reached the end of its clip.
    Ended,
}

/// Handle returned by [`PlaybackSlot::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("autoplay blocked by policy")]
    AutoplayBlocked,
    #[error("no media attached to slot")]
    NoMedia,
}

/// A media playback handle together with the visual layer it owns.
///
/// The crossfade controller is the only writer of position, play state and
/// opacity while it runs.
pub trait PlaybackSlot {
    /// Mute the slot and mark it for inline (non-fullscreen) playback.
    fn prepare_inline(&mut self, muted: bool);
    fn set_looping(&mut self, looping: bool);
    fn set_playback_rate(&mut self, rate: f64);
    fn playback_rate(&self) -> f64;

    /// Request playback. May be refused by the host.
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    fn seek_to_start(&mut self);
    fn is_paused(&self) -> bool;

    fn position(&self) -> Duration;
    /// `None` until metadata has loaded.
    fn duration(&self) -> Option<Duration>;

    fn set_opacity(&mut self, opacity: f32);
    fn opacity(&self) -> f32;

    fn subscribe(&mut self) -> (ListenerId, Receiver<MediaEvent>);
    fn unsubscribe(&mut self, id: ListenerId);
}

/// Run a playback start whose failure is acceptable.
///
/// Autoplay is best-effort: a refused start leaves the layer in a degraded
/// but harmless state, so the error is logged and dropped here, at a call
/// site that names the intent.
pub fn best_effort(slot: SlotId, result: Result<(), PlaybackError>) {
    if let Err(e) = result {
        log::debug!("Slot {slot}: playback start ignored ({e})");
    }
}
