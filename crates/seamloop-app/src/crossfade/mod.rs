//! Seamless loop crossfader.
//!
//! Two slots play the same clip in alternation. A fixed window before the
//! active slot reaches its end, the idle slot restarts from zero and the two
//! layers crossfade with a smoothstep ramp, so the jump back to frame zero is
//! never on screen.

pub mod controller;
pub mod easing;
pub mod schedule;
pub mod slot;

pub use controller::{
    CrossfadeConfig, CrossfadeController, DEFAULT_FADE_DURATION, DEFAULT_PLAYBACK_RATE, LoopMode,
    trigger_point,
};
pub use easing::smoothstep;
pub use schedule::{FrameRequestId, FrameScheduler, ManualScheduler};
pub use slot::{ListenerId, MediaEvent, PlaybackError, PlaybackSlot, SlotId, best_effort};
