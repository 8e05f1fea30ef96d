use std::time::Duration;

use crossbeam_channel::Receiver;

use super::easing::smoothstep;
use super::schedule::{FrameRequestId, FrameScheduler};
use super::slot::{ListenerId, MediaEvent, PlaybackSlot, SlotId, best_effort};

pub const DEFAULT_PLAYBACK_RATE: f64 = 0.75;
pub const DEFAULT_FADE_DURATION: Duration = Duration::from_millis(1400);

#[derive(Debug, Clone, PartialEq)]
pub struct CrossfadeConfig {
    /// Speed multiplier applied to both slots.
    pub playback_rate: f64,
    /// Length of each crossfade; also how early before the clip end it starts.
    pub fade_duration: Duration,
    /// Read once at start; bypasses the crossfade entirely.
    pub reduced_motion: bool,
}

impl Default for CrossfadeConfig {
    fn default() -> Self {
        Self {
            playback_rate: DEFAULT_PLAYBACK_RATE,
            fade_duration: DEFAULT_FADE_DURATION,
            reduced_motion: false,
        }
    }
}

impl CrossfadeConfig {
    /// Replace a non-positive or non-finite rate with the default.
    pub fn sanitized(mut self) -> Self {
        if !(self.playback_rate.is_finite() && self.playback_rate > 0.0) {
            log::warn!(
                "Invalid playback rate {}, using {}",
                self.playback_rate,
                DEFAULT_PLAYBACK_RATE
            );
            self.playback_rate = DEFAULT_PLAYBACK_RATE;
        }
        self
    }
}

/// How the controller keeps the clip looping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Two slots, crossfaded before each clip end.
    Crossfade,
    /// Reduced motion: one slot loops natively, no per-frame work.
    NativeLoop,
}

/// Playback position at which the next crossfade starts.
///
/// Clamps to zero when the fade is longer than the clip.
pub fn trigger_point(duration: Duration, fade: Duration) -> Duration {
    duration.saturating_sub(fade)
}

/// Plays two copies of one clip in alternation, crossfading near the end of
/// each pass so the restart is never visible.
///
/// Frame-driven: the host calls [`on_frame`](Self::on_frame) for every id the
/// controller requested from its [`FrameScheduler`]. At most one request is
/// outstanding at any time.
pub struct CrossfadeController<S: PlaybackSlot> {
    slots: [S; 2],
    config: CrossfadeConfig,
    mode: LoopMode,
    active: SlotId,
    /// `Some` while fading; holds the frame time the fade began.
    fade_started_at: Option<Duration>,
    pending_frame: Option<FrameRequestId>,
    listeners: Vec<(SlotId, ListenerId, Receiver<MediaEvent>)>,
    running: bool,
}

impl<S: PlaybackSlot> CrossfadeController<S> {
    pub fn new(a: S, b: S, config: CrossfadeConfig) -> Self {
        let config = config.sanitized();
        let mode = if config.reduced_motion {
            LoopMode::NativeLoop
        } else {
            LoopMode::Crossfade
        };
        Self {
            slots: [a, b],
            config,
            mode,
            active: SlotId::A,
            fade_started_at: None,
            pending_frame: None,
            listeners: Vec::new(),
            running: false,
        }
    }

    pub fn start(&mut self, scheduler: &mut impl FrameScheduler) {
        if self.running {
            log::debug!("Crossfade already running");
            return;
        }
        self.running = true;
        self.active = SlotId::A;
        self.fade_started_at = None;

        if self.mode == LoopMode::NativeLoop {
            let a = &mut self.slots[0];
            a.prepare_inline(true);
            a.set_looping(true);
            a.set_opacity(1.0);
            best_effort(SlotId::A, a.play());
            let b = &mut self.slots[1];
            b.pause();
            b.seek_to_start();
            b.set_opacity(0.0);
            log::info!("Reduced motion: native loop on slot A, crossfade disabled");
            return;
        }

        let rate = self.config.playback_rate;
        for id in SlotId::ALL {
            let slot = self.slot_mut(id);
            slot.prepare_inline(true);
            slot.set_looping(false);
            slot.set_playback_rate(rate);
            let (listener, rx) = slot.subscribe();
            self.listeners.push((id, listener, rx));
        }

        let a = &mut self.slots[0];
        a.set_opacity(1.0);
        best_effort(SlotId::A, a.play());
        let b = &mut self.slots[1];
        b.set_opacity(0.0);
        b.pause();
        b.seek_to_start();

        log::info!(
            "Crossfade loop started: rate {:.2}x, fade {:.2}s",
            rate,
            self.config.fade_duration.as_secs_f64()
        );
        self.schedule(scheduler);
    }

    /// Cancel the outstanding frame and remove our listeners. Idempotent.
    pub fn stop(&mut self, scheduler: &mut impl FrameScheduler) {
        if let Some(id) = self.pending_frame.take() {
            scheduler.cancel_frame(id);
        }
        for (slot, listener, _) in std::mem::take(&mut self.listeners) {
            self.slot_mut(slot).unsubscribe(listener);
        }
        if self.running {
            log::info!("Crossfade loop stopped");
        }
        self.running = false;
    }

    /// Frame callback. `now` is a monotonic frame timestamp.
    ///
    /// Ids other than the outstanding request are stale and ignored.
    pub fn on_frame(
        &mut self,
        id: FrameRequestId,
        now: Duration,
        scheduler: &mut impl FrameScheduler,
    ) {
        if self.pending_frame != Some(id) {
            log::trace!("Ignoring stale frame {id:?}");
            return;
        }
        self.pending_frame = None;
        if !self.running {
            return;
        }

        self.drain_media_events();
        self.update(now);
        self.schedule(scheduler);
    }

    /// Apply new timing. The rate takes effect immediately, the fade
    /// duration from the next frame. Reduced motion is not re-read.
    pub fn reconfigure(&mut self, playback_rate: f64, fade_duration: Duration) {
        let next = CrossfadeConfig {
            playback_rate,
            fade_duration,
            reduced_motion: self.config.reduced_motion,
        }
        .sanitized();
        if next == self.config {
            return;
        }
        self.config = next;
        if self.running && self.mode == LoopMode::Crossfade {
            for slot in &mut self.slots {
                slot.set_playback_rate(self.config.playback_rate);
            }
        }
        log::info!(
            "Crossfade reconfigured: rate {:.2}x, fade {:.2}s",
            self.config.playback_rate,
            self.config.fade_duration.as_secs_f64()
        );
    }

    pub fn active_slot(&self) -> SlotId {
        self.active
    }

    pub fn is_fading(&self) -> bool {
        self.fade_started_at.is_some()
    }

    pub fn mode(&self) -> LoopMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn config(&self) -> &CrossfadeConfig {
        &self.config
    }

    pub fn pending_frame(&self) -> Option<FrameRequestId> {
        self.pending_frame
    }

    pub fn slot(&self, id: SlotId) -> &S {
        &self.slots[id.index()]
    }

    pub fn slot_mut(&mut self, id: SlotId) -> &mut S {
        &mut self.slots[id.index()]
    }

    /// Both slots, for host work that does not touch playback state
    /// (advancing decoders, uploading frames).
    pub fn slots_mut(&mut self) -> &mut [S; 2] {
        &mut self.slots
    }

    /// `(opacity of A, opacity of B)`.
    pub fn opacities(&self) -> (f32, f32) {
        (self.slots[0].opacity(), self.slots[1].opacity())
    }

    fn schedule(&mut self, scheduler: &mut impl FrameScheduler) {
        if self.pending_frame.is_none() {
            self.pending_frame = Some(scheduler.request_frame());
        }
    }

    fn drain_media_events(&mut self) {
        let rate = self.config.playback_rate;
        let mut reapply = [false; 2];
        for (slot, _, rx) in &self.listeners {
            while let Ok(event) = rx.try_recv() {
                if event == MediaEvent::LoadedMetadata {
                    reapply[slot.index()] = true;
                }
            }
        }
        for id in SlotId::ALL {
            if reapply[id.index()] {
                log::debug!("Slot {id}: metadata loaded, applying rate {rate:.2}x");
                self.slot_mut(id).set_playback_rate(rate);
            }
        }
    }

    fn update(&mut self, now: Duration) {
        let active = self.active;
        let other = active.other();
        let fade = self.config.fade_duration;

        if self.fade_started_at.is_none() {
            let slot = self.slot(active);
            if let Some(duration) = slot.duration().filter(|d| !d.is_zero()) {
                if slot.position() >= trigger_point(duration, fade) {
                    self.fade_started_at = Some(now);
                    let incoming = self.slot_mut(other);
                    incoming.seek_to_start();
                    best_effort(other, incoming.play());
                    log::debug!("Crossfade {active} -> {other} started at {now:?}");
                }
            }
        }

        let Some(started) = self.fade_started_at else {
            return;
        };

        let progress = if fade.is_zero() {
            1.0
        } else {
            (now.saturating_sub(started).as_secs_f64() / fade.as_secs_f64()).clamp(0.0, 1.0)
        };
        let eased = smoothstep(progress);
        self.slot_mut(active).set_opacity((1.0 - eased) as f32);
        self.slot_mut(other).set_opacity(eased as f32);

        if progress >= 1.0 {
            let outgoing = self.slot_mut(active);
            outgoing.pause();
            outgoing.seek_to_start();
            self.active = other;
            self.fade_started_at = None;
            log::debug!("Crossfade complete, slot {other} active");
        }
    }
}
