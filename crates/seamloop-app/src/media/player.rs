use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use super::decoder::MediaSource;
use super::types::{AutoplayPolicy, TransportState};
use crate::crossfade::{ListenerId, MediaEvent, PlaybackError, PlaybackSlot};

/// Plays a shared, pre-decoded clip and owns the opacity of its layer.
///
/// Both crossfade slots hold an `Arc` to the same [`MediaSource`], so a clip
/// is decoded once no matter how many players show it.
pub struct ClipPlayer {
    label: &'static str,
    source: Option<Arc<MediaSource>>,
    pub transport: TransportState,
    autoplay: AutoplayPolicy,
    opacity: f32,
    current_frame: usize,
    needs_upload: bool,
    listeners: Vec<(ListenerId, Sender<MediaEvent>)>,
    next_listener: u64,
}

impl ClipPlayer {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            source: None,
            transport: TransportState::default(),
            autoplay: AutoplayPolicy::Allowed,
            opacity: 0.0,
            current_frame: 0,
            needs_upload: false,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn with_autoplay(mut self, policy: AutoplayPolicy) -> Self {
        self.autoplay = policy;
        self
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn source(&self) -> Option<&Arc<MediaSource>> {
        self.source.as_ref()
    }

    /// Attach decoded media. This is the metadata-load moment: duration
    /// becomes known, the rate falls back to 1.0 and subscribers are told.
    /// A play requested before any media was attached starts now.
    pub fn attach_source(&mut self, source: Arc<MediaSource>) {
        self.transport.duration = source.duration();
        self.transport.rate = 1.0;
        self.transport.position = Duration::ZERO;
        self.transport.ended = false;
        self.current_frame = 0;
        self.needs_upload = true;
        self.source = Some(source);
        if self.transport.play_requested {
            self.transport.playing = true;
        }
        log::debug!(
            "Player {}: metadata loaded ({:?})",
            self.label,
            self.transport.duration
        );
        self.emit(MediaEvent::LoadedMetadata);
    }

    /// Advance the playhead by wall-clock `dt`, scaled by the playback rate.
    pub fn advance(&mut self, dt: Duration) {
        if !self.transport.playing {
            return;
        }
        let Some(duration) = self.transport.duration.filter(|d| !d.is_zero()) else {
            return;
        };

        let mut position = self.transport.position + dt.mul_f64(self.transport.rate);
        if position >= duration {
            if self.transport.looping {
                position = wrap(position, duration);
            } else {
                position = duration;
                self.transport.playing = false;
                self.transport.ended = true;
                self.emit(MediaEvent::Ended);
            }
        }
        self.transport.position = position;
        self.sync_frame();
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Returns true once per frame change; the caller uploads the frame.
    pub fn take_needs_upload(&mut self) -> bool {
        std::mem::take(&mut self.needs_upload)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_ended(&self) -> bool {
        self.transport.ended
    }

    fn sync_frame(&mut self) {
        let Some(source) = &self.source else {
            return;
        };
        let frame = source.frame_index_at(self.transport.position);
        if frame != self.current_frame {
            self.current_frame = frame;
            self.needs_upload = true;
        }
    }

    fn emit(&mut self, event: MediaEvent) {
        // Drop listeners whose receiver went away
        self.listeners.retain(|(_, tx)| tx.send(event).is_ok());
    }
}

fn wrap(position: Duration, duration: Duration) -> Duration {
    let nanos = position.as_nanos() % duration.as_nanos();
    Duration::from_nanos(nanos as u64)
}

impl PlaybackSlot for ClipPlayer {
    fn prepare_inline(&mut self, muted: bool) {
        self.transport.muted = muted;
        self.transport.inline = true;
    }

    fn set_looping(&mut self, looping: bool) {
        self.transport.looping = looping;
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.transport.rate = rate;
    }

    fn playback_rate(&self) -> f64 {
        self.transport.rate
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        match self.autoplay {
            AutoplayPolicy::Blocked => return Err(PlaybackError::AutoplayBlocked),
            AutoplayPolicy::MutedOnly if !self.transport.muted => {
                return Err(PlaybackError::AutoplayBlocked);
            }
            _ => {}
        }
        self.transport.play_requested = true;
        if self.source.is_none() {
            return Err(PlaybackError::NoMedia);
        }
        if self.transport.ended {
            // Playing an ended element restarts it
            self.transport.position = Duration::ZERO;
            self.transport.ended = false;
            self.sync_frame();
        }
        self.transport.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.transport.playing = false;
        self.transport.play_requested = false;
    }

    fn seek_to_start(&mut self) {
        self.transport.position = Duration::ZERO;
        self.transport.ended = false;
        self.sync_frame();
    }

    fn is_paused(&self) -> bool {
        !self.transport.playing
    }

    fn position(&self) -> Duration {
        self.transport.position
    }

    fn duration(&self) -> Option<Duration> {
        self.transport.duration
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    fn opacity(&self) -> f32 {
        self.opacity
    }

    fn subscribe(&mut self) -> (ListenerId, Receiver<MediaEvent>) {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        let (tx, rx) = crossbeam_channel::unbounded();
        self.listeners.push((id, tx));
        (id, rx)
    }

    fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.retain(|(l, _)| *l != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::types::DecodedFrame;

    /// Ten 1x1 frames of 100ms each: a one-second clip.
    fn one_second_clip() -> Arc<MediaSource> {
        Arc::new(MediaSource::Animated {
            frames: (0..10)
                .map(|_| DecodedFrame {
                    data: vec![0; 4],
                    width: 1,
                    height: 1,
                })
                .collect(),
            delays_ms: vec![100; 10],
        })
    }

    #[test]
    fn attach_emits_loaded_metadata_and_resets_rate() {
        let mut p = ClipPlayer::new("test");
        let (_, rx) = p.subscribe();
        p.set_playback_rate(0.5);
        p.attach_source(one_second_clip());
        assert_eq!(rx.try_recv(), Ok(MediaEvent::LoadedMetadata));
        assert_eq!(p.duration(), Some(Duration::from_secs(1)));
        assert!((p.playback_rate() - 1.0).abs() < 1e-12);
        assert!(p.take_needs_upload());
        assert!(!p.take_needs_upload());
    }

    #[test]
    fn play_without_media_is_refused() {
        let mut p = ClipPlayer::new("test");
        assert_eq!(p.play(), Err(PlaybackError::NoMedia));
        assert!(p.is_paused());
        p.advance(Duration::from_millis(500));
        assert_eq!(p.position(), Duration::ZERO);
    }

    #[test]
    fn pending_play_starts_when_media_attaches() {
        let mut p = ClipPlayer::new("test");
        assert_eq!(p.play(), Err(PlaybackError::NoMedia));
        p.attach_source(one_second_clip());
        assert!(!p.is_paused());
        p.advance(Duration::from_millis(300));
        assert_eq!(p.position(), Duration::from_millis(300));
    }

    #[test]
    fn pause_cancels_pending_play() {
        let mut p = ClipPlayer::new("test");
        let _ = p.play();
        p.pause();
        p.attach_source(one_second_clip());
        assert!(p.is_paused());
    }

    #[test]
    fn blocked_play_is_not_remembered() {
        let mut p = ClipPlayer::new("test").with_autoplay(AutoplayPolicy::Blocked);
        assert_eq!(p.play(), Err(PlaybackError::AutoplayBlocked));
        p.attach_source(one_second_clip());
        assert!(p.is_paused());
    }

    #[test]
    fn advance_scales_by_rate_and_tracks_frames() {
        let mut p = ClipPlayer::new("test");
        p.attach_source(one_second_clip());
        p.take_needs_upload();
        p.set_playback_rate(0.5);
        p.play().unwrap();
        p.advance(Duration::from_millis(400));
        assert_eq!(p.position(), Duration::from_millis(200));
        assert_eq!(p.current_frame(), 2);
        assert!(p.take_needs_upload());
    }

    #[test]
    fn non_looping_clamps_and_ends() {
        let mut p = ClipPlayer::new("test");
        p.attach_source(one_second_clip());
        let (_, rx) = p.subscribe();
        p.play().unwrap();
        p.advance(Duration::from_millis(1300));
        assert_eq!(p.position(), Duration::from_secs(1));
        assert!(p.is_paused());
        assert!(p.is_ended());
        assert_eq!(rx.try_recv(), Ok(MediaEvent::Ended));
    }

    #[test]
    fn looping_wraps() {
        let mut p = ClipPlayer::new("test");
        p.attach_source(one_second_clip());
        p.set_looping(true);
        p.play().unwrap();
        p.advance(Duration::from_millis(1250));
        assert_eq!(p.position(), Duration::from_millis(250));
        assert!(!p.is_paused());
        assert!(!p.is_ended());
    }

    #[test]
    fn play_after_end_restarts() {
        let mut p = ClipPlayer::new("test");
        p.attach_source(one_second_clip());
        p.play().unwrap();
        p.advance(Duration::from_secs(2));
        assert!(p.is_ended());
        p.play().unwrap();
        assert_eq!(p.position(), Duration::ZERO);
        assert!(!p.is_paused());
    }

    #[test]
    fn autoplay_policies() {
        let mut blocked = ClipPlayer::new("b").with_autoplay(AutoplayPolicy::Blocked);
        blocked.prepare_inline(true);
        assert_eq!(blocked.play(), Err(PlaybackError::AutoplayBlocked));
        assert!(blocked.is_paused());

        let mut muted_only = ClipPlayer::new("m").with_autoplay(AutoplayPolicy::MutedOnly);
        muted_only.attach_source(one_second_clip());
        assert_eq!(muted_only.play(), Err(PlaybackError::AutoplayBlocked));
        muted_only.prepare_inline(true);
        assert_eq!(muted_only.play(), Ok(()));
    }

    #[test]
    fn unsubscribe_removes_listener() {
        let mut p = ClipPlayer::new("test");
        let (a, _rx_a) = p.subscribe();
        let (_b, _rx_b) = p.subscribe();
        assert_eq!(p.listener_count(), 2);
        p.unsubscribe(a);
        assert_eq!(p.listener_count(), 1);
    }

    #[test]
    fn dropped_receivers_are_pruned_on_emit() {
        let mut p = ClipPlayer::new("test");
        let (_, rx) = p.subscribe();
        drop(rx);
        p.attach_source(one_second_clip());
        assert_eq!(p.listener_count(), 0);
    }

    #[test]
    fn opacity_is_clamped() {
        let mut p = ClipPlayer::new("test");
        p.set_opacity(1.5);
        assert!((p.opacity() - 1.0).abs() < 1e-6);
        p.set_opacity(-0.2);
        assert!(p.opacity().abs() < 1e-6);
    }
}
