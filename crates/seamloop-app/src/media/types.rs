use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A decoded frame ready for GPU upload.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub data: Vec<u8>, // RGBA8
    pub width: u32,
    pub height: u32,
}

/// How the host treats a request to start playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoplayPolicy {
    /// Any start request succeeds.
    #[default]
    Allowed,
    /// Only muted playback may start without a user gesture.
    MutedOnly,
    /// Every start request is refused.
    Blocked,
}

/// Transport state for a clip player.
#[derive(Debug, Clone)]
pub struct TransportState {
    pub playing: bool,
    pub looping: bool,
    pub muted: bool,
    /// Plays inside its layer, never takes over the display.
    pub inline: bool,
    pub rate: f64,
    pub position: Duration,
    /// Unknown until metadata loads.
    pub duration: Option<Duration>,
    /// Set when a non-looping clip runs out; cleared by seek or play.
    pub ended: bool,
    /// `play()` was called and not since paused. Survives a missing source,
    /// so playback begins once media is attached.
    pub play_requested: bool,
}

impl Default for TransportState {
    fn default() -> Self {
        Self {
            playing: false,
            looping: false,
            muted: false,
            inline: false,
            rate: 1.0,
            position: Duration::ZERO,
            duration: None,
            ended: false,
            play_requested: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_state_defaults() {
        let t = TransportState::default();
        assert!(!t.playing);
        assert!(!t.looping);
        assert!(!t.muted);
        assert!((t.rate - 1.0).abs() < 1e-10);
        assert_eq!(t.position, Duration::ZERO);
        assert!(t.duration.is_none());
        assert!(!t.ended);
        assert!(!t.play_requested);
    }

    #[test]
    fn autoplay_policy_serde_names() {
        let json = serde_json::to_string(&AutoplayPolicy::MutedOnly).unwrap();
        assert_eq!(json, "\"muted_only\"");
        let back: AutoplayPolicy = serde_json::from_str("\"blocked\"").unwrap();
        assert_eq!(back, AutoplayPolicy::Blocked);
    }

    #[test]
    fn decoded_frame_constructable() {
        let frame = DecodedFrame {
            data: vec![255, 0, 0, 255],
            width: 1,
            height: 1,
        };
        assert_eq!(frame.data.len(), 4);
        assert_eq!(frame.width, 1);
    }
}
