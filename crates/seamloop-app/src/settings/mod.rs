pub mod watcher;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crossfade::{CrossfadeConfig, DEFAULT_FADE_DURATION, DEFAULT_PLAYBACK_RATE};
use crate::media::types::AutoplayPolicy;
use crate::parallax::PointerTilt;

pub use watcher::SettingsWatcher;

const APP_DIR: &str = "seamloop";
const FILE_NAME: &str = "settings.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TiltSettings {
    pub max_degrees: f32,
    pub shift_px: f32,
}

impl Default for TiltSettings {
    fn default() -> Self {
        let tilt = PointerTilt::default();
        Self {
            max_degrees: tilt.max_degrees,
            shift_px: tilt.shift_px,
        }
    }
}

impl From<&TiltSettings> for PointerTilt {
    fn from(s: &TiltSettings) -> Self {
        PointerTilt {
            max_degrees: s.max_degrees,
            shift_px: s.shift_px,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SettingsConfig {
    pub version: u32,
    pub playback_rate: f64,
    pub fade_duration_ms: u64,
    /// Forces reduced motion on or off; `None` follows the desktop.
    pub reduced_motion: Option<bool>,
    /// Clip to loop when none is given on the command line.
    pub clip: Option<PathBuf>,
    pub autoplay: AutoplayPolicy,
    pub pointer_tilt: TiltSettings,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            version: 1,
            playback_rate: DEFAULT_PLAYBACK_RATE,
            fade_duration_ms: DEFAULT_FADE_DURATION.as_millis() as u64,
            reduced_motion: None,
            clip: None,
            autoplay: AutoplayPolicy::Allowed,
            pointer_tilt: TiltSettings::default(),
        }
    }
}

impl SettingsConfig {
    /// `<config dir>/seamloop/settings.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join(FILE_NAME))
    }

    /// Load `path`, falling back to defaults on any error. A missing file is
    /// created with the defaults so there is something to edit.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(settings) => {
                log::info!("Settings loaded from {}", path.display());
                settings
            }
            Err(SettingsError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                let settings = Self::default();
                settings.save_to(path);
                settings
            }
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = serde_json::from_str(&json)?;
        Ok(settings.sanitized())
    }

    /// Best-effort write; failures are logged.
    pub fn save_to(&self, path: &Path) {
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    log::warn!("Failed to save settings to {}: {e}", path.display());
                }
            }
            Err(e) => log::warn!("Failed to serialize settings: {e}"),
        }
    }

    pub fn fade_duration(&self) -> Duration {
        Duration::from_millis(self.fade_duration_ms)
    }

    /// Controller configuration for a session with the given motion preference.
    pub fn crossfade_config(&self, reduced_motion: bool) -> CrossfadeConfig {
        CrossfadeConfig {
            playback_rate: self.playback_rate,
            fade_duration: self.fade_duration(),
            reduced_motion,
        }
    }

    fn sanitized(mut self) -> Self {
        if !(self.playback_rate.is_finite() && self.playback_rate > 0.0) {
            log::warn!(
                "Ignoring playback_rate {}; using {}",
                self.playback_rate,
                DEFAULT_PLAYBACK_RATE
            );
            self.playback_rate = DEFAULT_PLAYBACK_RATE;
        }
        if !self.pointer_tilt.max_degrees.is_finite() || !self.pointer_tilt.shift_px.is_finite() {
            self.pointer_tilt = TiltSettings::default();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_crossfade_defaults() {
        let s = SettingsConfig::default();
        assert!((s.playback_rate - 0.75).abs() < 1e-12);
        assert_eq!(s.fade_duration(), Duration::from_millis(1400));
        assert!(s.reduced_motion.is_none());
        assert_eq!(s.autoplay, AutoplayPolicy::Allowed);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        std::fs::write(&path, r#"{ "fade_duration_ms": 900, "autoplay": "muted_only" }"#).unwrap();

        let s = SettingsConfig::load_from(&path).unwrap();
        assert_eq!(s.fade_duration(), Duration::from_millis(900));
        assert_eq!(s.autoplay, AutoplayPolicy::MutedOnly);
        assert!((s.playback_rate - 0.75).abs() < 1e-12);
        assert_eq!(s.pointer_tilt, TiltSettings::default());
    }

    #[test]
    fn bad_rate_is_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        std::fs::write(&path, r#"{ "playback_rate": -2.0 }"#).unwrap();
        let s = SettingsConfig::load_from(&path).unwrap();
        assert!((s.playback_rate - DEFAULT_PLAYBACK_RATE).abs() < 1e-12);
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(FILE_NAME);
        let s = SettingsConfig {
            playback_rate: 1.0,
            reduced_motion: Some(true),
            clip: Some(PathBuf::from("/srv/hero/harbor.mp4")),
            ..SettingsConfig::default()
        };
        s.save_to(&path);
        assert_eq!(SettingsConfig::load_from(&path).unwrap(), s);
    }

    #[test]
    fn errors_are_typed() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            SettingsConfig::load_from(&missing),
            Err(SettingsError::Io { .. })
        ));

        let broken = dir.path().join(FILE_NAME);
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            SettingsConfig::load_from(&broken),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        let s = SettingsConfig::load_or_default(&path);
        assert_eq!(s, SettingsConfig::default());
        assert!(path.exists());
        assert_eq!(SettingsConfig::load_from(&path).unwrap(), s);
    }

    #[test]
    fn broken_file_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        std::fs::write(&path, "{ oops").unwrap();
        assert_eq!(SettingsConfig::load_or_default(&path), SettingsConfig::default());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ oops");
    }

    #[test]
    fn crossfade_config_carries_motion_flag() {
        let cfg = SettingsConfig::default().crossfade_config(true);
        assert!(cfg.reduced_motion);
        assert_eq!(cfg.fade_duration, DEFAULT_FADE_DURATION);
    }
}
