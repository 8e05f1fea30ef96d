//! Video pre-decode via ffmpeg subprocess (feature-gated behind `video`).
//!
//! - `ffprobe` reads dimensions, fps and duration synchronously
//! - `ffmpeg -f rawvideo -pix_fmt rgba` decodes every frame into memory in one pass
//! - The result is a `MediaSource::Animated`, so both slots share one decoded copy
//!   and seeking back to zero is free
//! - RAM cost: ~3.7MB per frame at 1280x720; keep hero loops short

use std::io::Read;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::OnceLock;

use super::decoder::MediaError;
use super::types::DecodedFrame;

/// Longest clip (seconds) we'll pre-decode.
pub const MAX_PREDECODE_SECS: f64 = 60.0;

/// Whether ffprobe is on PATH. Cached per process.
pub fn ffmpeg_available() -> bool {
    static AVAILABLE: OnceLock<bool> = OnceLock::new();
    *AVAILABLE.get_or_init(|| {
        Command::new("ffprobe")
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    })
}

#[derive(Debug, Clone)]
pub struct VideoMeta {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub duration_secs: f64,
}

pub fn probe_video(path: &Path) -> Result<VideoMeta, MediaError> {
    let output = Command::new("ffprobe")
        .args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| MediaError::Probe(format!("ffprobe failed to execute: {e}")))?;

    if !output.status.success() {
        return Err(MediaError::Probe(
            "ffprobe returned non-zero exit code".to_string(),
        ));
    }

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| MediaError::Probe(format!("bad ffprobe JSON: {e}")))?;

    parse_probe(&json)
}

fn parse_probe(json: &serde_json::Value) -> Result<VideoMeta, MediaError> {
    let missing = |what: &str| MediaError::Probe(format!("missing {what}"));

    let video_stream = json["streams"]
        .as_array()
        .ok_or_else(|| missing("streams"))?
        .iter()
        .find(|s| s["codec_type"].as_str() == Some("video"))
        .ok_or_else(|| missing("video stream"))?;

    let width = video_stream["width"].as_u64().ok_or_else(|| missing("width"))? as u32;
    let height = video_stream["height"].as_u64().ok_or_else(|| missing("height"))? as u32;

    let fps = parse_frame_rate(video_stream["r_frame_rate"].as_str().unwrap_or("30/1"));

    let duration_secs = json["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .or_else(|| {
            video_stream["duration"]
                .as_str()
                .and_then(|s| s.parse::<f64>().ok())
        })
        .unwrap_or(0.0);

    Ok(VideoMeta {
        width,
        height,
        fps,
        duration_secs,
    })
}

fn parse_frame_rate(rate: &str) -> f64 {
    if let Some((num, den)) = rate.split_once('/') {
        let n: f64 = num.parse().unwrap_or(30.0);
        let d: f64 = den.parse().unwrap_or(1.0);
        if d > 0.0 { n / d } else { 30.0 }
    } else {
        rate.parse().unwrap_or(30.0)
    }
}

/// Decode every frame with a single ffmpeg run.
/// Returns `(frames, delays_ms)` for `MediaSource::Animated`.
pub fn decode_all_frames(
    path: &Path,
    meta: &VideoMeta,
) -> Result<(Vec<DecodedFrame>, Vec<u32>), MediaError> {
    let frame_size = (meta.width as usize) * (meta.height as usize) * 4;
    let delay_ms = (1000.0 / meta.fps).round() as u32;

    let est_frames = (meta.duration_secs * meta.fps).ceil() as usize;
    log::info!(
        "Pre-decoding video: ~{} frames, ~{}MB RAM",
        est_frames,
        (est_frames * frame_size) / (1024 * 1024),
    );

    let mut child = Command::new("ffmpeg")
        .args(["-i"])
        .arg(path)
        .args([
            "-f", "rawvideo",
            "-pix_fmt", "rgba",
            "-s", &format!("{}x{}", meta.width, meta.height),
            "-v", "quiet",
            "pipe:1",
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| MediaError::decode_video(format!("failed to spawn ffmpeg: {e}")))?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| MediaError::decode_video("ffmpeg: no stdout pipe"))?;

    let mut frames = Vec::with_capacity(est_frames);
    let mut delays_ms = Vec::with_capacity(est_frames);
    let mut buf = vec![0u8; frame_size];

    // read_exact fails at EOF
    while stdout.read_exact(&mut buf).is_ok() {
        frames.push(DecodedFrame {
            data: buf.clone(),
            width: meta.width,
            height: meta.height,
        });
        delays_ms.push(delay_ms.max(1));
    }

    match child.wait() {
        Ok(status) => {
            if let Some(warning) = exit_warning(status, frames.len()) {
                log::warn!("{warning}");
            }
        }
        Err(e) => log::warn!("Failed to wait for ffmpeg: {e}"),
    }

    if frames.is_empty() {
        return Err(MediaError::NoFrames("video"));
    }

    log::info!(
        "Decoded {} video frames ({}MB)",
        frames.len(),
        (frames.len() * frame_size) / (1024 * 1024),
    );

    Ok((frames, delays_ms))
}

/// A non-zero exit after some frames means the clip was cut short.
fn exit_warning(status: ExitStatus, frames: usize) -> Option<String> {
    (!status.success()).then(|| format!("ffmpeg exited with {status} after {frames} frames"))
}

impl MediaError {
    fn decode_video(message: impl Into<String>) -> Self {
        MediaError::Decode {
            kind: "video",
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rate_fraction() {
        assert!((parse_frame_rate("30000/1001") - 29.97).abs() < 0.01);
        assert!((parse_frame_rate("25") - 25.0).abs() < 1e-9);
        assert!((parse_frame_rate("24/0") - 30.0).abs() < 1e-9);
        assert!((parse_frame_rate("junk") - 30.0).abs() < 1e-9);
    }

    #[test]
    fn probe_json_prefers_format_duration() {
        let json = serde_json::json!({
            "streams": [
                { "codec_type": "audio" },
                { "codec_type": "video", "width": 1920, "height": 1080,
                  "r_frame_rate": "24/1", "duration": "9.0" }
            ],
            "format": { "duration": "10.000" }
        });
        let meta = parse_probe(&json).unwrap();
        assert_eq!((meta.width, meta.height), (1920, 1080));
        assert!((meta.fps - 24.0).abs() < 1e-9);
        assert!((meta.duration_secs - 10.0).abs() < 1e-9);
    }

    #[cfg(unix)]
    #[test]
    fn failed_ffmpeg_exit_is_reported() {
        use std::os::unix::process::ExitStatusExt;

        assert!(exit_warning(ExitStatus::from_raw(0), 120).is_none());
        // Raw wait status: exit code 1
        let warning = exit_warning(ExitStatus::from_raw(1 << 8), 42).unwrap();
        assert!(warning.contains("after 42 frames"));
    }

    #[test]
    fn probe_json_without_video_stream_fails() {
        let json = serde_json::json!({ "streams": [ { "codec_type": "audio" } ] });
        assert!(matches!(parse_probe(&json), Err(MediaError::Probe(_))));
    }
}
