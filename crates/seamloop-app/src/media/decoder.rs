use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use super::types::DecodedFrame;

/// GIF delays below this are clamped; browsers do the same.
const MIN_FRAME_DELAY_MS: u32 = 20;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode {kind}: {message}")]
    Decode { kind: &'static str, message: String },
    #[error("{0} has no frames")]
    NoFrames(&'static str),
    #[error("video playback requires the `video` feature")]
    VideoUnsupported,
    #[error("video probe failed: {0}")]
    Probe(String),
    #[error("clip is {secs:.1}s, longer than the {max:.0}s pre-decode limit")]
    TooLong { secs: f64, max: f64 },
}

impl MediaError {
    fn decode(kind: &'static str, err: impl std::fmt::Display) -> Self {
        MediaError::Decode {
            kind,
            message: err.to_string(),
        }
    }
}

/// Decoded clip: a single still or a pre-decoded frame sequence.
#[derive(Debug)]
pub enum MediaSource {
    Static(DecodedFrame),
    /// Frames plus per-frame display time in milliseconds.
    Animated {
        frames: Vec<DecodedFrame>,
        delays_ms: Vec<u32>,
    },
}

impl MediaSource {
    pub fn frame_count(&self) -> usize {
        match self {
            MediaSource::Static(_) => 1,
            MediaSource::Animated { frames, .. } => frames.len(),
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, MediaSource::Animated { .. })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            MediaSource::Static(f) => (f.width, f.height),
            MediaSource::Animated { frames, .. } => {
                frames.first().map_or((1, 1), |f| (f.width, f.height))
            }
        }
    }

    /// Total play time. Stills have none.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            MediaSource::Static(_) => None,
            MediaSource::Animated { delays_ms, .. } => Some(Duration::from_millis(
                delays_ms.iter().map(|&d| u64::from(d)).sum(),
            )),
        }
    }

    /// Index of the frame on screen at `position`. Past the end maps to the last frame.
    pub fn frame_index_at(&self, position: Duration) -> usize {
        let MediaSource::Animated { delays_ms, .. } = self else {
            return 0;
        };
        let target_ms = position.as_millis();
        let mut accum: u128 = 0;
        for (i, &d) in delays_ms.iter().enumerate() {
            accum += u128::from(d);
            if accum > target_ms {
                return i;
            }
        }
        delays_ms.len().saturating_sub(1)
    }

    pub fn frame(&self, index: usize) -> &DecodedFrame {
        match self {
            MediaSource::Static(f) => f,
            MediaSource::Animated { frames, .. } => &frames[index.min(frames.len() - 1)],
        }
    }
}

/// Load a clip from disk, picking the decoder by extension.
pub fn load_media(path: &Path) -> Result<MediaSource, MediaError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "gif" => load_gif(path),
        "webp" => load_webp(path),
        "mp4" | "webm" | "mov" | "mkv" | "m4v" => load_video(path),
        _ => load_static_image(path),
    }
}

#[cfg(feature = "video")]
fn load_video(path: &Path) -> Result<MediaSource, MediaError> {
    use super::video;

    if !video::ffmpeg_available() {
        return Err(MediaError::Probe("ffprobe not found on PATH".to_string()));
    }
    let meta = video::probe_video(path)?;
    if meta.duration_secs > video::MAX_PREDECODE_SECS {
        return Err(MediaError::TooLong {
            secs: meta.duration_secs,
            max: video::MAX_PREDECODE_SECS,
        });
    }
    let (frames, delays_ms) = video::decode_all_frames(path, &meta)?;
    Ok(MediaSource::Animated { frames, delays_ms })
}

#[cfg(not(feature = "video"))]
fn load_video(_path: &Path) -> Result<MediaSource, MediaError> {
    Err(MediaError::VideoUnsupported)
}

fn open(path: &Path) -> Result<File, MediaError> {
    File::open(path).map_err(|source| MediaError::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn load_static_image(path: &Path) -> Result<MediaSource, MediaError> {
    let img = image::open(path).map_err(|e| MediaError::decode("image", e))?;
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();

    Ok(MediaSource::Static(DecodedFrame {
        data: rgba.into_raw(),
        width: w,
        height: h,
    }))
}

/// Pre-decode every GIF frame, compositing partial frames onto a running canvas.
fn load_gif(path: &Path) -> Result<MediaSource, MediaError> {
    let file = open(path)?;
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);
    let mut reader = options
        .read_info(file)
        .map_err(|e| MediaError::decode("gif", e))?;

    let width = u32::from(reader.width());
    let height = u32::from(reader.height());

    let mut frames = Vec::new();
    let mut delays_ms = Vec::new();
    let mut canvas = vec![0u8; (width * height * 4) as usize];

    while let Some(frame) = reader
        .read_next_frame()
        .map_err(|e| MediaError::decode("gif", e))?
    {
        // GIF delay is in centiseconds
        let delay = u32::from(frame.delay) * 10;
        delays_ms.push(delay.max(MIN_FRAME_DELAY_MS));

        let fx = u32::from(frame.left);
        let fy = u32::from(frame.top);
        let fw = u32::from(frame.width);
        let fh = u32::from(frame.height);

        for y in 0..fh {
            for x in 0..fw {
                let src_idx = ((y * fw + x) * 4) as usize;
                let dst_x = fx + x;
                let dst_y = fy + y;
                if dst_x < width && dst_y < height {
                    let dst_idx = ((dst_y * width + dst_x) * 4) as usize;
                    let src = &frame.buffer[src_idx..src_idx + 4];
                    // Transparent pixels keep the previous frame's content
                    if src[3] > 0 {
                        canvas[dst_idx..dst_idx + 4].copy_from_slice(src);
                    }
                }
            }
        }

        frames.push(DecodedFrame {
            data: canvas.clone(),
            width,
            height,
        });
    }

    if frames.is_empty() {
        return Err(MediaError::NoFrames("gif"));
    }

    log::info!("Loaded GIF: {}x{}, {} frames", width, height, frames.len());

    Ok(MediaSource::Animated { frames, delays_ms })
}

/// Animated WebP via `image-webp`; stills go through the `image` crate.
fn load_webp(path: &Path) -> Result<MediaSource, MediaError> {
    let reader = BufReader::new(open(path)?);
    let mut decoder =
        image_webp::WebPDecoder::new(reader).map_err(|e| MediaError::decode("webp", e))?;

    if !decoder.is_animated() {
        return load_static_image(path);
    }

    let (width, height) = decoder.dimensions();
    let has_alpha = decoder.has_alpha();
    let buf_len = decoder
        .output_buffer_size()
        .ok_or_else(|| MediaError::decode("webp", "image too large"))?;
    let mut buf = vec![0u8; buf_len];

    let count = decoder.num_frames() as usize;
    let mut frames = Vec::with_capacity(count);
    let mut delays_ms = Vec::with_capacity(count);

    for _ in 0..count {
        let delay = decoder
            .read_frame(&mut buf)
            .map_err(|e| MediaError::decode("webp", e))?;
        let data = if has_alpha {
            buf.clone()
        } else {
            rgb_to_rgba(&buf)
        };
        frames.push(DecodedFrame {
            data,
            width,
            height,
        });
        delays_ms.push(delay.max(MIN_FRAME_DELAY_MS));
    }

    if frames.is_empty() {
        return Err(MediaError::NoFrames("webp"));
    }

    log::info!("Loaded WebP: {}x{}, {} frames", width, height, frames.len());

    Ok(MediaSource::Animated { frames, delays_ms })
}

fn rgb_to_rgba(rgb: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgb.len() / 3 * 4);
    for px in rgb.chunks_exact(3) {
        out.extend_from_slice(px);
        out.push(255);
    }
    out
}
