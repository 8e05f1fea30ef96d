pub mod decoder;
pub mod player;
pub mod types;
#[cfg(feature = "video")]
pub mod video;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::Receiver;
use wgpu::{Device, Queue};

use decoder::{MediaError, MediaSource};
use types::DecodedFrame;

/// Result of a background clip decode.
pub struct LoadedClip {
    pub path: PathBuf,
    pub source: Result<Arc<MediaSource>, MediaError>,
}

/// Decode `path` on a worker thread. The receiver yields exactly one result.
pub fn spawn_load(path: &Path) -> Receiver<LoadedClip> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let path = path.to_path_buf();
    let spawned = thread::Builder::new()
        .name("clip-decode".to_string())
        .spawn({
            let tx = tx.clone();
            let path = path.clone();
            move || {
                let source = decoder::load_media(&path).map(Arc::new);
                let _ = tx.send(LoadedClip { path, source });
            }
        });
    if let Err(e) = spawned {
        log::error!("Failed to spawn decode thread: {e}");
        let _ = tx.send(LoadedClip {
            path: path.clone(),
            source: Err(MediaError::Open {
                path,
                source: e,
            }),
        });
    }
    rx
}

/// GPU texture one slot's frames are uploaded into.
pub struct MediaTexture {
    texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl MediaTexture {
    pub fn new(device: &Device, queue: &Queue, frame: &DecodedFrame, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: frame.width.max(1),
                height: frame.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            // sRGB for auto-conversion on sample
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let tex = Self {
            texture,
            view,
            width: frame.width.max(1),
            height: frame.height.max(1),
        };
        tex.upload(queue, frame);
        tex
    }

    /// 1x1 black stand-in used until a clip has decoded.
    pub fn placeholder(device: &Device, queue: &Queue, label: &str) -> Self {
        let black = DecodedFrame {
            data: vec![0, 0, 0, 255],
            width: 1,
            height: 1,
        };
        Self::new(device, queue, &black, label)
    }

    pub fn upload(&self, queue: &Queue, frame: &DecodedFrame) {
        if frame.width != self.width || frame.height != self.height {
            log::warn!(
                "Frame size {}x{} does not match texture {}x{}; skipping upload",
                frame.width,
                frame.height,
                self.width,
                self.height
            );
            return;
        }
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &frame.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.width * 4),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn background_load_reports_errors() {
        let rx = spawn_load(Path::new("/nonexistent/hero.gif"));
        let loaded = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(loaded.path, PathBuf::from("/nonexistent/hero.gif"));
        assert!(matches!(loaded.source, Err(MediaError::Open { .. })));
    }

    #[test]
    fn background_load_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poster.png");
        image::RgbaImage::from_pixel(3, 3, image::Rgba([0, 0, 255, 255]))
            .save(&path)
            .unwrap();

        let loaded = spawn_load(&path).recv_timeout(Duration::from_secs(5)).unwrap();
        let source = loaded.source.unwrap();
        assert_eq!(source.dimensions(), (3, 3));
    }
}
