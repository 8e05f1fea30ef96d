use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::Receiver;
use winit::window::Window;

use seamloop_app::accessibility::ReducedMotion;
use seamloop_app::crossfade::{CrossfadeController, FrameRequestId, FrameScheduler, SlotId};
use seamloop_app::gpu::{GpuContext, LayerCompositor, compute_layer_uniforms};
use seamloop_app::media::player::ClipPlayer;
use seamloop_app::media::{LoadedClip, MediaTexture, spawn_load};
use seamloop_app::parallax::{ElementBounds, PointerTilt, Transform};
use seamloop_app::settings::{SettingsConfig, SettingsWatcher};

/// What the command line asked for.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LaunchOptions {
    pub clip: Option<PathBuf>,
    pub reduced_motion: bool,
    pub settings_path: Option<PathBuf>,
}

/// Turns controller frame requests into window redraws.
///
/// One redraw carries at most one controller frame; a cancelled id is simply
/// forgotten, so the redraw it already queued dispatches nothing.
pub struct RedrawScheduler {
    window: Arc<Window>,
    next_id: u64,
    pending: Option<FrameRequestId>,
}

impl RedrawScheduler {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            next_id: 0,
            pending: None,
        }
    }

    pub fn take_pending(&mut self) -> Option<FrameRequestId> {
        self.pending.take()
    }
}

impl FrameScheduler for RedrawScheduler {
    fn request_frame(&mut self) -> FrameRequestId {
        self.next_id += 1;
        let id = FrameRequestId(self.next_id);
        self.pending = Some(id);
        self.window.request_redraw();
        id
    }

    fn cancel_frame(&mut self, id: FrameRequestId) {
        if self.pending == Some(id) {
            self.pending = None;
        }
    }
}

pub struct App {
    pub window: Arc<Window>,
    pub gpu: GpuContext,
    compositor: LayerCompositor,
    textures: [MediaTexture; 2],
    controller: CrossfadeController<ClipPlayer>,
    scheduler: RedrawScheduler,
    clip_rx: Option<Receiver<LoadedClip>>,
    settings_watcher: Option<SettingsWatcher>,
    tilt: PointerTilt,
    reduced_motion: bool,
    pointer: Option<(f32, f32)>,
    started: Instant,
    last_frame: Duration,
}

impl App {
    pub fn new(window: Arc<Window>, options: LaunchOptions) -> Result<Self> {
        let gpu = GpuContext::new(window.clone())?;
        let compositor = LayerCompositor::new(&gpu.device, gpu.format);
        let textures = [
            MediaTexture::placeholder(&gpu.device, &gpu.queue, "slot_a"),
            MediaTexture::placeholder(&gpu.device, &gpu.queue, "slot_b"),
        ];

        let settings_path = options
            .settings_path
            .clone()
            .or_else(SettingsConfig::default_path);
        let settings = load_settings(settings_path.as_deref());

        // Read once; a running loop never switches modes
        let mut motion = ReducedMotion::detect();
        motion.set_override(settings.reduced_motion);
        if options.reduced_motion {
            motion.set_override(Some(true));
        }
        let reduced_motion = motion.should_reduce();

        let controller = CrossfadeController::new(
            ClipPlayer::new("A").with_autoplay(settings.autoplay),
            ClipPlayer::new("B").with_autoplay(settings.autoplay),
            settings.crossfade_config(reduced_motion),
        );

        let clip = options.clip.or_else(|| settings.clip.clone());
        let clip_rx = match &clip {
            Some(path) => {
                log::info!("Loading clip {}", path.display());
                Some(spawn_load(path))
            }
            None => {
                log::warn!("No clip given; pass a path or set \"clip\" in settings");
                None
            }
        };

        let settings_watcher = settings_path.as_deref().and_then(|path| {
            SettingsWatcher::new(path)
                .map_err(|e| log::warn!("Settings hot reload unavailable: {e:#}"))
                .ok()
        });

        let scheduler = RedrawScheduler::new(window.clone());

        Ok(Self {
            window,
            gpu,
            compositor,
            textures,
            controller,
            scheduler,
            clip_rx,
            settings_watcher,
            tilt: PointerTilt::from(&settings.pointer_tilt),
            reduced_motion,
            pointer: None,
            started: Instant::now(),
            last_frame: Duration::ZERO,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }

    pub fn set_pointer(&mut self, pointer: Option<(f32, f32)>) {
        self.pointer = pointer;
    }

    /// Per-redraw update: pick up background work, move the playheads, then
    /// hand the controller its frame if one was requested.
    pub fn update(&mut self) {
        let now = self.started.elapsed();
        let dt = now.saturating_sub(self.last_frame);
        self.last_frame = now;

        self.poll_clip();
        self.poll_settings();

        for player in self.controller.slots_mut() {
            player.advance(dt);
        }

        if let Some(id) = self.scheduler.take_pending() {
            self.controller.on_frame(id, now, &mut self.scheduler);
        }

        self.upload_frames();
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.gpu.surface.get_current_texture()?;
        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            self.gpu
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("seamloop-encoder"),
                });

        let media = &self.textures[SlotId::A.index()];
        let uniforms = compute_layer_uniforms(
            (media.width, media.height),
            self.gpu.size(),
            &self.background_transform(),
            self.overscan_px(),
            self.controller.opacities(),
        );

        self.compositor.render(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &surface_view,
            &self.textures[SlotId::A.index()].view,
            &self.textures[SlotId::B.index()].view,
            &uniforms,
        );

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Stop the loop: cancels the outstanding frame and drops media listeners.
    pub fn shutdown(&mut self) {
        self.controller.stop(&mut self.scheduler);
    }

    fn poll_clip(&mut self) {
        let Some(rx) = &self.clip_rx else {
            return;
        };
        let Ok(loaded) = rx.try_recv() else {
            return;
        };
        self.clip_rx = None;

        let source = match loaded.source {
            Ok(source) => source,
            Err(e) => {
                log::error!("Failed to load {}: {e}", loaded.path.display());
                return;
            }
        };
        let (w, h) = source.dimensions();
        log::info!(
            "Loaded {} ({w}x{h}, {} frames, {:?})",
            loaded.path.display(),
            source.frame_count(),
            source.duration()
        );

        for id in SlotId::ALL {
            self.textures[id.index()] = MediaTexture::new(
                &self.gpu.device,
                &self.gpu.queue,
                source.frame(0),
                &format!("slot_{id}"),
            );
            self.controller.slot_mut(id).attach_source(source.clone());
        }
        self.controller.start(&mut self.scheduler);
    }

    fn poll_settings(&mut self) {
        let Some(watcher) = &self.settings_watcher else {
            return;
        };
        if !watcher.changed() {
            return;
        }
        match SettingsConfig::load_from(watcher.path()) {
            Ok(settings) => {
                self.controller
                    .reconfigure(settings.playback_rate, settings.fade_duration());
                self.tilt = PointerTilt::from(&settings.pointer_tilt);
                log::info!(
                    "Settings reloaded (rate {}, fade {:?})",
                    settings.playback_rate,
                    settings.fade_duration()
                );
            }
            Err(e) => log::warn!("Ignoring settings change: {e}"),
        }
    }

    fn upload_frames(&mut self) {
        for id in SlotId::ALL {
            let player = self.controller.slot_mut(id);
            if !player.take_needs_upload() {
                continue;
            }
            let Some(source) = player.source() else {
                continue;
            };
            let frame = source.frame(player.current_frame());
            self.textures[id.index()].upload(&self.gpu.queue, frame);
        }
    }

    fn background_transform(&self) -> Transform {
        if self.reduced_motion {
            return Transform::IDENTITY;
        }
        let Some(pointer) = self.pointer else {
            return Transform::IDENTITY;
        };
        let (w, h) = self.gpu.size();
        let bounds = ElementBounds::new(0.0, 0.0, w as f32, h as f32);
        self.tilt.transform(pointer, &bounds)
    }

    fn overscan_px(&self) -> f32 {
        if self.reduced_motion {
            0.0
        } else {
            self.tilt.shift_px.abs()
        }
    }
}

fn load_settings(path: Option<&Path>) -> SettingsConfig {
    match path {
        Some(path) => SettingsConfig::load_or_default(path),
        None => SettingsConfig::default(),
    }
}
