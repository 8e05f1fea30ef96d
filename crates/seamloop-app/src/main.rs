mod app;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use app::{App, LaunchOptions};

const USAGE: &str = "usage: seamloop [CLIP] [--reduced-motion] [--settings PATH]";

struct SeamloopApp {
    app: Option<App>,
    window: Option<Arc<Window>>,
    options: LaunchOptions,
}

impl SeamloopApp {
    fn new(options: LaunchOptions) -> Self {
        Self {
            app: None,
            window: None,
            options,
        }
    }
}

impl ApplicationHandler for SeamloopApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title("seamloop")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = Arc::new(event_loop.create_window(attrs).expect("Failed to create window"));

        // Center window on primary monitor
        if let Some(monitor) = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
        {
            let monitor_size = monitor.size();
            let window_size = window.outer_size();
            let monitor_pos = monitor.position();
            let x = (monitor_size.width.saturating_sub(window_size.width)) / 2;
            let y = (monitor_size.height.saturating_sub(window_size.height)) / 2;
            window.set_outer_position(winit::dpi::PhysicalPosition::new(
                monitor_pos.x + x as i32,
                monitor_pos.y + y as i32,
            ));
        }

        self.window = Some(window.clone());

        match App::new(window, self.options.clone()) {
            Ok(app) => {
                app.window.request_redraw();
                self.app = Some(app);
                log::info!("seamloop initialized");
            }
            Err(e) => {
                log::error!("Failed to initialize app: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(app) = self.app.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                app.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                app.resize(size.width, size.height);
            }
            WindowEvent::CursorMoved { position, .. } => {
                app.set_pointer(Some((position.x as f32, position.y as f32)));
            }
            WindowEvent::CursorLeft { .. } => {
                app.set_pointer(None);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => match key {
                KeyCode::Escape => {
                    app.shutdown();
                    event_loop.exit();
                }
                KeyCode::KeyF => {
                    let window = &app.window;
                    if window.fullscreen().is_some() {
                        window.set_fullscreen(None);
                    } else {
                        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                    }
                }
                _ => {}
            },
            WindowEvent::RedrawRequested => {
                app.update();

                match app.render() {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        app.gpu.reconfigure();
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of GPU memory");
                        app.shutdown();
                        event_loop.exit();
                    }
                    Err(e) => {
                        log::warn!("Surface error: {e}");
                    }
                }

                // Clips keep playing between controller frames
                app.window.request_redraw();
            }
            _ => {}
        }
    }
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<LaunchOptions> {
    let mut options = LaunchOptions::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--reduced-motion" => options.reduced_motion = true,
            "--settings" => {
                let Some(path) = args.next() else {
                    bail!("--settings needs a path\n{USAGE}");
                };
                options.settings_path = Some(PathBuf::from(path));
            }
            "-h" | "--help" => bail!(USAGE),
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
            clip => {
                if options.clip.is_some() {
                    bail!("only one clip can be given\n{USAGE}");
                }
                options.clip = Some(PathBuf::from(clip));
            }
        }
    }
    Ok(options)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let options = parse_args(std::env::args().skip(1))?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(winit::event_loop::ControlFlow::Wait);

    let mut app = SeamloopApp::new(options);
    event_loop.run_app(&mut app)?;

    Ok(())
}
