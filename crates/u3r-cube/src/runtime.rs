use std::path::PathBuf;

use anyhow::{Context, Result};
use ouroboros::self_referencing;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::clock::FrameClock;
use crate::gpu::{Gpu, GpuInit, SurfaceErrorAction};
use crate::scene::CubeScene;

/// Window and scene configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    /// Camera orbit speed in radians per second.
    pub orbit_speed: f32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let res = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("res");
        Self {
            title: "Cube".to_string(),
            initial_size: LogicalSize::new(1024.0, 768.0),
            vertex_shader: res.join("shader.vs.wgsl"),
            fragment_shader: res.join("shader.fs.wgsl"),
            orbit_speed: 0.6,
        }
    }
}

pub struct Runtime;

impl Runtime {
    pub fn run(config: RuntimeConfig, gpu_init: GpuInit) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        state.failure.map_or(Ok(()), Err)
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

/// A window together with the scene drawn into it.
///
/// `scene` is declared first so its device resources drop before the surface.
struct Running {
    scene: CubeScene,
    entry: WindowEntry,
}

struct AppState {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    running: Option<Running>,
    failure: Option<anyhow::Error>,
}

impl AppState {
    fn new(config: RuntimeConfig, gpu_init: GpuInit) -> Self {
        Self {
            config,
            gpu_init,
            running: None,
            failure: None,
        }
    }

    fn start(&self, event_loop: &ActiveEventLoop) -> Result<Running> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let entry = WindowEntryTryBuilder {
            clock: FrameClock::default(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed for window")?;

        let scene = entry.with_gpu(|gpu| {
            CubeScene::new(
                gpu,
                &self.config.vertex_shader,
                &self.config.fragment_shader,
                self.config.orbit_speed,
            )
        })?;

        Ok(Running { scene, entry })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failure = Some(err);
        self.running = None;
        event_loop.exit();
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }

        match self.start(event_loop) {
            Ok(running) => {
                running.entry.with_window(|w| w.request_redraw());
                self.running = Some(running);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw: the camera moves every frame.
        if let Some(running) = &self.running {
            running.entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(running) = self.running.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                self.running = None;
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                running.entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                running.entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = running.entry.with_window(|w| w.inner_size());
                running.entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                running.entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::RedrawRequested => {
                let scene = &running.scene;
                let action = running.entry.with_mut(|fields| {
                    let size = fields.gpu.size();
                    if size.width == 0 || size.height == 0 {
                        return None;
                    }

                    match fields.gpu.begin_frame() {
                        Ok(frame) => {
                            let time = fields.clock.tick();
                            scene.draw(fields.gpu, &frame, time);
                            fields.gpu.present(frame);
                            None
                        }
                        Err(err) => {
                            log::warn!("surface error: {err}");
                            let action = fields.gpu.handle_surface_error(err);
                            if action == SurfaceErrorAction::Reconfigured {
                                fields.clock.reset();
                            }
                            Some(action)
                        }
                    }
                });

                if action == Some(SurfaceErrorAction::Fatal) {
                    self.fail(event_loop, anyhow::anyhow!("fatal surface error"));
                }
            }

            _ => {}
        }
    }
}
