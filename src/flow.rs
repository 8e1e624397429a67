//! Application shell and event loop.
//!
//! This module hosts the single viewer window, drives the render loop and
//! feeds the [`Viewer`] with input and the asynchronously loaded model.
//!
//! # Lifecycle Flow
//!
//! The event loop follows this pattern each iteration:
//! 1. Collect window events (cursor, mouse buttons, wheel, resize)
//! 2. Forward them to the camera controller and the viewer
//! 3. On redraw: update the camera, pick and highlight, render, spin the model
//! 4. Once the iteration is done, check the [`RunFlag`] and request the next frame
//!
//! The model is loaded on a tokio runtime and handed back to the loop as a
//! [`ViewerEvent::ModelLoaded`] user event, so the viewer is only touched on
//! the loop thread.

use std::{
    fmt::Debug,
    iter,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    config::ViewerConfig,
    context::Context,
    render::{GpuScene, NodeStyle, draw_scene},
    resources::{LoadedModel, load_model},
    viewer::{FrameOutcome, Viewer},
};

/// Events delivered to the event loop from outside of it.
pub enum ViewerEvent {
    ModelLoaded(anyhow::Result<LoadedModel>),
}

impl Debug for ViewerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModelLoaded(Ok(model)) => f
                .debug_tuple("ModelLoaded")
                .field(&model.graph.len())
                .finish(),
            Self::ModelLoaded(Err(e)) => f.debug_tuple("ModelLoaded").field(e).finish(),
        }
    }
}

/// Cancellation flag of the render loop. Clones share the same flag.
#[derive(Clone, Debug)]
pub struct RunFlag(Arc<AtomicBool>);

impl RunFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// GPU context plus the GPU mirror of the scene.
pub struct AppState {
    pub(crate) ctx: Context,
    gpu_scene: GpuScene,
    is_surface_configured: bool,
    title: String,
}

impl AppState {
    async fn new(window: Arc<Window>, config: &ViewerConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window, config).await?;
        Ok(Self {
            ctx,
            gpu_scene: GpuScene::new(),
            is_surface_configured: false,
            title: config.title.clone(),
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.ctx.resize(width, height) {
            self.is_surface_configured = true;
        }
    }

    /// Runs one frame: pick, upload, draw, then spin the model.
    fn render(
        &mut self,
        viewer: &mut Viewer,
        style: &NodeStyle,
        dt: instant::Duration,
    ) -> Result<FrameOutcome, wgpu::SurfaceError> {
        // Update the camera
        self.ctx
            .camera
            .controller
            .update(&mut self.ctx.camera.camera, dt);
        self.ctx
            .camera
            .write_to_buffer(&self.ctx.queue, &self.ctx.projection);

        let outcome = viewer.begin_frame(&self.ctx.camera.camera, &self.ctx.projection);
        let drawn = self.draw(viewer, style);
        viewer.end_frame(outcome);
        drawn.map(|_| outcome)
    }

    fn draw(&mut self, viewer: &Viewer, style: &NodeStyle) -> Result<(), wgpu::SurfaceError> {
        let ctx = &mut self.ctx;
        ctx.light.write_to_buffer(&ctx.queue, viewer.light());
        self.gpu_scene
            .sync(&ctx.device, &ctx.node_layout, viewer.graph());
        self.gpu_scene
            .write_uniforms(&ctx.queue, viewer.graph(), style);

        let popup = viewer.popup();
        let size = ctx.surface_size();
        ctx.overlay
            .update(&ctx.device, &ctx.queue, popup.as_ref(), size);
        #[cfg(not(feature = "ui"))]
        {
            let title = match &popup {
                Some(popup) => format!("{} - {}", self.title, popup.label),
                None => self.title.clone(),
            };
            if ctx.window.title() != title {
                ctx.window.set_title(&title);
            }
        }

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            draw_scene(ctx, &mut render_pass, self.gpu_scene.render(viewer.graph()));
        }
        if ctx.overlay.is_visible() {
            let mut overlay_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Overlay Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            ctx.overlay.draw(&mut overlay_pass);
        }

        ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<ViewerEvent>,
    config: ViewerConfig,
    style: NodeStyle,
    viewer: Viewer,
    state: Option<AppState>,
    run_flag: RunFlag,
    load_started: bool,
    error: Option<anyhow::Error>,
    last_time: Instant,
}

impl App {
    fn new(
        event_loop: &EventLoop<ViewerEvent>,
        config: ViewerConfig,
        run_flag: RunFlag,
    ) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            async_runtime,
            proxy,
            style: NodeStyle::from(&config),
            viewer: Viewer::new(&config),
            config,
            state: None,
            run_flag,
            load_started: false,
            error: None,
            last_time: Instant::now(),
        })
    }

    /// Issues the asynchronous model load. Runs once per process.
    fn start_loading(&mut self) {
        if self.load_started {
            return;
        }
        self.load_started = true;
        let path = self.config.asset_path();
        let proxy = self.proxy.clone();
        log::info!("Loading {}", path.display());
        self.async_runtime.spawn(async move {
            let result = load_model(&path, |progress| log::info!("{}", progress)).await;
            if proxy.send_event(ViewerEvent::ModelLoaded(result)).is_err() {
                log::warn!("The event loop closed before the model finished loading");
            }
        });
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error = Some(error);
        self.run_flag.cancel();
        event_loop.exit();
    }

    fn close_window(&mut self, event_loop: &ActiveEventLoop) {
        if cfg!(target_os = "macos") {
            // Stay resident without a window until the application is resumed
            log::info!("Window closed, staying resident");
            self.state = None;
        } else {
            self.run_flag.cancel();
            event_loop.exit();
        }
    }
}

impl ApplicationHandler<ViewerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let (width, height) = self.config.window_size;
        let window_attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(width, height))
            .with_resizable(true);

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };
        let init = AppState::new(window, &self.config);
        match self.async_runtime.block_on(init) {
            Ok(mut state) => {
                let size = state.ctx.window.inner_size();
                state.resize(size.width, size.height);
                state.ctx.window.request_redraw();
                self.state = Some(state);
            }
            Err(e) => return self.fail(event_loop, e.context("Cannot create the main context")),
        }
        self.last_time = Instant::now();
        self.start_loading();
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::ModelLoaded(result) => {
                self.viewer.on_model_loaded(result);
                if let Some(state) = &self.state {
                    state.ctx.window.request_redraw();
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        // general stuff
        state.ctx.camera.controller.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => self.close_window(event_loop),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::CursorMoved { position, .. } => {
                self.viewer
                    .on_cursor_moved(position, &state.ctx.surface_rect());
            }
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                match state.render(&mut self.viewer, &self.style, dt) {
                    Ok(_) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if !self.run_flag.is_running() {
            event_loop.exit();
            return;
        }
        if let Some(state) = &self.state {
            state.ctx.window.request_redraw();
        }
    }
}

/// Opens the viewer window and runs until it is closed.
pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    run_until(config, RunFlag::new())
}

/// Like [`run`], but also stops once `run_flag` is cancelled.
pub fn run_until(config: ViewerConfig, run_flag: RunFlag) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    #[cfg(all(feature = "integration-tests", target_os = "linux"))]
    let event_loop: EventLoop<ViewerEvent> = {
        use winit::platform::wayland::EventLoopBuilderExtWayland;

        EventLoop::with_user_event().with_any_thread(true).build()?
    };

    #[cfg(all(feature = "integration-tests", target_os = "windows"))]
    let event_loop: EventLoop<ViewerEvent> = {
        use winit::platform::windows::EventLoopBuilderExtWindows;

        EventLoop::with_user_event().with_any_thread(true).build()?
    };

    #[cfg(not(all(
        feature = "integration-tests",
        any(target_os = "linux", target_os = "windows")
    )))]
    let event_loop: EventLoop<ViewerEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, config, run_flag)?;

    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
