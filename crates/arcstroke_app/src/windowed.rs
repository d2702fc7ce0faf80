//! Interactive viewer
//!
//! Draws the batch into a window surface every redraw. Resizing reconfigures
//! the surface; the next draw picks up the new resolution. A left click logs
//! the topmost segment under the cursor.

use std::sync::Arc;

use anyhow::{Context, Result};
use arcstroke_core::{PathBatch, StrokeStyle};
use arcstroke_gpu::{GpuContext, PathRenderer, RenderTarget, RendererConfig};
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

pub struct ViewerOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub style: StrokeStyle,
    pub clear_color: wgpu::Color,
}

struct ViewerState {
    // Dropped before the window
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    renderer: PathRenderer,
    ctx: GpuContext,
    window: Arc<Window>,
}

impl ViewerState {
    fn new(window: Arc<Window>, options: &ViewerOptions, batch: &PathBatch) -> Result<Self> {
        let config = RendererConfig {
            clear_color: options.clear_color,
            ..Default::default()
        };
        let (ctx, surface) = pollster::block_on(GpuContext::with_surface(window.clone(), config))
            .context("Failed to create GPU context")?;

        let size = window.inner_size();
        let surface_config = ctx.surface_config(size.width, size.height);
        surface.configure(ctx.device(), &surface_config);

        let mut renderer = PathRenderer::new(&ctx)?;
        renderer.set_style(options.style);
        renderer.set_data(batch)?;

        Ok(Self {
            surface,
            surface_config,
            renderer,
            ctx,
            window,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.surface_config = self.ctx.surface_config(size.width, size.height);
        self.surface.configure(self.ctx.device(), &self.surface_config);
        tracing::debug!("Surface resized to {}x{}", size.width, size.height);
    }

    fn redraw(&mut self) -> Result<()> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(self.ctx.device(), &self.surface_config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("Surface timeout, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(e).context("Failed to acquire surface texture"),
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let target = RenderTarget::new(&view, self.surface_config.width, self.surface_config.height);
        self.renderer.draw(&target);
        frame.present();
        Ok(())
    }
}

struct Viewer {
    options: ViewerOptions,
    batch: PathBatch,
    state: Option<ViewerState>,
    cursor: Option<PhysicalPosition<f64>>,
    error: Option<anyhow::Error>,
}

impl Viewer {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn report_hit(&self) {
        let Some(cursor) = self.cursor else {
            return;
        };
        let point = [cursor.x as f32, cursor.y as f32];
        match self.batch.hit_test(point, &self.options.style) {
            Some(index) => {
                let segment = &self.batch.segments()[index];
                tracing::info!(
                    "Hit segment {} ({:?}) at ({:.1}, {:.1})",
                    index,
                    segment.kind,
                    point[0],
                    point[1]
                );
            }
            None => tracing::info!("No segment at ({:.1}, {:.1})", point[0], point[1]),
        }
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(self.options.title.clone())
            .with_inner_size(PhysicalSize::new(self.options.width, self.options.height))
            .with_resizable(true);
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        match ViewerState::new(window, &self.options, &self.batch) {
            Ok(state) => {
                state.window.request_redraw();
                self.state = Some(state);
                event_loop.set_control_flow(ControlFlow::Wait);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if state.window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                state.resize(size);
                state.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = state.redraw() {
                    self.fail(event_loop, e);
                }
            }
            WindowEvent::CursorMoved { position, .. } => self.cursor = Some(position),
            WindowEvent::CursorLeft { .. } => self.cursor = None,
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.report_hit(),
            _ => {}
        }
    }
}

/// Open a window and draw `batch` until it is closed
pub fn run(batch: PathBatch, options: ViewerOptions) -> Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut viewer = Viewer {
        options,
        batch,
        state: None,
        cursor: None,
        error: None,
    };
    event_loop.run_app(&mut viewer)?;

    match viewer.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
