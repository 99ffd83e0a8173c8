use std::any::Any;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Context as _, Result};
use log::debug;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::platform::pump_events::EventLoopExtPumpEvents;
use winit::window::{Window, WindowAttributes, WindowId};

use crate::traits::windowing::{WindowBackend, WindowDescriptor, WindowDimensions, WindowHandle};

use super::gpu_context::GpuContext;

/// Window events drained by the UI library once per frame
pub type EventSink = Arc<Mutex<Vec<(WindowId, WindowEvent)>>>;

#[derive(Default)]
struct PumpState {
    pending: Option<WindowAttributes>,
    created: Option<Result<Arc<Window>, winit::error::OsError>>,
}

/// Event-loop callback half of the backend. Window creation has to happen
/// inside the event loop's callbacks, so requests are parked in `shared`
/// and fulfilled on the next pump.
struct Pump {
    shared: Arc<Mutex<PumpState>>,
    events: EventSink,
}

impl Pump {
    fn flush_pending(&mut self, event_loop: &ActiveEventLoop) {
        let Ok(mut shared) = self.shared.lock() else {
            return;
        };
        if let Some(attrs) = shared.pending.take() {
            shared.created = Some(event_loop.create_window(attrs).map(Arc::new));
        }
    }
}

impl ApplicationHandler for Pump {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.flush_pending(event_loop);
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Ok(mut events) = self.events.lock() {
            events.push((window_id, event));
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.flush_pending(event_loop);
    }
}

/// Windowing backend over winit and wgpu.
///
/// Owns the process-wide event loop (which must stay on the main thread)
/// and the wgpu instance. "Sharing resources with the root" is rendered as
/// configuring every window's surface against the one shared device created
/// during GPU initialization.
pub struct DesktopBackend {
    event_loop: EventLoop<()>,
    pump: Pump,
    instance: wgpu::Instance,
    gpu: Option<GpuContext>,
    events: EventSink,
}

impl DesktopBackend {
    /// Initialize the windowing library. Process-wide; winit enforces that
    /// this succeeds at most once per process.
    pub fn new() -> Result<Self> {
        let event_loop =
            EventLoop::new().context("could not initialize the windowing library")?;
        let events: EventSink = Arc::default();
        let pump = Pump {
            shared: Arc::default(),
            events: events.clone(),
        };
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        Ok(Self {
            event_loop,
            pump,
            instance,
            gpu: None,
            events,
        })
    }

    /// Sink the UI library drains for per-window input events
    pub fn event_sink(&self) -> EventSink {
        self.events.clone()
    }

    /// The shared device created by GPU initialization
    pub fn gpu(&self) -> Result<&GpuContext> {
        self.gpu
            .as_ref()
            .ok_or_else(|| anyhow!("gpu not initialized yet"))
    }

    fn pump_once(&mut self, timeout: Duration) {
        let _ = self
            .event_loop
            .pump_app_events(Some(timeout), &mut self.pump);
    }
}

impl WindowBackend for DesktopBackend {
    fn create_window(&mut self, desc: &WindowDescriptor) -> Result<Box<dyn WindowHandle>> {
        let attrs = Window::default_attributes()
            .with_title(&desc.title)
            .with_visible(desc.visible)
            .with_inner_size(winit::dpi::PhysicalSize::new(desc.width, desc.height));
        {
            let mut shared = self
                .pump
                .shared
                .lock()
                .map_err(|_| anyhow!("window pump state poisoned"))?;
            shared.pending = Some(attrs);
        }
        self.pump_once(Duration::ZERO);
        let created = {
            let mut shared = self
                .pump
                .shared
                .lock()
                .map_err(|_| anyhow!("window pump state poisoned"))?;
            shared.created.take()
        };
        let window = created
            .ok_or_else(|| anyhow!("window creation did not complete"))?
            .context("window creation failed")?;
        debug!("created window '{}' ({}x{})", desc.title, desc.width, desc.height);

        let surface = self
            .instance
            .create_surface(window.clone())
            .context("surface creation failed")?;

        let mut handle = WinitWindowHandle {
            window: Some(window),
            surface: Some(surface),
            gpu: None,
            config: None,
            pending_frame: None,
            bound: false,
        };
        if desc.shared_with_root {
            let gpu = self.gpu()?.clone();
            handle.configure(&gpu)?;
            handle.gpu = Some(gpu);
        }
        Ok(Box::new(handle))
    }

    fn init_gpu(&mut self, root: &mut dyn WindowHandle) -> Result<()> {
        let root = root
            .as_any_mut()
            .downcast_mut::<WinitWindowHandle>()
            .ok_or_else(|| anyhow!("root surface is not a desktop window"))?;
        let surface = root
            .surface
            .as_ref()
            .ok_or_else(|| anyhow!("root surface already destroyed"))?;
        let gpu = pollster::block_on(GpuContext::new_with_surface(&self.instance, surface))?;
        root.gpu = Some(gpu.clone());
        self.gpu = Some(gpu);
        Ok(())
    }

    fn wait_events(&mut self, timeout: Duration) {
        self.pump_once(timeout);
    }
}

/// One winit window plus its wgpu surface.
///
/// Destroying the handle drops both; the native window closes once every
/// other `Arc` clone of it drops as well.
pub struct WinitWindowHandle {
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    gpu: Option<GpuContext>,
    config: Option<wgpu::SurfaceConfiguration>,
    pending_frame: Option<wgpu::SurfaceTexture>,
    bound: bool,
}

impl WinitWindowHandle {
    /// `None` once the handle has been destroyed
    pub fn window(&self) -> Option<&Arc<Window>> {
        self.window.as_ref()
    }

    pub(crate) fn surface_format(&self) -> Option<wgpu::TextureFormat> {
        self.config.as_ref().map(|config| config.format)
    }

    fn configure(&mut self, gpu: &GpuContext) -> Result<()> {
        let (window, surface) = match (&self.window, &self.surface) {
            (Some(window), Some(surface)) => (window, surface),
            _ => return Err(anyhow!("window already destroyed")),
        };
        let size = window.inner_size();
        let caps = surface.get_capabilities(gpu.adapter());
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow!("no supported surface format"))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            // vsync-style presentation
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(gpu.device(), &config);
        self.config = Some(config);
        Ok(())
    }

    /// Acquire the next frame, reconfiguring the surface after a resize or
    /// a lost swapchain.
    pub(crate) fn acquire_frame(&mut self) -> Result<wgpu::SurfaceTexture> {
        let gpu = self
            .gpu
            .clone()
            .ok_or_else(|| anyhow!("surface has no gpu device"))?;
        let size = self
            .window
            .as_ref()
            .map(|window| window.inner_size())
            .ok_or_else(|| anyhow!("window already destroyed"))?;
        let stale = match &self.config {
            Some(config) => {
                config.width != size.width.max(1) || config.height != size.height.max(1)
            }
            None => true,
        };
        if stale {
            self.configure(&gpu)?;
        }
        let first = {
            let surface = self
                .surface
                .as_ref()
                .ok_or_else(|| anyhow!("window already destroyed"))?;
            surface.get_current_texture()
        };
        match first {
            Ok(frame) => Ok(frame),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.configure(&gpu)?;
                self.surface
                    .as_ref()
                    .ok_or_else(|| anyhow!("window already destroyed"))?
                    .get_current_texture()
                    .context("surface frame acquisition failed")
            }
            Err(e) => Err(anyhow!("surface frame acquisition failed: {e}")),
        }
    }

    pub(crate) fn set_pending_frame(&mut self, frame: wgpu::SurfaceTexture) {
        self.pending_frame = Some(frame);
    }
}

impl WindowHandle for WinitWindowHandle {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn drawable_size(&self) -> WindowDimensions {
        match &self.window {
            Some(window) => {
                let size = window.inner_size();
                WindowDimensions::new(size.width, size.height)
            }
            None => WindowDimensions::new(0, 0),
        }
    }

    fn bind(&mut self) {
        debug_assert!(!self.bound, "window bound twice without a release");
        self.bound = true;
    }

    fn release(&mut self) {
        self.bound = false;
    }

    fn present(&mut self) {
        if let Some(frame) = self.pending_frame.take() {
            frame.present();
        }
    }

    fn destroy(&mut self) {
        if self.window.is_some() {
            // dropping the surface before the window; the native window
            // closes once the last outstanding clone drops
            self.pending_frame = None;
            self.surface = None;
            self.config = None;
            self.window = None;
            debug!("window destroyed");
        }
    }

    fn is_destroyed(&self) -> bool {
        self.window.is_none()
    }
}
