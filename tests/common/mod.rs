//! Scripted collaborator doubles for runtime tests.

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};

use triad::core::app_context::{AppContextBase, ApplicationContext};
use triad::core::ui_surface::SurfaceContent;
use triad::traits::ui::{ActivationState, UiDraw, UiInstanceId, UiLibrary};
use triad::traits::windowing::{
    WindowBackend, WindowDescriptor, WindowDimensions, WindowHandle,
};

/// Call counters that stay observable after the handle moves into a surface
#[derive(Default)]
pub struct WindowCounters {
    pub bind: AtomicUsize,
    pub release: AtomicUsize,
    pub present: AtomicUsize,
    pub destroy: AtomicUsize,
}

impl WindowCounters {
    pub fn bind_count(&self) -> usize {
        self.bind.load(Ordering::Relaxed)
    }

    pub fn present_count(&self) -> usize {
        self.present.load(Ordering::Relaxed)
    }

    pub fn destroy_count(&self) -> usize {
        self.destroy.load(Ordering::Relaxed)
    }
}

pub struct FakeWindow {
    counters: Arc<WindowCounters>,
    size: WindowDimensions,
    destroyed: bool,
}

impl WindowHandle for FakeWindow {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn drawable_size(&self) -> WindowDimensions {
        self.size
    }

    fn bind(&mut self) {
        self.counters.bind.fetch_add(1, Ordering::Relaxed);
    }

    fn release(&mut self) {
        self.counters.release.fetch_add(1, Ordering::Relaxed);
    }

    fn present(&mut self) {
        self.counters.present.fetch_add(1, Ordering::Relaxed);
    }

    fn destroy(&mut self) {
        // deliberately unguarded so tests can detect double teardown
        self.counters.destroy.fetch_add(1, Ordering::Relaxed);
        self.destroyed = true;
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

/// Windowing library double with scriptable failures
#[derive(Default)]
pub struct FakeBackend {
    pub fail_windowing: bool,
    pub fail_gpu: bool,
    pub windows_created: usize,
    pub wait_calls: usize,
    pub last_counters: Option<Arc<WindowCounters>>,
}

impl WindowBackend for FakeBackend {
    fn create_window(&mut self, _desc: &WindowDescriptor) -> Result<Box<dyn WindowHandle>> {
        if self.fail_windowing {
            bail!("could not initialize the windowing library");
        }
        self.windows_created += 1;
        let counters = Arc::new(WindowCounters::default());
        self.last_counters = Some(counters.clone());
        Ok(Box::new(FakeWindow {
            counters,
            size: WindowDimensions::new(640, 480),
            destroyed: false,
        }))
    }

    fn init_gpu(&mut self, _root: &mut dyn WindowHandle) -> Result<()> {
        if self.fail_gpu {
            bail!("minimum gpu capability unavailable");
        }
        Ok(())
    }

    fn wait_events(&mut self, _timeout: Duration) {
        self.wait_calls += 1;
    }
}

#[derive(Default)]
pub struct FakeUiInstance {
    pub activation: ActivationState,
    pub destroy_calls: usize,
}

/// UI library double exposing the single-current-instance model
#[derive(Default)]
pub struct FakeUi {
    pub instances: Vec<FakeUiInstance>,
    pub current: Option<UiInstanceId>,
    pub state_copies: usize,
    pub set_current_calls: usize,
    pub frames_begun: usize,
    pub frames_ended: usize,
    pub regions: Vec<String>,
    /// Button label reported as clicked on every frame
    pub click: Option<String>,
    pub fail_begin_frame: bool,
}

impl FakeUi {
    fn slot(&mut self, id: UiInstanceId) -> &mut FakeUiInstance {
        &mut self.instances[id.0 as usize]
    }
}

impl UiLibrary for FakeUi {
    fn create_instance(&mut self, _window: &dyn WindowHandle) -> Result<UiInstanceId> {
        self.instances.push(FakeUiInstance::default());
        Ok(UiInstanceId(self.instances.len() as u64 - 1))
    }

    fn destroy_instance(&mut self, id: UiInstanceId) {
        self.slot(id).destroy_calls += 1;
    }

    fn current_instance(&self) -> Option<UiInstanceId> {
        self.current
    }

    fn set_current_instance(&mut self, id: UiInstanceId) {
        self.set_current_calls += 1;
        self.current = Some(id);
    }

    fn activation_state(&self, id: UiInstanceId) -> ActivationState {
        self.instances[id.0 as usize].activation.clone()
    }

    fn apply_activation_state(&mut self, id: UiInstanceId, state: &ActivationState) {
        self.state_copies += 1;
        self.slot(id).activation = state.clone();
    }

    fn begin_frame(
        &mut self,
        id: UiInstanceId,
        _window: &mut dyn WindowHandle,
        _size: WindowDimensions,
    ) -> Result<()> {
        if self.fail_begin_frame {
            bail!("ui frame failure");
        }
        self.frames_begun += 1;
        self.slot(id).activation.initialized = true;
        Ok(())
    }

    fn host_region(
        &mut self,
        _id: UiInstanceId,
        label: &str,
        content: &mut dyn FnMut(&mut dyn UiDraw),
    ) -> Result<()> {
        self.regions.push(label.to_owned());
        let mut draw = FakeDraw {
            click: self.click.clone(),
            texts: Vec::new(),
        };
        content(&mut draw);
        Ok(())
    }

    fn end_frame(&mut self, _id: UiInstanceId, _window: &mut dyn WindowHandle) -> Result<()> {
        self.frames_ended += 1;
        Ok(())
    }
}

pub struct FakeDraw {
    pub click: Option<String>,
    pub texts: Vec<String>,
}

impl UiDraw for FakeDraw {
    fn text(&mut self, text: &str) {
        self.texts.push(text.to_owned());
    }

    fn button(&mut self, label: &str) -> bool {
        self.click.as_deref() == Some(label)
    }
}

/// Minimal concrete application context for engine tests
pub struct TestApp {
    pub base: AppContextBase,
    pub updates: AtomicUsize,
}

impl TestApp {
    pub fn new(base: AppContextBase) -> Self {
        Self {
            base,
            updates: AtomicUsize::new(0),
        }
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::Relaxed)
    }
}

impl ApplicationContext for TestApp {
    fn base(&self) -> &AppContextBase {
        &self.base
    }

    fn update(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }
}

/// Frame content that requests shutdown on its first run
pub struct QuitOnFirstFrame {
    pub runs: Arc<AtomicUsize>,
}

impl SurfaceContent for QuitOnFirstFrame {
    fn run(&mut self, _ui: &mut dyn UiDraw, app: &dyn ApplicationContext) {
        self.runs.fetch_add(1, Ordering::Relaxed);
        app.base().request_shutdown();
    }
}

/// Frame content that draws nothing and never requests shutdown
pub struct NoopContent;

impl SurfaceContent for NoopContent {
    fn run(&mut self, _ui: &mut dyn UiDraw, _app: &dyn ApplicationContext) {}
}
