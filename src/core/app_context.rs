use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::ui_surface::UiSurface;

/// Application-owned state advanced by the state engine.
///
/// Carries no fields of its own; concrete applications park their
/// simulation state in the lazily created detail slot.
#[derive(Default)]
pub struct StateContext {
    detail: Option<Box<dyn Any + Send + Sync>>,
}

impl StateContext {
    pub fn set_detail<T: Any + Send + Sync>(&mut self, detail: T) {
        self.detail = Some(Box::new(detail));
    }

    pub fn detail<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.detail.as_deref().and_then(|d| d.downcast_ref())
    }
}

/// Application-owned state advanced by the render engine, for non-UI
/// rendering work such as offscreen passes. Same shape as [`StateContext`].
#[derive(Default)]
pub struct RenderContext {
    detail: Option<Box<dyn Any + Send + Sync>>,
}

impl RenderContext {
    pub fn set_detail<T: Any + Send + Sync>(&mut self, detail: T) {
        self.detail = Some(Box::new(detail));
    }

    pub fn detail<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.detail.as_deref().and_then(|d| d.downcast_ref())
    }
}

/// The shared coordination record every engine observes.
///
/// The shutdown flag is the only cross-engine mutable signal. It transitions
/// at most once from false to true (there is deliberately no way to clear
/// it) and is polled rather than signaled, so a stale read only delays an
/// engine by one polling interval.
pub struct AppContextBase {
    shutdown: AtomicBool,
    ui: Arc<UiSurface>,
}

impl AppContextBase {
    pub fn new(ui: Arc<UiSurface>) -> Self {
        Self {
            shutdown: AtomicBool::new(false),
            ui,
        }
    }

    /// Tell every engine to drain and exit. Monotonic; repeated calls are
    /// harmless.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub fn ui(&self) -> &Arc<UiSurface> {
        &self.ui
    }
}

/// The cross-engine application context.
///
/// One instance is created by the entry point and borrowed by all three
/// engines; none of them owns it. `update` runs once per UI engine
/// iteration. `advance_state` and `advance_render` run once per worker
/// engine iteration and are no-ops unless a concrete application overrides
/// them.
pub trait ApplicationContext: Send + Sync {
    fn base(&self) -> &AppContextBase;

    /// Called once per UI engine iteration, after the surface renders
    fn update(&self) {}

    /// Advance the application's [`StateContext`]
    fn advance_state(&self) {}

    /// Advance the application's [`RenderContext`]
    fn advance_render(&self) {}
}
