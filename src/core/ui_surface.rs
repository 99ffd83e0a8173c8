use std::sync::Mutex;

use anyhow::{ensure, Result};

use crate::traits::ui::{transfer_activation_state, UiDraw, UiInstanceId, UiLibrary};
use crate::traits::windowing::{WindowBackend, WindowDescriptor, WindowHandle};

use super::app_context::ApplicationContext;
use super::graphics_context::GraphicsContext;

/// Per-frame content drawn by a surface.
///
/// Implementations draw into the host region and may request shutdown
/// through the application context; the UI engine is the only engine
/// permitted to set that flag, and it does so from here.
pub trait SurfaceContent: Send {
    fn run(&mut self, ui: &mut dyn UiDraw, app: &dyn ApplicationContext);
}

struct SurfaceInner {
    window: Box<dyn WindowHandle>,
    instance: UiInstanceId,
    content: Box<dyn SurfaceContent>,
    destroyed: bool,
}

/// One visible window paired 1:1 with one UI library instance.
///
/// Shared between the application context and the UI engine, with the entry
/// point as the root owner. All rendering happens on the UI engine's
/// thread; the lock only serializes benign teardown-ordering races.
pub struct UiSurface {
    title: String,
    inner: Mutex<SurfaceInner>,
}

impl UiSurface {
    /// Create a visible window sharing GPU resources with `graphics` and a
    /// fresh UI library instance bound 1:1 to it.
    ///
    /// `graphics` must be a live root context; its GPU function table is
    /// what the new window's bindings resolve against.
    pub fn create(
        backend: &mut dyn WindowBackend,
        ui: &mut dyn UiLibrary,
        graphics: &GraphicsContext,
        title: &str,
        width: u32,
        height: u32,
        content: Box<dyn SurfaceContent>,
    ) -> Result<Self> {
        ensure!(
            !graphics.is_destroyed(),
            "cannot create a UI surface against a destroyed graphics context"
        );
        let mut window = backend.create_window(&WindowDescriptor::visible(title, width, height))?;
        window.bind();
        let instance = ui.create_instance(window.as_ref());
        window.release();
        let instance = instance?;
        Ok(Self {
            title: title.to_owned(),
            inner: Mutex::new(SurfaceInner {
                window,
                instance,
                content,
                destroyed: false,
            }),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Run one render cycle against `app`.
    ///
    /// A no-op once shutdown has been requested or the surface has been
    /// destroyed; teardown-ordering races resolve to skipped frames, not
    /// errors.
    pub fn render(&self, ui: &mut dyn UiLibrary, app: &dyn ApplicationContext) -> Result<()> {
        let Ok(mut inner) = self.inner.lock() else {
            return Ok(());
        };
        if inner.destroyed || app.base().shutdown_requested() {
            return Ok(());
        }

        inner.window.bind();
        activate_instance(ui, inner.instance);

        let size = inner.window.drawable_size();
        let instance = inner.instance;
        ui.begin_frame(instance, inner.window.as_mut(), size)?;

        // every surface gets a stable, unique host region id
        let label = format!("host-{}", instance.0);
        let content = &mut inner.content;
        ui.host_region(instance, &label, &mut |draw| content.run(draw, app))?;

        ui.end_frame(instance, inner.window.as_mut())?;
        inner.window.present();
        inner.window.release();
        Ok(())
    }

    /// Tear down the UI instance bindings, then the window. Runs exactly
    /// once; later calls, and later `render` calls, are no-ops.
    pub fn destroy(&self, ui: &mut dyn UiLibrary) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        if inner.destroyed {
            return;
        }
        ui.destroy_instance(inner.instance);
        inner.window.destroy();
        inner.destroyed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.lock().map(|inner| inner.destroyed).unwrap_or(true)
    }
}

/// Make `target` the UI library's current instance.
///
/// The library keeps its working state in a single implicit current
/// instance, so switching surfaces copies the carried settings forward from
/// the previously active instance. Activating the already-current instance
/// copies nothing, and the very first activation has nothing to copy from.
pub fn activate_instance(ui: &mut dyn UiLibrary, target: UiInstanceId) {
    let prev = ui.current_instance();
    if prev == Some(target) {
        return;
    }
    if let Some(prev) = prev {
        let carried = ui.activation_state(prev);
        let mut state = ui.activation_state(target);
        transfer_activation_state(&carried, &mut state);
        ui.apply_activation_state(target, &state);
    }
    ui.set_current_instance(target);
}
