use std::thread;
use std::time::Duration;

use anyhow::Result;
use log::debug;

use crate::traits::ui::UiLibrary;
use crate::traits::windowing::WindowBackend;

use super::app_context::ApplicationContext;

/// Idle polling interval shared by all three engines.
///
/// Bounds how long any engine may block without rechecking the shutdown
/// flag. The UI engine also uses it as its event-wait timeout, which keeps
/// the UI updating at roughly 24 Hz when otherwise idle.
pub const POLL_INTERVAL: Duration = Duration::from_micros(1_000_000 / 24);

/// State engine loop: advance the state context until shutdown
pub fn state_engine(app: &dyn ApplicationContext) {
    while !app.base().shutdown_requested() {
        app.advance_state();
        thread::sleep(POLL_INTERVAL);
    }
    debug!("state engine drained");
}

/// Render engine loop: advance the render context until shutdown.
///
/// Scoped to non-UI rendering work such as offscreen passes; the UI
/// surface's own rendering stays on the UI engine.
pub fn render_engine(app: &dyn ApplicationContext) {
    while !app.base().shutdown_requested() {
        app.advance_render();
        thread::sleep(POLL_INTERVAL);
    }
    debug!("render engine drained");
}

/// UI engine loop: wait for input, render the surface, update the context.
///
/// Runs on the thread that owns process lifetime. This is the only engine
/// that may request shutdown, which it does through the surface's frame
/// content in response to user interaction. Errors are not recovered
/// locally; they propagate to the process boundary and end the run.
pub fn ui_engine(
    app: &dyn ApplicationContext,
    windows: &mut dyn WindowBackend,
    ui: &mut dyn UiLibrary,
) -> Result<()> {
    while !app.base().shutdown_requested() {
        windows.wait_events(POLL_INTERVAL);
        app.base().ui().render(ui, app)?;
        app.update();
    }
    debug!("ui engine drained");
    Ok(())
}

/// Raises the shutdown flag when dropped during an unwind. Without it, a
/// panic in frame content would leave the flag unset and the scope would
/// block forever joining the worker engines.
struct DrainOnUnwind<'a> {
    app: &'a dyn ApplicationContext,
}

impl Drop for DrainOnUnwind<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.app.base().request_shutdown();
        }
    }
}

/// Launch the state and render engines on their own threads, run the UI
/// engine on the calling thread, and join everything once shutdown is
/// requested. Errors and panics out of the UI engine both raise the flag
/// before the join, then propagate to the caller.
pub fn run(
    app: &dyn ApplicationContext,
    windows: &mut dyn WindowBackend,
    ui: &mut dyn UiLibrary,
) -> Result<()> {
    thread::scope(|scope| {
        scope.spawn(|| state_engine(app));
        scope.spawn(|| render_engine(app));

        let _guard = DrainOnUnwind { app };
        let result = ui_engine(app, windows, ui);
        if result.is_err() {
            // the worker engines must still drain before the join
            app.base().request_shutdown();
        }
        result
    })
}
