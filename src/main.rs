use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use log::info;

use triad::backend::desktop::DesktopBackend;
use triad::backend::egui_ui::EguiLibrary;
use triad::core::app_context::{AppContextBase, ApplicationContext, RenderContext, StateContext};
use triad::core::engines;
use triad::core::graphics_context::GraphicsContext;
use triad::core::ui_surface::{SurfaceContent, UiSurface};
use triad::traits::ui::UiDraw;

const WINDOW_TITLE: &str = "triad";
const WINDOW_WIDTH: u32 = 1024;
const WINDOW_HEIGHT: u32 = 1024;

/// Sample frame content. The runtime contract only needs something that can
/// draw and request shutdown; everything else belongs to a concrete
/// application.
struct DemoContent;

impl SurfaceContent for DemoContent {
    fn run(&mut self, ui: &mut dyn UiDraw, app: &dyn ApplicationContext) {
        ui.text("Hello world");
        if ui.button("Quit") {
            app.base().request_shutdown();
        }
    }
}

/// Concrete application context: borrows the root graphics context (and so
/// cannot outlive it) and embeds the state and render contexts.
struct DemoAppContext<'gc> {
    base: AppContextBase,
    _graphics: &'gc GraphicsContext,
    _state: StateContext,
    _render: RenderContext,
}

impl<'gc> DemoAppContext<'gc> {
    fn new(graphics: &'gc GraphicsContext, ui: Arc<UiSurface>) -> Self {
        Self {
            base: AppContextBase::new(ui),
            _graphics: graphics,
            _state: StateContext::default(),
            _render: RenderContext::default(),
        }
    }
}

impl ApplicationContext for DemoAppContext<'_> {
    fn base(&self) -> &AppContextBase {
        &self.base
    }
}

fn run_app() -> Result<()> {
    let mut windows = DesktopBackend::new()?;
    let graphics = GraphicsContext::create(&mut windows)?;
    let mut ui = EguiLibrary::new(windows.gpu()?.clone(), windows.event_sink());

    let surface = Arc::new(UiSurface::create(
        &mut windows,
        &mut ui,
        &graphics,
        WINDOW_TITLE,
        WINDOW_WIDTH,
        WINDOW_HEIGHT,
        Box::new(DemoContent),
    )?);

    let app = DemoAppContext::new(&graphics, surface.clone());
    engines::run(&app, &mut windows, &mut ui)?;

    surface.destroy(&mut ui);
    info!("shutdown complete");
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    // process arguments are accepted and passed through unexamined
    match run_app() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("unexpected termination: {err:#}");
            ExitCode::FAILURE
        }
    }
}
