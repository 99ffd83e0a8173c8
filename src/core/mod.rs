pub mod app_context;
pub mod engines;
pub mod graphics_context;
pub mod ui_surface;
