pub mod desktop;
pub mod egui_ui;
pub mod gpu_context;
