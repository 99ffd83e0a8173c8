pub mod ui;
pub mod windowing;

pub use ui::*;
pub use windowing::*;
