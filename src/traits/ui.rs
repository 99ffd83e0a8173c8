use anyhow::Result;

use super::windowing::{WindowDimensions, WindowHandle};

/// Identifier of one UI library instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UiInstanceId(pub u64);

/// The per-instance settings the UI library keeps in its implicit current
/// instance.
///
/// This is the versioned list of fields carried across instance switches by
/// [`transfer_activation_state`]. Extend deliberately: every field added
/// here is copied on every switch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActivationState {
    /// Widget color table, indexed by style slot
    pub style: Vec<[f32; 4]>,
    /// Logical input action to platform key code
    pub key_map: Vec<u32>,
    /// Where the library persists its layout, if anywhere
    pub layout_file: Option<String>,
    /// Whether the instance has rendered at least one frame
    pub initialized: bool,
}

/// Copy forward the carried settings from the previously active instance.
///
/// Isolated in one function so that a UI library gaining native
/// multi-instance support only requires deleting this call site. The field
/// list tracks the library's internal layout and is known to be brittle
/// across library versions.
pub fn transfer_activation_state(from: &ActivationState, to: &mut ActivationState) {
    to.style = from.style.clone();
    to.key_map = from.key_map.clone();
    to.layout_file = from.layout_file.clone();
    to.initialized = from.initialized;
}

/// Immediate-mode draw calls available to frame content
pub trait UiDraw {
    fn text(&mut self, text: &str);

    /// Returns true when the button was clicked this frame
    fn button(&mut self, label: &str) -> bool;
}

/// Immediate-mode UI library boundary.
///
/// The library keeps a single implicit current instance; switching between
/// logical surfaces goes through
/// [`activate_instance`](crate::core::ui_surface::activate_instance).
pub trait UiLibrary {
    fn create_instance(&mut self, window: &dyn WindowHandle) -> Result<UiInstanceId>;
    fn destroy_instance(&mut self, id: UiInstanceId);

    fn current_instance(&self) -> Option<UiInstanceId>;
    fn set_current_instance(&mut self, id: UiInstanceId);

    /// Snapshot the carried settings of `id`
    fn activation_state(&self, id: UiInstanceId) -> ActivationState;

    /// Overwrite the carried settings of `id`
    fn apply_activation_state(&mut self, id: UiInstanceId, state: &ActivationState);

    /// Begin a frame sized to the full window
    fn begin_frame(
        &mut self,
        id: UiInstanceId,
        window: &mut dyn WindowHandle,
        size: WindowDimensions,
    ) -> Result<()>;

    /// One full-window host region with window chrome disabled (no title
    /// bar, resize, move, collapse, focus steal, or scrollbars). `content`
    /// is invoked exactly once with the region's draw surface.
    fn host_region(
        &mut self,
        id: UiInstanceId,
        label: &str,
        content: &mut dyn FnMut(&mut dyn UiDraw),
    ) -> Result<()>;

    /// Finalize the frame's draw data and submit it to the window
    fn end_frame(&mut self, id: UiInstanceId, window: &mut dyn WindowHandle) -> Result<()>;
}
