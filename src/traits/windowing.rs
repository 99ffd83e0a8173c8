use std::any::Any;
use std::time::Duration;

use anyhow::Result;

/// Window dimensions in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowDimensions {
    pub width: u32,
    pub height: u32,
}

impl WindowDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Creation parameters for one window surface
#[derive(Debug, Clone)]
pub struct WindowDescriptor {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub visible: bool,
    /// Share GPU resources with the root surface. Unset only for the root
    /// surface itself.
    pub shared_with_root: bool,
}

impl WindowDescriptor {
    /// Descriptor for the hidden root surface anchoring resource sharing
    pub fn root() -> Self {
        Self {
            title: "root graphics context".to_owned(),
            width: 16,
            height: 16,
            visible: false,
            shared_with_root: false,
        }
    }

    /// Descriptor for a visible window sharing resources with the root
    pub fn visible(title: &str, width: u32, height: u32) -> Self {
        Self {
            title: title.to_owned(),
            width,
            height,
            visible: true,
            shared_with_root: true,
        }
    }
}

/// One GPU-capable window owned by the windowing library.
///
/// `bind`/`release` bracket exclusive use of the window's GPU resources on
/// the calling thread; a window must never be bound on two threads at once.
pub trait WindowHandle: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Current drawable size in physical pixels
    fn drawable_size(&self) -> WindowDimensions;

    /// Take exclusive use of the window's GPU resources on this thread
    fn bind(&mut self);

    /// Give up the exclusive use taken by [`bind`](WindowHandle::bind)
    fn release(&mut self);

    /// Present the most recently submitted frame
    fn present(&mut self);

    /// Release the underlying window. Called at most once; the handle is
    /// unusable afterward.
    fn destroy(&mut self);

    fn is_destroyed(&self) -> bool;
}

/// Process-wide windowing library boundary.
///
/// The runtime consumes window creation, event waiting, and GPU
/// function-table initialization from here and reimplements none of it.
pub trait WindowBackend {
    fn create_window(&mut self, desc: &WindowDescriptor) -> Result<Box<dyn WindowHandle>>;

    /// Resolve the GPU function table against the root surface. Fails when
    /// the minimum required GPU capability is unavailable; callers treat
    /// that as fatal.
    fn init_gpu(&mut self, root: &mut dyn WindowHandle) -> Result<()>;

    /// Block for the next input or timer event, up to `timeout`
    fn wait_events(&mut self, timeout: Duration);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_hold_values() {
        let dims = WindowDimensions::new(1024, 768);
        assert_eq!(dims.width, 1024);
        assert_eq!(dims.height, 768);
    }

    #[test]
    fn dimensions_are_copy() {
        let a = WindowDimensions::new(640, 480);
        let b = a;
        assert_eq!(a, b);
    }

    #[test]
    fn root_descriptor_is_hidden_and_unshared() {
        let desc = WindowDescriptor::root();
        assert!(!desc.visible);
        assert!(!desc.shared_with_root);
        assert!(desc.width <= 16 && desc.height <= 16);
    }

    #[test]
    fn visible_descriptor_shares_with_root() {
        let desc = WindowDescriptor::visible("demo", 800, 600);
        assert!(desc.visible);
        assert!(desc.shared_with_root);
        assert_eq!(desc.title, "demo");
        assert_eq!((desc.width, desc.height), (800, 600));
    }
}
