use std::fmt;

use anyhow::Result;
use log::info;

use crate::traits::windowing::{WindowBackend, WindowDescriptor, WindowHandle};

/// The hidden root surface anchoring GPU resource sharing.
///
/// Exactly one is created at startup and exclusively owned by the entry
/// point for the process lifetime. Every visible surface is created sharing
/// resources with it. After construction it is read-only and safe to
/// reference from any thread without synchronization.
pub struct GraphicsContext {
    root: Box<dyn WindowHandle>,
    destroyed: bool,
}

impl GraphicsContext {
    /// Create the root surface and resolve the GPU function table.
    ///
    /// The root surface is bound only for the duration of function-table
    /// initialization and released immediately, so that exactly one thread
    /// at a time can bind it later. Fails when the windowing library cannot
    /// produce a surface or the minimum GPU capability is unavailable; both
    /// are fatal to startup.
    pub fn create(backend: &mut dyn WindowBackend) -> Result<Self> {
        let mut root = backend.create_window(&WindowDescriptor::root())?;
        root.bind();
        let gpu = backend.init_gpu(root.as_mut());
        root.release();
        gpu?;
        info!("root graphics context ready");
        Ok(Self {
            root,
            destroyed: false,
        })
    }

    pub fn root(&self) -> &dyn WindowHandle {
        self.root.as_ref()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Release the root surface. The underlying window is torn down exactly
    /// once; further calls are no-ops and the context is unusable afterward.
    pub fn destroy(&mut self) {
        if !self.destroyed {
            self.root.destroy();
            self.destroyed = true;
        }
    }
}

impl Drop for GraphicsContext {
    fn drop(&mut self) {
        self.destroy();
    }
}

// manual impl: the boxed window handle is not Debug
impl fmt::Debug for GraphicsContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphicsContext")
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}
