use std::sync::Arc;

use anyhow::{anyhow, Context as _, Result};
use log::info;
use wgpu::{Adapter, Device, DeviceDescriptor, Instance, Queue, Surface};

/// Shared GPU device and queue.
///
/// Cloned cheaply (Arc) into every window's renderer so that all surfaces
/// share one set of GPU resources, the way windows created against a shared
/// root GL context would.
#[derive(Clone)]
pub struct GpuContext {
    adapter: Arc<Adapter>,
    device: Arc<Device>,
    queue: Arc<Queue>,
}

impl GpuContext {
    /// Create a GPU context compatible with the root surface.
    ///
    /// This is the function-table resolution step: failing to obtain an
    /// adapter or a device meeting the default limits means the minimum
    /// required GPU capability is unavailable, which is fatal to startup.
    pub async fn new_with_surface(instance: &Instance, surface: &Surface<'_>) -> Result<Self> {
        let adapter = Self::request_adapter(instance, surface).await?;
        let adapter_info = adapter.get_info();
        info!(
            "gpu adapter: {} ({:?}, {:?})",
            adapter_info.name, adapter_info.backend, adapter_info.device_type
        );
        let (device, queue) = Self::request_device(&adapter).await?;
        Ok(Self {
            adapter: Arc::new(adapter),
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }

    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    async fn request_adapter(instance: &Instance, surface: &Surface<'_>) -> Result<Adapter> {
        instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| anyhow!("no suitable gpu adapter: {e:?}"))
    }

    async fn request_device(adapter: &Adapter) -> Result<(Device, Queue)> {
        adapter
            .request_device(&DeviceDescriptor {
                label: Some("shared device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                experimental_features: Default::default(),
                trace: Default::default(),
            })
            .await
            .context("gpu device creation failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Real context creation needs GPU hardware; integration happens through
    // the desktop backend. Here we only pin the cheap-clone contract.
    #[test]
    fn clone_semantics() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<GpuContext>();
    }
}
