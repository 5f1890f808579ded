use std::sync::Arc;
use wgpu::{Adapter, Device, DeviceDescriptor, Features, Instance, Limits, Queue, Surface};

use crate::error::{PipelineError, Result};

/// Shared GPU device and queue
///
/// Cloning is cheap (Arc); the backend and any pass-private resources share
/// the same device.
#[derive(Clone)]
pub struct GpuContext {
    device: Arc<Device>,
    queue: Arc<Queue>,
}

impl GpuContext {
    /// Create a GPU context compatible with a surface
    ///
    /// The surface must come from the same `instance`.
    pub async fn for_surface(instance: &Instance, surface: &Surface<'_>) -> Result<(Self, Adapter)> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| PipelineError::Adapter(format!("{:?}", e)))?;

        let (device, queue) = Self::request_device(&adapter).await?;

        Ok((
            Self {
                device: Arc::new(device),
                queue: Arc::new(queue),
            },
            adapter,
        ))
    }

    /// Get reference to the device
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Get reference to the queue
    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    async fn request_device(adapter: &Adapter) -> Result<(Device, Queue)> {
        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        adapter
            .request_device(&DeviceDescriptor {
                label: Some("Stage Device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                experimental_features: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|e| PipelineError::Device(e.to_string()))
    }
}
