use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{info, warn};

use crate::options::GpuOptions;

/// Errors that can occur while creating or restoring the GPU context.
#[derive(Debug)]
pub enum RenderContextError {
    /// No compatible GPU adapter found.
    AdapterRequest(wgpu::RequestAdapterError),
    /// GPU device request failed (limits or features not met).
    DeviceRequest(wgpu::RequestDeviceError),
    /// The adapter cannot render into the amplitude texture format.
    UnsupportedFormat(wgpu::TextureFormat),
}

impl fmt::Display for RenderContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdapterRequest(e) => {
                write!(f, "no compatible GPU adapter found: {e}")
            }
            Self::DeviceRequest(e) => write!(f, "device request failed: {e}"),
            Self::UnsupportedFormat(format) => {
                write!(f, "adapter cannot render to {format:?}")
            }
        }
    }
}

impl std::error::Error for RenderContextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::AdapterRequest(e) => Some(e),
            Self::DeviceRequest(e) => Some(e),
            Self::UnsupportedFormat(_) => None,
        }
    }
}

/// Headless wgpu device and queue.
///
/// The device-lost callback flips a shared flag that the resource manager
/// polls before every acquire. `generation` counts how many contexts the
/// owning backend has created.
pub struct GpuContext {
    /// The wgpu logical device.
    pub device: wgpu::Device,
    /// The wgpu command queue.
    pub queue: wgpu::Queue,
    /// Adapter name, for logs.
    pub adapter_name: String,
    /// Context generation, starting at 0.
    pub generation: u64,
    lost: Arc<AtomicBool>,
}

impl GpuContext {
    /// Request an adapter and device with no surface.
    ///
    /// # Errors
    ///
    /// Returns `RenderContextError` if the adapter or device request fails
    /// or the adapter cannot render to `Rg32Float`.
    pub async fn new(
        options: &GpuOptions,
        generation: u64,
    ) -> Result<Self, RenderContextError> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: options.power_preference.into(),
                force_fallback_adapter: options.force_fallback_adapter,
                compatible_surface: None,
            })
            .await
            .map_err(RenderContextError::AdapterRequest)?;

        let format = wgpu::TextureFormat::Rg32Float;
        let features = adapter.get_texture_format_features(format);
        if !features
            .allowed_usages
            .contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
        {
            return Err(RenderContextError::UnsupportedFormat(format));
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Amplitude Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(adapter.limits()),
                ..Default::default()
            })
            .await
            .map_err(RenderContextError::DeviceRequest)?;

        let lost = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&lost);
        device.set_device_lost_callback(move |reason, message| {
            flag.store(true, Ordering::SeqCst);
            warn!("GPU device lost ({reason:?}): {message}");
        });

        let adapter_name = adapter.get_info().name;
        info!("GPU context #{generation} on '{adapter_name}'");

        Ok(Self {
            device,
            queue,
            adapter_name,
            generation,
            lost,
        })
    }

    /// Whether the device has been lost.
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::SeqCst)
    }

    /// Destroy the device and mark the context lost.
    pub fn lose(&self) {
        self.lost.store(true, Ordering::SeqCst);
        self.device.destroy();
    }

    /// Create a new command encoder.
    pub fn create_encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(label),
            })
    }

    /// Finish the encoder and submit its command buffer to the GPU queue.
    pub fn submit(&self, encoder: wgpu::CommandEncoder) {
        let _ = self.queue.submit(std::iter::once(encoder.finish()));
    }
}
