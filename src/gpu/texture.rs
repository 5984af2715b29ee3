//! Amplitude texture allocation.

use crate::error::EngineError;
use crate::resource::TextureShape;

/// An amplitude texture and its default view.
///
/// Created with `RENDER_ATTACHMENT | TEXTURE_BINDING | COPY_SRC | COPY_DST`
/// so it can be drawn into, sampled by the next pass, uploaded and read
/// back.
pub struct AmplitudeTexture {
    /// The underlying GPU texture.
    pub texture: wgpu::Texture,
    /// A default full-texture view.
    pub view: wgpu::TextureView,
}

impl AmplitudeTexture {
    /// Create the texture inside error scopes and report any allocation or
    /// validation failure instead of deferring it to the uncaptured-error
    /// handler.
    ///
    /// # Errors
    ///
    /// [`EngineError::TextureAllocation`] when the device is out of memory
    /// or rejects the descriptor; [`EngineError::IncompleteFramebuffer`]
    /// when the view cannot serve as a render attachment.
    pub fn new(
        device: &wgpu::Device,
        shape: TextureShape,
        label: &str,
    ) -> Result<Self, EngineError> {
        let limit = device.limits().max_texture_dimension_2d;
        if shape.width > limit || shape.height > limit {
            return Err(EngineError::TextureAllocation {
                operation: "allocate",
                shape,
                detail: format!("exceeds max texture dimension {limit}"),
            });
        }

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: shape.width,
                height: shape.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: shape.encoding.texture_format(),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let validation = pollster::block_on(device.pop_error_scope());
        let oom = pollster::block_on(device.pop_error_scope());
        if let Some(e) = oom.or(validation) {
            return Err(EngineError::TextureAllocation {
                operation: "allocate",
                shape,
                detail: e.to_string(),
            });
        }

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        if let Some(e) = pollster::block_on(device.pop_error_scope()) {
            return Err(EngineError::IncompleteFramebuffer {
                operation: "allocate",
                shape,
                detail: e.to_string(),
            });
        }

        Ok(Self { texture, view })
    }
}
