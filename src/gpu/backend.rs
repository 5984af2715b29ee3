use log::info;
use num_complex::Complex32;

use super::pipeline_helpers::padded_bytes_per_row;
use super::render_context::GpuContext;
use super::texture::AmplitudeTexture;
use crate::error::EngineError;
use crate::kernel::library::KernelLibrary;
use crate::kernel::ShaderPass;
use crate::options::GpuOptions;
use crate::resource::{Backend, ContextStatus, TextureShape};

/// A [`Backend`] that renders kernels through wgpu.
///
/// Each [`Backend::render`] call records one draw and submits it. Restoring
/// a lost context replaces the device, queue and compiled pipelines.
pub struct WgpuBackend {
    options: GpuOptions,
    context: GpuContext,
    kernels: KernelLibrary,
}

impl WgpuBackend {
    /// Create a headless device and the kernel library.
    ///
    /// # Errors
    ///
    /// [`EngineError::Gpu`] if no adapter or device is available;
    /// [`EngineError::Shader`] if the shared shader modules fail to parse.
    pub fn new(options: GpuOptions) -> Result<Self, EngineError> {
        let context = pollster::block_on(GpuContext::new(&options, 0))?;
        let kernels = KernelLibrary::new(&context.device)?;
        Ok(Self {
            options,
            context,
            kernels,
        })
    }

    /// The current device context.
    pub fn context(&self) -> &GpuContext {
        &self.context
    }

    /// Destroy the current device, as a driver reset would.
    pub fn simulate_context_loss(&mut self) {
        self.context.lose();
    }

    fn map_error(kernel: &'static str, detail: impl ToString) -> EngineError {
        EngineError::Pass {
            kernel,
            detail: detail.to_string(),
        }
    }
}

impl Backend for WgpuBackend {
    type Texture = AmplitudeTexture;

    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn context_status(&self) -> ContextStatus {
        if self.context.is_lost() {
            ContextStatus::Lost
        } else {
            ContextStatus::Live
        }
    }

    fn restore_context(&mut self) -> Result<(), EngineError> {
        let generation = self.context.generation + 1;
        let context =
            pollster::block_on(GpuContext::new(&self.options, generation))?;
        self.kernels = KernelLibrary::new(&context.device)?;
        self.context = context;
        info!("GPU context restored (generation {generation})");
        Ok(())
    }

    fn allocate(
        &mut self,
        shape: TextureShape,
        label: &str,
    ) -> Result<Self::Texture, EngineError> {
        AmplitudeTexture::new(&self.context.device, shape, label)
    }

    fn upload(
        &mut self,
        texture: &Self::Texture,
        shape: TextureShape,
        amplitudes: &[Complex32],
    ) -> Result<(), EngineError> {
        if amplitudes.len() != shape.texel_count() {
            return Err(EngineError::InvalidPass(format!(
                "{} amplitudes do not fill {shape}",
                amplitudes.len()
            )));
        }
        let bytes_per_texel = shape.encoding.bytes_per_texel();
        let mut bytes =
            Vec::with_capacity(amplitudes.len() * bytes_per_texel as usize);
        for a in amplitudes {
            shape.encoding.write_texel(*a, &mut bytes);
        }
        self.context.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(shape.width * bytes_per_texel),
                rows_per_image: Some(shape.height),
            },
            wgpu::Extent3d {
                width: shape.width,
                height: shape.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn render(
        &mut self,
        pass: &ShaderPass,
        shape: TextureShape,
        input: &Self::Texture,
        output: &Self::Texture,
    ) -> Result<(), EngineError> {
        let mut encoder = self.context.create_encoder(pass.kernel.name());
        self.kernels.record(
            &self.context.device,
            &self.context.queue,
            &mut encoder,
            pass,
            shape,
            &input.view,
            &output.view,
        )?;
        self.context.submit(encoder);
        Ok(())
    }

    fn read(
        &mut self,
        texture: &Self::Texture,
        shape: TextureShape,
    ) -> Result<Vec<Complex32>, EngineError> {
        let bytes_per_texel = shape.encoding.bytes_per_texel();
        let padded_row = padded_bytes_per_row(shape.width, bytes_per_texel);
        let device = &self.context.device;
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Amplitude Readback"),
            size: u64::from(padded_row) * u64::from(shape.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self.context.create_encoder("Amplitude Readback");
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(shape.height),
                },
            },
            wgpu::Extent3d {
                width: shape.width,
                height: shape.height,
                depth_or_array_layers: 1,
            },
        );
        self.context.submit(encoder);

        let slice = staging.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        let _ = device
            .poll(wgpu::PollType::Wait)
            .map_err(|e| Self::map_error("readback", e))?;
        receiver
            .recv()
            .map_err(|e| Self::map_error("readback", e))?
            .map_err(|e| Self::map_error("readback", e))?;

        let data = slice.get_mapped_range();
        let row_bytes = (shape.width * bytes_per_texel) as usize;
        let mut amplitudes = Vec::with_capacity(shape.texel_count());
        for row in data.chunks(padded_row as usize) {
            for texel in row[..row_bytes].chunks(bytes_per_texel as usize) {
                amplitudes.push(shape.encoding.read_texel(texel));
            }
        }
        drop(data);
        staging.unmap();
        Ok(amplitudes)
    }
}
