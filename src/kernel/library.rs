//! Compiled kernel pipelines.
//!
//! All kernels share one bind group layout: the input amplitude texture,
//! the [`KernelUniforms`] block and the [`MatrixUniform`] block (read only
//! by the dense unitary shader). Pipelines are compiled lazily per kernel
//! kind and pixel encoding and live as long as the device.

use log::debug;
use rustc_hash::FxHashMap;

use super::{KernelKind, KernelUniforms, MatrixUniform, ShaderPass};
use crate::error::EngineError;
use crate::gpu::pipeline_helpers::{
    create_screen_space_pipeline, texture_2d_unfilterable, uniform_buffer,
};
use crate::gpu::shader_composer::ShaderComposer;
use crate::resource::{PixelEncoding, TextureShape};

/// Render pipelines and uniform buffers for every kernel.
pub struct KernelLibrary {
    composer: ShaderComposer,
    bind_group_layout: wgpu::BindGroupLayout,
    pipelines: FxHashMap<(KernelKind, PixelEncoding), wgpu::RenderPipeline>,
    params_buffer: wgpu::Buffer,
    matrix_buffer: wgpu::Buffer,
}

impl KernelLibrary {
    /// Create the shared layout and uniform buffers on `device`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Shader`] if the shared shader modules fail to
    /// register.
    pub fn new(device: &wgpu::Device) -> Result<Self, EngineError> {
        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Kernel Bind Group Layout"),
                entries: &[
                    texture_2d_unfilterable(0),
                    uniform_buffer(1),
                    uniform_buffer(2),
                ],
            });
        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Kernel Params"),
            size: std::mem::size_of::<KernelUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let matrix_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Kernel Matrix"),
            size: std::mem::size_of::<MatrixUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Ok(Self {
            composer: ShaderComposer::new()?,
            bind_group_layout,
            pipelines: FxHashMap::default(),
            params_buffer,
            matrix_buffer,
        })
    }

    fn ensure_pipeline(
        &mut self,
        device: &wgpu::Device,
        kind: KernelKind,
        encoding: PixelEncoding,
    ) -> Result<(), EngineError> {
        if self.pipelines.contains_key(&(kind, encoding)) {
            return Ok(());
        }
        let label = format!("{kind:?} {encoding:?}");
        let shader = self.composer.compose(
            device,
            &label,
            kind.shader_source(),
            kind.shader_path(),
            encoding,
        )?;
        let pipeline = create_screen_space_pipeline(
            device,
            &label,
            &shader,
            encoding.texture_format(),
            &[&self.bind_group_layout],
        );
        debug!("compiled kernel pipeline {label}");
        let _ = self.pipelines.insert((kind, encoding), pipeline);
        Ok(())
    }

    /// Write the pass uniforms and record one full-screen draw from `input`
    /// into `output`.
    ///
    /// Uniforms are written through the queue, so each recorded pass must be
    /// submitted before the next one is recorded.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidPass`] for kernels without a shader program,
    /// [`EngineError::Shader`] if the pipeline fails to compose.
    pub fn record(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        pass: &ShaderPass,
        shape: TextureShape,
        input: &wgpu::TextureView,
        output: &wgpu::TextureView,
    ) -> Result<(), EngineError> {
        let kind = pass.kernel.kind().ok_or_else(|| {
            EngineError::InvalidPass(format!(
                "{} has no shader program",
                pass.kernel.name()
            ))
        })?;
        self.ensure_pipeline(device, kind, shape.encoding)?;
        let Some(pipeline) = self.pipelines.get(&(kind, shape.encoding))
        else {
            return Err(EngineError::Shader(format!(
                "pipeline {kind:?} missing after compilation"
            )));
        };

        let uniforms = KernelUniforms::from_pass(pass, shape.width);
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&uniforms));
        if let super::Kernel::Unitary { matrix, .. } = &pass.kernel {
            let packed = MatrixUniform::from_matrix(matrix);
            queue.write_buffer(&self.matrix_buffer, 0, bytemuck::bytes_of(&packed));
        }

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Kernel Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(input),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.matrix_buffer.as_entire_binding(),
                },
            ],
        });

        let mut render_pass =
            encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(pass.kernel.name()),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: output,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });
        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &bind_group, &[]);
        render_pass.draw(0..3, 0..1);
        Ok(())
    }
}
