use num_complex::Complex32;

use super::TextureShape;
use crate::error::EngineError;
use crate::kernel::ShaderPass;

/// Whether the rendering context is usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextStatus {
    /// Resources created on the context are valid.
    Live,
    /// The context was lost; every texture created on it is gone.
    Lost,
}

/// A rendering context that can hold amplitude textures and run kernels
/// over them.
///
/// Implementations: [`crate::gpu::WgpuBackend`] and
/// [`crate::kernel::reference::ReferenceBackend`].
pub trait Backend {
    /// A texture together with its render attachment.
    type Texture;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Report whether the context has been lost since it was created or
    /// last restored.
    fn context_status(&self) -> ContextStatus;

    /// Replace a lost context with a fresh one.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Gpu`] if no replacement context can be
    /// created.
    fn restore_context(&mut self) -> Result<(), EngineError>;

    /// Allocate a texture and validate that it can be rendered into.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TextureAllocation`] or
    /// [`EngineError::IncompleteFramebuffer`].
    fn allocate(
        &mut self,
        shape: TextureShape,
        label: &str,
    ) -> Result<Self::Texture, EngineError>;

    /// Overwrite a texture with host amplitudes (one per texel).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidPass`] if the amplitude count does not
    /// match the shape.
    fn upload(
        &mut self,
        texture: &Self::Texture,
        shape: TextureShape,
        amplitudes: &[Complex32],
    ) -> Result<(), EngineError>;

    /// Render one pass reading `input` and writing every texel of `output`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Pass`] if the pass cannot be encoded or run.
    fn render(
        &mut self,
        pass: &ShaderPass,
        shape: TextureShape,
        input: &Self::Texture,
        output: &Self::Texture,
    ) -> Result<(), EngineError>;

    /// Read a texture back to the host. Blocks until the queue drains.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Pass`] if the readback mapping fails.
    fn read(
        &mut self,
        texture: &Self::Texture,
        shape: TextureShape,
    ) -> Result<Vec<Complex32>, EngineError>;
}
