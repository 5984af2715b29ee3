use crate::resource::{TextureHandle, TextureShape};

/// A register's amplitudes, held in one pooled texture.
///
/// Not `Clone`: a state is consumed by [`super::PipelineExecutor::execute`]
/// or [`super::PipelineExecutor::discard`], so its slot is returned to the
/// pool exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct AmplitudeState {
    pub(crate) handle: TextureHandle,
    pub(crate) qubits: u32,
}

impl AmplitudeState {
    /// Number of qubits.
    #[must_use]
    pub fn qubits(&self) -> u32 {
        self.qubits
    }

    /// Texture shape holding the amplitudes.
    #[must_use]
    pub fn shape(&self) -> TextureShape {
        self.handle.shape()
    }

    /// The texture currently holding the amplitudes.
    #[must_use]
    pub fn handle(&self) -> TextureHandle {
        self.handle
    }
}
