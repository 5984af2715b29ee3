//! Ordered shader-pass execution with ping-pong textures.
//!
//! [`PipelineExecutor::execute`] renders each pass from the current texture
//! into a fresh slot drawn from the [`TexturePool`], then returns the
//! superseded slot to the pool. At most two textures per evaluation are
//! checked out at any moment.

mod pool;
mod state;

pub use pool::TexturePool;
pub use state::AmplitudeState;

use log::debug;
use num_complex::Complex32;

use crate::error::EngineError;
use crate::kernel::ShaderPass;
use crate::options::EngineOptions;
use crate::resource::{
    Backend, PixelEncoding, ResourceManager, TextureKey, TextureShape,
};

/// Sequences shader passes over amplitude textures owned by a
/// [`ResourceManager`].
pub struct PipelineExecutor<B: Backend> {
    resources: ResourceManager<B>,
    pool: TexturePool,
    encoding: PixelEncoding,
    max_qubits: u32,
    max_idle_per_shape: usize,
}

impl<B: Backend> PipelineExecutor<B> {
    /// Executor over `backend` configured by `options`.
    pub fn new(backend: B, options: &EngineOptions) -> Self {
        Self {
            resources: ResourceManager::new(backend),
            pool: TexturePool::new(),
            encoding: options.pixel_encoding,
            max_qubits: options.max_qubits,
            max_idle_per_shape: options.pool.max_idle_per_shape,
        }
    }

    /// The resource manager.
    pub fn resources(&self) -> &ResourceManager<B> {
        &self.resources
    }

    /// Mutable access to the resource manager.
    pub fn resources_mut(&mut self) -> &mut ResourceManager<B> {
        &mut self.resources
    }

    /// The texture pool.
    pub fn pool(&self) -> &TexturePool {
        &self.pool
    }

    /// Texel encoding of new states.
    pub fn encoding(&self) -> PixelEncoding {
        self.encoding
    }

    /// A fresh `qubits`-qubit state in |0…0⟩.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidPass`] above the configured qubit limit;
    /// resource errors from texture acquisition.
    pub fn create_state(
        &mut self,
        qubits: u32,
    ) -> Result<AmplitudeState, EngineError> {
        let shape = self.shape_for(qubits)?;
        let mut amplitudes = vec![Complex32::default(); shape.texel_count()];
        amplitudes[0] = Complex32::new(1.0, 0.0);
        self.load(qubits, shape, &amplitudes)
    }

    /// A state holding the given amplitudes (one per basis state).
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidPass`] if the amplitude count is not
    /// `2^qubits` or the qubit limit is exceeded.
    pub fn upload_state(
        &mut self,
        qubits: u32,
        amplitudes: &[Complex32],
    ) -> Result<AmplitudeState, EngineError> {
        let shape = self.shape_for(qubits)?;
        self.load(qubits, shape, amplitudes)
    }

    /// Run `passes` in order and return the resulting state.
    ///
    /// The input state is consumed. On failure every texture the evaluation
    /// held is returned to the pool before the error propagates.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidPass`] for malformed passes,
    /// [`EngineError::InjectedFault`] from the fault-injection kernel,
    /// [`EngineError::ContextLost`] if the context was lost between passes,
    /// and resource or backend errors unchanged.
    pub fn execute(
        &mut self,
        state: AmplitudeState,
        passes: &[ShaderPass],
    ) -> Result<AmplitudeState, EngineError> {
        let qubits = state.qubits;
        let shape = state.shape();
        let mut current = state.handle;

        for (i, pass) in passes.iter().enumerate() {
            if let Err(e) = pass
                .validate(qubits)
                .and_then(|()| pass.kernel.check_invocable())
            {
                return Err(self.abandon(&[current.key()], e));
            }

            let input = match self.resources.acquire(current.key()) {
                Ok(handle) => handle,
                Err(e) => return Err(self.abandon(&[current.key()], e)),
            };
            if input != current {
                return Err(self.abandon(
                    &[current.key()],
                    EngineError::ContextLost {
                        operation: "execute",
                    },
                ));
            }

            let out_key = self.pool.take(shape);
            let rendered = self
                .resources
                .acquire(out_key)
                .and_then(|out| self.resources.render(pass, current, out).map(|()| out));
            match rendered {
                Ok(out) => {
                    debug!(
                        "pass {i}: {} slot {} -> {}",
                        pass.kernel.name(),
                        current.key().slot,
                        out_key.slot
                    );
                    let _ = self.pool.give_back(current.key());
                    current = out;
                }
                Err(e) => {
                    return Err(self.abandon(&[current.key(), out_key], e));
                }
            }
        }

        self.trim_pool();
        Ok(AmplitudeState {
            handle: current,
            qubits,
        })
    }

    /// Read all amplitudes back to the host. Pass order is unaffected.
    ///
    /// # Errors
    ///
    /// Resource errors for stale handles or lost contexts.
    pub fn read(
        &mut self,
        state: &AmplitudeState,
    ) -> Result<Vec<Complex32>, EngineError> {
        self.resources.read(state.handle)
    }

    /// Squared magnitude of every amplitude.
    ///
    /// # Errors
    ///
    /// See [`Self::read`].
    pub fn probabilities(
        &mut self,
        state: &AmplitudeState,
    ) -> Result<Vec<f64>, EngineError> {
        Ok(self
            .read(state)?
            .iter()
            .map(|a| f64::from(a.norm_sqr()))
            .collect())
    }

    /// Return a state's texture to the pool.
    pub fn discard(&mut self, state: AmplitudeState) {
        let _ = self.pool.give_back(state.handle.key());
        self.trim_pool();
    }

    fn shape_for(&self, qubits: u32) -> Result<TextureShape, EngineError> {
        if qubits > self.max_qubits {
            return Err(EngineError::InvalidPass(format!(
                "{qubits} qubits exceed the configured maximum of {}",
                self.max_qubits
            )));
        }
        TextureShape::for_qubits(qubits, self.encoding).ok_or_else(|| {
            EngineError::InvalidPass(format!(
                "{qubits} qubits have no texture layout"
            ))
        })
    }

    fn load(
        &mut self,
        qubits: u32,
        shape: TextureShape,
        amplitudes: &[Complex32],
    ) -> Result<AmplitudeState, EngineError> {
        let key = self.pool.take(shape);
        let loaded = self
            .resources
            .acquire(key)
            .and_then(|handle| self.resources.upload(handle, amplitudes).map(|()| handle));
        match loaded {
            Ok(handle) => Ok(AmplitudeState { handle, qubits }),
            Err(e) => Err(self.abandon(&[key], e)),
        }
    }

    fn abandon(&mut self, keys: &[TextureKey], error: EngineError) -> EngineError {
        for key in keys {
            let _ = self.pool.give_back(*key);
        }
        debug!("abandoning evaluation: {error}");
        error
    }

    fn trim_pool(&mut self) {
        for key in self.pool.trim(self.max_idle_per_shape) {
            let _ = self.resources.release(key);
        }
    }
}

impl<B: Backend> std::fmt::Debug for PipelineExecutor<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineExecutor")
            .field("resources", &self.resources)
            .field("pool", &self.pool)
            .field("encoding", &self.encoding)
            .field("max_qubits", &self.max_qubits)
            .finish_non_exhaustive()
    }
}
