use log::{debug, warn};
use num_complex::Complex32;
use rustc_hash::FxHashMap;

use super::{Backend, ContextStatus, Lifecycle, TextureHandle, TextureKey};
use crate::error::EngineError;
use crate::kernel::ShaderPass;

enum Residency<T> {
    Bound { handle: TextureHandle, texture: T },
    Lost,
}

/// Counters describing cache behavior since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceStats {
    /// Textures created on the backend, including reinitializations.
    pub allocations: u64,
    /// Acquires answered from the cache.
    pub cache_hits: u64,
    /// Lost slots that were materialized again.
    pub reinitializations: u64,
    /// Context restorations performed.
    pub context_restorations: u64,
    /// Slots dropped through [`ResourceManager::release`].
    pub releases: u64,
}

/// Owns the rendering context and every texture created on it.
///
/// Each logical [`TextureKey`] maps to at most one live texture. Context
/// loss is checked at the start of every acquire: when the backend reports
/// a lost context, every bound slot is marked [`Lifecycle::Lost`], the
/// context is restored once, and lost slots are rebuilt lazily the next
/// time they are acquired.
pub struct ResourceManager<B: Backend> {
    backend: B,
    slots: FxHashMap<TextureKey, Residency<B::Texture>>,
    next_serial: u64,
    stats: ResourceStats,
}

impl<B: Backend> ResourceManager<B> {
    /// Take ownership of a backend.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            slots: FxHashMap::default(),
            next_serial: 0,
            stats: ResourceStats::default(),
        }
    }

    /// The owned backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the owned backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Cache counters.
    pub fn stats(&self) -> ResourceStats {
        self.stats
    }

    /// Number of slots currently backed by a live texture.
    pub fn live_textures(&self) -> usize {
        self.slots
            .values()
            .filter(|r| matches!(r, Residency::Bound { .. }))
            .count()
    }

    /// Current lifecycle of `key`.
    pub fn lifecycle(&self, key: TextureKey) -> Lifecycle {
        match self.slots.get(&key) {
            None => Lifecycle::Uninitialized,
            Some(Residency::Bound { .. }) => Lifecycle::Bound,
            Some(Residency::Lost) => Lifecycle::Lost,
        }
    }

    /// Return the handle for `key`, creating or rebuilding its texture when
    /// needed. Repeated acquires without loss return the same handle.
    ///
    /// # Errors
    ///
    /// Allocation and framebuffer failures are returned unchanged and are
    /// fatal. A failed context restoration returns [`EngineError::Gpu`].
    pub fn acquire(
        &mut self,
        key: TextureKey,
    ) -> Result<TextureHandle, EngineError> {
        self.sync_context()?;

        let was_lost = match self.slots.get(&key) {
            Some(Residency::Bound { handle, .. }) => {
                self.stats.cache_hits += 1;
                return Ok(*handle);
            }
            Some(Residency::Lost) => true,
            None => false,
        };

        let shape = key.shape;
        if shape.width == 0 || shape.height == 0 {
            return Err(EngineError::TextureAllocation {
                operation: "acquire",
                shape,
                detail: "texture dimensions must be non-zero".to_owned(),
            });
        }

        let label = format!("amplitudes {shape} #{}", key.slot);
        let texture = self.backend.allocate(shape, &label)?;
        let handle = TextureHandle {
            key,
            serial: self.next_serial,
        };
        self.next_serial += 1;
        self.stats.allocations += 1;
        if was_lost {
            self.stats.reinitializations += 1;
            debug!("reinitialized {label} after context loss");
        }
        let _ = self.slots.insert(key, Residency::Bound { handle, texture });
        Ok(handle)
    }

    /// Drop the texture for `key`. Returns whether a slot existed.
    pub fn release(&mut self, key: TextureKey) -> bool {
        let existed = self.slots.remove(&key).is_some();
        if existed {
            self.stats.releases += 1;
        }
        existed
    }

    /// Resolve a handle to its live texture.
    ///
    /// # Errors
    ///
    /// [`EngineError::ContextLost`] if the context has been lost since the
    /// last acquire; [`EngineError::StaleHandle`] if the slot was released,
    /// lost or rebuilt under a newer handle.
    pub fn bind(
        &self,
        handle: TextureHandle,
    ) -> Result<&B::Texture, EngineError> {
        if self.backend.context_status() == ContextStatus::Lost {
            return Err(EngineError::ContextLost { operation: "bind" });
        }
        Self::bound(&self.slots, handle, "bind")
    }

    /// Overwrite a texture with host amplitudes.
    ///
    /// # Errors
    ///
    /// See [`Self::bind`] and [`Backend::upload`].
    pub fn upload(
        &mut self,
        handle: TextureHandle,
        amplitudes: &[Complex32],
    ) -> Result<(), EngineError> {
        self.ensure_live("upload")?;
        let texture = Self::bound(&self.slots, handle, "upload")?;
        self.backend.upload(texture, handle.shape(), amplitudes)
    }

    /// Render `pass` from `input` into `output`.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidPass`] if the textures alias or differ in
    /// shape, otherwise see [`Self::bind`] and [`Backend::render`].
    pub fn render(
        &mut self,
        pass: &ShaderPass,
        input: TextureHandle,
        output: TextureHandle,
    ) -> Result<(), EngineError> {
        if input.key == output.key {
            return Err(EngineError::InvalidPass(
                "pass output aliases its input".to_owned(),
            ));
        }
        if input.shape() != output.shape() {
            return Err(EngineError::InvalidPass(format!(
                "input {} and output {} differ in shape",
                input.shape(),
                output.shape()
            )));
        }
        self.ensure_live("render")?;
        let source = Self::bound(&self.slots, input, "render")?;
        let target = Self::bound(&self.slots, output, "render")?;
        self.backend.render(pass, input.shape(), source, target)
    }

    /// Read a texture back to the host.
    ///
    /// # Errors
    ///
    /// See [`Self::bind`] and [`Backend::read`].
    pub fn read(
        &mut self,
        handle: TextureHandle,
    ) -> Result<Vec<Complex32>, EngineError> {
        self.ensure_live("read")?;
        let texture = Self::bound(&self.slots, handle, "read")?;
        self.backend.read(texture, handle.shape())
    }

    fn ensure_live(&self, operation: &'static str) -> Result<(), EngineError> {
        match self.backend.context_status() {
            ContextStatus::Live => Ok(()),
            ContextStatus::Lost => Err(EngineError::ContextLost { operation }),
        }
    }

    fn bound<'a>(
        slots: &'a FxHashMap<TextureKey, Residency<B::Texture>>,
        handle: TextureHandle,
        operation: &'static str,
    ) -> Result<&'a B::Texture, EngineError> {
        match slots.get(&handle.key) {
            Some(Residency::Bound { handle: h, texture }) if *h == handle => {
                Ok(texture)
            }
            _ => Err(EngineError::StaleHandle {
                operation,
                shape: handle.shape(),
            }),
        }
    }

    /// Invalidate every slot and restore the context if it was lost.
    fn sync_context(&mut self) -> Result<(), EngineError> {
        if self.backend.context_status() == ContextStatus::Live {
            return Ok(());
        }
        let lost = self.live_textures();
        warn!(
            "{} context lost; invalidating {lost} cached texture(s)",
            self.backend.name()
        );
        for residency in self.slots.values_mut() {
            *residency = Residency::Lost;
        }
        self.backend.restore_context()?;
        self.stats.context_restorations += 1;
        Ok(())
    }
}

impl<B: Backend> std::fmt::Debug for ResourceManager<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManager")
            .field("backend", &self.backend.name())
            .field("slots", &self.slots.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::reference::ReferenceBackend;
    use crate::resource::{PixelEncoding, TextureShape};

    fn key(slot: u32) -> TextureKey {
        TextureKey {
            shape: TextureShape::for_qubits(3, PixelEncoding::Float).unwrap(),
            slot,
        }
    }

    #[test]
    fn repeated_acquire_returns_the_cached_handle() {
        let mut rm = ResourceManager::new(ReferenceBackend::new());
        let a = rm.acquire(key(0)).unwrap();
        let b = rm.acquire(key(0)).unwrap();
        assert_eq!(a, b);
        assert_eq!(rm.stats().allocations, 1);
        assert_eq!(rm.stats().cache_hits, 1);
        assert_eq!(rm.lifecycle(key(0)), Lifecycle::Bound);
    }

    #[test]
    fn distinct_slots_get_distinct_textures() {
        let mut rm = ResourceManager::new(ReferenceBackend::new());
        let a = rm.acquire(key(0)).unwrap();
        let b = rm.acquire(key(1)).unwrap();
        assert_ne!(a, b);
        assert_eq!(rm.live_textures(), 2);
    }

    #[test]
    fn context_loss_reinitializes_each_slot_exactly_once() {
        let mut rm = ResourceManager::new(ReferenceBackend::new());
        let before = rm.acquire(key(0)).unwrap();
        let _ = rm.acquire(key(1)).unwrap();

        rm.backend_mut().simulate_context_loss();
        assert!(matches!(
            rm.bind(before),
            Err(EngineError::ContextLost { .. })
        ));

        let after = rm.acquire(key(0)).unwrap();
        assert_ne!(before, after);
        assert_eq!(rm.lifecycle(key(1)), Lifecycle::Lost);
        let again = rm.acquire(key(0)).unwrap();
        assert_eq!(after, again);

        let stats = rm.stats();
        assert_eq!(stats.context_restorations, 1);
        assert_eq!(stats.reinitializations, 1);
        assert_eq!(stats.allocations, 3);

        // The pre-loss handle no longer binds.
        assert!(matches!(
            rm.bind(before),
            Err(EngineError::StaleHandle { .. })
        ));
        assert!(rm.bind(after).is_ok());
    }

    #[test]
    fn released_handles_are_stale() {
        let mut rm = ResourceManager::new(ReferenceBackend::new());
        let h = rm.acquire(key(0)).unwrap();
        assert!(rm.release(key(0)));
        assert!(!rm.release(key(0)));
        assert_eq!(rm.lifecycle(key(0)), Lifecycle::Uninitialized);
        assert!(matches!(
            rm.read(h),
            Err(EngineError::StaleHandle { .. })
        ));
    }

    #[test]
    fn allocation_failure_is_reported_with_shape() {
        let mut rm =
            ResourceManager::new(ReferenceBackend::with_max_dimension(4));
        let big = TextureKey {
            shape: TextureShape::for_qubits(6, PixelEncoding::Float).unwrap(),
            slot: 0,
        };
        let err = rm.acquire(big).unwrap_err();
        assert!(matches!(err, EngineError::TextureAllocation { .. }));
        assert!(err.to_string().contains("8x8"));
        assert!(err.is_fatal());
        assert_eq!(rm.lifecycle(big), Lifecycle::Uninitialized);
    }

    #[test]
    fn render_rejects_aliased_textures() {
        let mut rm = ResourceManager::new(ReferenceBackend::new());
        let h = rm.acquire(key(0)).unwrap();
        let pass = ShaderPass::new(crate::kernel::Kernel::Swap {
            bit_a: 0,
            bit_b: 1,
        });
        assert!(matches!(
            rm.render(&pass, h, h),
            Err(EngineError::InvalidPass(_))
        ));
    }
}
