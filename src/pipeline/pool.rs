use rustc_hash::{FxHashMap, FxHashSet};

use crate::resource::{TextureKey, TextureShape};

/// Size-keyed free lists of texture slots.
///
/// The pool hands out [`TextureKey`]s; the resource manager decides whether
/// a key is already backed by a live texture. A key is either checked out
/// or idle, never both.
#[derive(Debug, Default)]
pub struct TexturePool {
    idle: FxHashMap<TextureShape, Vec<u32>>,
    next_slot: FxHashMap<TextureShape, u32>,
    checked_out: FxHashSet<TextureKey>,
}

impl TexturePool {
    /// Empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check out a slot of `shape`, reusing the most recently returned one.
    pub fn take(&mut self, shape: TextureShape) -> TextureKey {
        let slot = self
            .idle
            .get_mut(&shape)
            .and_then(Vec::pop)
            .unwrap_or_else(|| {
                let next = self.next_slot.entry(shape).or_insert(0);
                let slot = *next;
                *next += 1;
                slot
            });
        let key = TextureKey { shape, slot };
        let _ = self.checked_out.insert(key);
        key
    }

    /// Return a checked-out slot. Returns `false` (and does nothing) for
    /// keys that are not checked out.
    pub fn give_back(&mut self, key: TextureKey) -> bool {
        if !self.checked_out.remove(&key) {
            return false;
        }
        self.idle.entry(key.shape).or_default().push(key.slot);
        true
    }

    /// Drop idle slots beyond `max_idle` per shape and return their keys so
    /// the caller can release the textures.
    pub fn trim(&mut self, max_idle: usize) -> Vec<TextureKey> {
        let mut surplus = Vec::new();
        for (shape, slots) in &mut self.idle {
            let excess = slots.len().saturating_sub(max_idle);
            surplus.extend(slots.drain(..excess).map(|slot| TextureKey {
                shape: *shape,
                slot,
            }));
        }
        surplus
    }

    /// Idle slots of `shape`.
    #[must_use]
    pub fn idle_count(&self, shape: TextureShape) -> usize {
        self.idle.get(&shape).map_or(0, Vec::len)
    }

    /// Slots currently checked out.
    #[must_use]
    pub fn checked_out_count(&self) -> usize {
        self.checked_out.len()
    }
}
