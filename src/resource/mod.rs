//! Context-scoped texture cache.
//!
//! The [`ResourceManager`] is the only component that touches a rendering
//! context. It owns a [`Backend`] (the wgpu device or the host reference
//! evaluator), lazily materializes one texture per logical [`TextureKey`],
//! and tracks each slot through an explicit
//! [`Lifecycle`]: `Uninitialized → Bound → Lost → Bound`.

mod backend;
mod handle;
mod manager;

pub use backend::{Backend, ContextStatus};
pub use handle::{
    Lifecycle, PixelEncoding, TextureHandle, TextureKey, TextureShape,
};
pub use manager::{ResourceManager, ResourceStats};
