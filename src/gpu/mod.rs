//! wgpu device management and the GPU backend.
//!
//! Provides headless device initialization with device-loss tracking,
//! amplitude texture allocation, and shader composition.

mod backend;
/// Shared wgpu boilerplate helpers for full-screen kernel pipelines.
pub mod pipeline_helpers;
/// Headless wgpu device and queue initialization.
pub mod render_context;
/// WGSL shader composition with `#import` support via naga-oil.
pub mod shader_composer;
/// Amplitude texture allocation.
pub mod texture;

pub use backend::WgpuBackend;
