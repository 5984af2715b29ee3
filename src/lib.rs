// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Function signature hygiene
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![warn(unused_results)]
#![warn(unused_qualifications)]
// Cast hygiene
#![warn(trivial_casts)]
#![warn(trivial_numeric_casts)]

//! GPU texture-backed quantum circuit amplitude engine built on wgpu.
//!
//! Kettex stores the 2^n complex amplitudes of an n-qubit register in a
//! two-channel texture and advances the state by rendering full-screen
//! fragment passes, one or more per circuit operation.
//!
//! # Key entry points
//!
//! - [`pipeline::PipelineExecutor`] - runs ordered shader passes with
//!   ping-pong textures drawn from a pooled cache
//! - [`resource::ResourceManager`] - context-scoped texture cache with
//!   transparent recovery from context loss
//! - [`kernel`] - the per-pixel kernels (swap, bit cycle, Fourier step,
//!   arithmetic, universal not, fault injection, dense unitary)
//! - [`catalog::GateCatalog`] - immutable gate definitions and span-indexed
//!   families, keyed by serialization id
//! - [`circuit::CircuitEvaluator`] - compiles persisted circuits into pass
//!   lists and reports evaluation-scoped failures
//!
//! # Backends
//!
//! Everything above the [`resource::Backend`] seam is backend-agnostic.
//! [`gpu::WgpuBackend`] renders through wgpu; [`kernel::reference`] evaluates
//! the same per-pixel gather functions on the host, which keeps the engine
//! usable (and testable) on machines without a GPU adapter.

pub mod catalog;
pub mod circuit;
pub mod error;
pub mod gpu;
pub mod kernel;
pub mod math;
pub mod options;
pub mod pipeline;
pub mod resource;

pub use error::EngineError;
