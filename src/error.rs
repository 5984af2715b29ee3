//! Crate-level error types.

use std::fmt;

use crate::gpu::render_context::RenderContextError;
use crate::resource::TextureShape;

/// Errors produced by the kettex crate.
#[derive(Debug)]
pub enum EngineError {
    /// GPU context initialization or restoration failure.
    Gpu(RenderContextError),
    /// The device refused to allocate a texture.
    TextureAllocation {
        /// Operation that requested the texture.
        operation: &'static str,
        /// Requested texture shape.
        shape: TextureShape,
        /// Driver-provided detail.
        detail: String,
    },
    /// A texture was allocated but cannot serve as a render attachment.
    IncompleteFramebuffer {
        /// Operation that requested the attachment.
        operation: &'static str,
        /// Requested texture shape.
        shape: TextureShape,
        /// Driver-provided detail.
        detail: String,
    },
    /// A handle was used after its texture was released or lost.
    StaleHandle {
        /// Operation that used the handle.
        operation: &'static str,
        /// Shape of the texture the handle referred to.
        shape: TextureShape,
    },
    /// The rendering context was lost while an evaluation was in flight.
    ContextLost {
        /// Operation that observed the loss.
        operation: &'static str,
    },
    /// A shader pass failed to encode, run or read back.
    Pass {
        /// Kernel name.
        kernel: &'static str,
        /// Failure description.
        detail: String,
    },
    /// A pass is malformed (operand out of range, controls overlap operands).
    InvalidPass(String),
    /// The fault-injection kernel was invoked.
    InjectedFault(String),
    /// Shader composition failed.
    Shader(String),
    /// Unknown gate serialization id.
    UnknownGate(String),
    /// Unknown gate family id.
    UnknownFamily(String),
    /// A gate definition is inconsistent or clashes with a registered one.
    InvalidGate(String),
    /// Failed to parse or compile a persisted circuit.
    Circuit(String),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
}

impl EngineError {
    /// Whether the error aborts the current evaluation rather than being
    /// substituted or recovered from.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::UnknownGate(_)
                | Self::UnknownFamily(_)
                | Self::InjectedFault(_)
        )
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::TextureAllocation {
                operation,
                shape,
                detail,
            } => write!(
                f,
                "{operation}: texture allocation of {shape} failed: {detail}"
            ),
            Self::IncompleteFramebuffer {
                operation,
                shape,
                detail,
            } => write!(
                f,
                "{operation}: render attachment for {shape} is incomplete: \
                 {detail}"
            ),
            Self::StaleHandle { operation, shape } => {
                write!(f, "{operation}: stale texture handle for {shape}")
            }
            Self::ContextLost { operation } => {
                write!(f, "{operation}: rendering context lost mid-evaluation")
            }
            Self::Pass { kernel, detail } => {
                write!(f, "{kernel} pass failed: {detail}")
            }
            Self::InvalidPass(msg) => write!(f, "invalid shader pass: {msg}"),
            Self::InjectedFault(msg) => write!(f, "injected fault: {msg}"),
            Self::Shader(msg) => write!(f, "shader composition error: {msg}"),
            Self::UnknownGate(id) => write!(f, "unknown gate id '{id}'"),
            Self::UnknownFamily(id) => write!(f, "unknown gate family '{id}'"),
            Self::InvalidGate(msg) => write!(f, "invalid gate: {msg}"),
            Self::Circuit(msg) => write!(f, "circuit error: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderContextError> for EngineError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::PixelEncoding;

    #[test]
    fn allocation_failure_names_operation_and_dimensions() {
        let err = EngineError::TextureAllocation {
            operation: "acquire",
            shape: TextureShape::new(64, 32, PixelEncoding::Float),
            detail: "out of memory".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("acquire"));
        assert!(msg.contains("64x32"));
        assert!(err.is_fatal());
    }

    #[test]
    fn lookup_and_injected_faults_are_recoverable() {
        assert!(!EngineError::UnknownGate("nope".to_owned()).is_fatal());
        assert!(!EngineError::InjectedFault("boom".to_owned()).is_fatal());
        assert!(EngineError::ContextLost { operation: "bind" }.is_fatal());
    }
}
