use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::error::EngineError;
use crate::kernel::{Kernel, MAX_UNITARY_SPAN};
use crate::math::Matrix;

/// Produces the matrix of a time-varying gate at `time` in `[0, 1)`.
pub type MatrixFn = Arc<dyn Fn(f64) -> Matrix + Send + Sync>;

/// Produces the kernels of a gate placed in a circuit column.
pub type KernelFn =
    Arc<dyn Fn(&GateContext) -> Result<Vec<Kernel>, EngineError> + Send + Sync>;

/// A contiguous run of wires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Register {
    /// Lowest wire.
    pub offset: u32,
    /// Number of wires.
    pub span: u32,
}

/// Where a gate sits when its kernels are requested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateContext {
    /// Lowest wire the gate covers.
    pub offset: u32,
    /// Number of wires the gate covers.
    pub span: u32,
    /// Animation time in `[0, 1)`.
    pub time: f64,
    /// The column's `inputA` register, if one is placed.
    pub input_a: Option<Register>,
}

impl GateContext {
    /// A context at `offset` with the gate's own span, at time zero.
    #[must_use]
    pub const fn at(offset: u32, span: u32) -> Self {
        Self {
            offset,
            span,
            time: 0.0,
            input_a: None,
        }
    }

    /// The `inputA` register, or a [`EngineError::Circuit`] naming `symbol`.
    ///
    /// # Errors
    ///
    /// See above.
    pub fn require_input_a(&self, symbol: &str) -> Result<Register, EngineError> {
        self.input_a.ok_or_else(|| {
            EngineError::Circuit(format!(
                "{symbol} needs an inputA register in the same column"
            ))
        })
    }
}

/// What a gate does to the state.
#[derive(Clone)]
pub enum GateBody {
    /// Nothing: controls, spacers, input markers, placeholders.
    None,
    /// A fixed unitary.
    Matrix(Matrix),
    /// A unitary that depends on animation time.
    TimeVarying(MatrixFn),
    /// An explicit kernel sequence.
    Kernels(KernelFn),
}

impl GateBody {
    const fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Matrix(_) => "matrix",
            Self::TimeVarying(_) => "time_varying",
            Self::Kernels(_) => "kernels",
        }
    }
}

impl fmt::Debug for GateBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matrix(m) => f.debug_tuple("Matrix").field(m).finish(),
            other => f.write_str(other.kind()),
        }
    }
}

/// How a cell participates in its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateRole {
    /// Transforms the state.
    Operation,
    /// Conditions the column's operations on its wire being `required`.
    Control {
        /// `true` for `•`, `false` for `◦`.
        required: bool,
    },
    /// One end of a swap; a column holds zero or two.
    SwapHalf,
    /// Marks the wires read as register A by arithmetic gates.
    InputRegister,
    /// Occupies space and does nothing.
    Spacer,
    /// An id the catalog could not resolve.
    Placeholder,
}

/// An immutable gate.
///
/// Built with [`super::GateBuilder`]; the catalog hands out shared
/// references and never mutates a definition after registration.
#[derive(Clone)]
pub struct GateDefinition {
    pub(super) serialized_id: String,
    pub(super) symbol: String,
    pub(super) title: String,
    pub(super) blurb: String,
    pub(super) height: u32,
    pub(super) body: GateBody,
    pub(super) known_matrix: Option<Matrix>,
    pub(super) stable: bool,
    pub(super) glyph: String,
    pub(super) role: GateRole,
    pub(super) adjoint_id: Option<String>,
}

/// Serializable view of a definition, also used for structural equality.
#[derive(Debug, Serialize, PartialEq)]
struct Descriptor<'a> {
    id: &'a str,
    symbol: &'a str,
    title: &'a str,
    blurb: &'a str,
    height: u32,
    body: &'static str,
    stable: bool,
    glyph: &'a str,
    role: GateRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    adjoint: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    matrix: Option<&'a Matrix>,
}

impl GateDefinition {
    /// Stand-in for an id the catalog does not know. Serializes back to
    /// `id` and does nothing when evaluated.
    #[must_use]
    pub fn placeholder(id: &str) -> Self {
        Self {
            serialized_id: id.to_owned(),
            symbol: "?".to_owned(),
            title: "Unknown Gate".to_owned(),
            blurb: format!("No gate is registered under '{id}'."),
            height: 1,
            body: GateBody::None,
            known_matrix: None,
            stable: true,
            glyph: "placeholder".to_owned(),
            role: GateRole::Placeholder,
            adjoint_id: None,
        }
    }

    /// Unique serialization id.
    #[must_use]
    pub fn serialized_id(&self) -> &str {
        &self.serialized_id
    }

    /// Short label drawn on the gate.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Display name.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// One-paragraph description.
    #[must_use]
    pub fn blurb(&self) -> &str {
        &self.blurb
    }

    /// Number of wires covered.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// The gate's effect.
    #[must_use]
    pub const fn body(&self) -> &GateBody {
        &self.body
    }

    /// Whether the effect does not depend on time.
    #[must_use]
    pub const fn is_stable(&self) -> bool {
        self.stable
    }

    /// Opaque rendering-capability identifier.
    #[must_use]
    pub fn glyph(&self) -> &str {
        &self.glyph
    }

    /// Column role.
    #[must_use]
    pub const fn role(&self) -> GateRole {
        self.role
    }

    /// Serialization id of the inverse gate, if declared.
    #[must_use]
    pub fn adjoint_id(&self) -> Option<&str> {
        self.adjoint_id.as_deref()
    }

    /// The unitary at `time`, when one is known.
    #[must_use]
    pub fn matrix_at(&self, time: f64) -> Option<Matrix> {
        match &self.body {
            GateBody::Matrix(m) => Some(m.clone()),
            GateBody::TimeVarying(f) => Some(f(time)),
            GateBody::Kernels(_) | GateBody::None => self.known_matrix.clone(),
        }
    }

    /// Kernels implementing the gate at `context`.
    ///
    /// Matrix bodies become a single dense-unitary kernel; kernel-list
    /// bodies are evaluated; gates without a body yield nothing.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidGate`] when a matrix gate is wider than
    /// [`MAX_UNITARY_SPAN`], or whatever the kernel function reports.
    pub fn kernels(&self, context: &GateContext) -> Result<Vec<Kernel>, EngineError> {
        let matrix = match &self.body {
            GateBody::None => return Ok(Vec::new()),
            GateBody::Kernels(f) => return f(context),
            GateBody::Matrix(m) => m.clone(),
            GateBody::TimeVarying(f) => f(context.time),
        };
        if self.height > MAX_UNITARY_SPAN {
            return Err(EngineError::InvalidGate(format!(
                "{}: {}-qubit matrix gates are not supported (max {MAX_UNITARY_SPAN})",
                self.serialized_id, self.height
            )));
        }
        Ok(vec![Kernel::Unitary {
            offset: context.offset,
            span: self.height,
            matrix,
        }])
    }

    fn descriptor(&self) -> Descriptor<'_> {
        let matrix = match &self.body {
            GateBody::Matrix(m) => Some(m),
            _ => self.known_matrix.as_ref(),
        };
        Descriptor {
            id: &self.serialized_id,
            symbol: &self.symbol,
            title: &self.title,
            blurb: &self.blurb,
            height: self.height,
            body: self.body.kind(),
            stable: self.stable,
            glyph: &self.glyph,
            role: self.role,
            adjoint: self.adjoint_id.as_deref(),
            matrix,
        }
    }
}

impl fmt::Debug for GateDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateDefinition")
            .field("id", &self.serialized_id)
            .field("height", &self.height)
            .field("role", &self.role)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

/// Structural equality: metadata, body kind and any static matrix.
/// Function bodies compare equal when their kinds match.
impl PartialEq for GateDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor() == other.descriptor()
    }
}

impl Serialize for GateDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.descriptor().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_keeps_its_id_and_does_nothing() {
        let gate = GateDefinition::placeholder("Frobnicate7");
        assert_eq!(gate.serialized_id(), "Frobnicate7");
        assert_eq!(gate.role(), GateRole::Placeholder);
        assert!(gate.kernels(&GateContext::at(0, 1)).unwrap().is_empty());
        assert!(gate.matrix_at(0.0).is_none());
    }

    #[test]
    fn descriptor_serializes_renderer_fields() {
        let gate = GateDefinition::placeholder("x");
        let value = serde_json::to_value(&gate).unwrap();
        assert_eq!(value["id"], "x");
        assert_eq!(value["glyph"], "placeholder");
        assert_eq!(value["role"], "placeholder");
        assert!(value.get("matrix").is_none());
    }

    #[test]
    fn missing_input_register_is_a_circuit_error() {
        let ctx = GateContext::at(0, 2);
        assert!(matches!(
            ctx.require_input_a("+=A"),
            Err(EngineError::Circuit(_))
        ));
    }
}
