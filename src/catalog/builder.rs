use std::sync::Arc;

use super::definition::{GateBody, GateContext, GateDefinition, GateRole};
use crate::error::EngineError;
use crate::kernel::{Kernel, MAX_REGISTER_SPAN};
use crate::math::Matrix;

const UNITARY_TOLERANCE: f64 = 1e-6;

/// Assembles a [`GateDefinition`].
///
/// ```
/// use kettex::catalog::GateBuilder;
/// use kettex::math::Matrix;
///
/// let h = GateBuilder::new("H", "H")
///     .title("Hadamard Gate")
///     .matrix(Matrix::hadamard())
///     .build()
///     .unwrap();
/// assert_eq!(h.height(), 1);
/// ```
#[must_use]
pub struct GateBuilder {
    gate: GateDefinition,
}

impl GateBuilder {
    /// Start a one-wire stable operation with no body.
    pub fn new(id: impl Into<String>, symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        Self {
            gate: GateDefinition {
                serialized_id: id.into(),
                title: symbol.clone(),
                symbol,
                blurb: String::new(),
                height: 1,
                body: GateBody::None,
                known_matrix: None,
                stable: true,
                glyph: "matrix".to_owned(),
                role: GateRole::Operation,
                adjoint_id: None,
            },
        }
    }

    /// Display name.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.gate.title = title.into();
        self
    }

    /// Description.
    pub fn blurb(mut self, blurb: impl Into<String>) -> Self {
        self.gate.blurb = blurb.into();
        self
    }

    /// Number of wires covered. Matrix bodies set this themselves.
    pub const fn height(mut self, height: u32) -> Self {
        self.gate.height = height;
        self
    }

    /// Rendering-capability identifier.
    pub fn glyph(mut self, glyph: impl Into<String>) -> Self {
        self.gate.glyph = glyph.into();
        self
    }

    /// Column role.
    pub const fn role(mut self, role: GateRole) -> Self {
        self.gate.role = role;
        self
    }

    /// Serialization id of the inverse gate.
    pub fn adjoint(mut self, id: impl Into<String>) -> Self {
        self.gate.adjoint_id = Some(id.into());
        self
    }

    /// Mark the effect as time-dependent.
    pub const fn unstable(mut self) -> Self {
        self.gate.stable = false;
        self
    }

    /// A fixed unitary body. The height follows the matrix dimension.
    pub fn matrix(mut self, matrix: Matrix) -> Self {
        if let Some(span) = matrix.qubit_span() {
            self.gate.height = span;
        }
        self.gate.body = GateBody::Matrix(matrix);
        self
    }

    /// A time-varying unitary body; the gate becomes unstable.
    pub fn time_varying(
        mut self,
        f: impl Fn(f64) -> Matrix + Send + Sync + 'static,
    ) -> Self {
        self.gate.body = GateBody::TimeVarying(Arc::new(f));
        self.gate.stable = false;
        self
    }

    /// An explicit kernel-list body.
    pub fn kernels(
        mut self,
        f: impl Fn(&GateContext) -> Result<Vec<Kernel>, EngineError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.gate.body = GateBody::Kernels(Arc::new(f));
        self
    }

    /// The unitary a kernel-list body is known to implement.
    pub fn known_matrix(mut self, matrix: Matrix) -> Self {
        self.gate.known_matrix = Some(matrix);
        self
    }

    /// Validate and finish.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidGate`] when the id is empty, the height is
    /// outside `1..=16`, or a matrix (static, known, or a time-varying
    /// body sampled at `t = 0`) has the wrong dimension or is not unitary.
    pub fn build(self) -> Result<GateDefinition, EngineError> {
        let gate = self.gate;
        let fail = |msg: String| {
            Err(EngineError::InvalidGate(format!(
                "{}: {msg}",
                gate.serialized_id
            )))
        };
        if gate.serialized_id.is_empty() {
            return Err(EngineError::InvalidGate(
                "gate id must not be empty".to_owned(),
            ));
        }
        if gate.height == 0 || gate.height > MAX_REGISTER_SPAN {
            return fail(format!(
                "height {} outside 1..={MAX_REGISTER_SPAN}",
                gate.height
            ));
        }
        let sampled = match &gate.body {
            GateBody::Matrix(m) => Some(m.clone()),
            GateBody::TimeVarying(f) => Some(f(0.0)),
            GateBody::Kernels(_) | GateBody::None => None,
        };
        for matrix in sampled.iter().chain(gate.known_matrix.iter()) {
            if matrix.dim() != 1usize << gate.height {
                return fail(format!(
                    "{}x{} matrix does not cover {} wires",
                    matrix.dim(),
                    matrix.dim(),
                    gate.height
                ));
            }
            if !matrix.is_unitary(UNITARY_TOLERANCE) {
                return fail("matrix is not unitary".to_owned());
            }
        }
        Ok(gate)
    }
}

#[cfg(test)]
mod tests {
    use num_complex::Complex64;

    use super::*;
    use crate::math::PauliAxis;

    #[test]
    fn matrix_sets_height() {
        let gate = GateBuilder::new("Swap2", "S")
            .matrix(Matrix::permutation(4, |i| ((i & 1) << 1) | (i >> 1)))
            .build()
            .unwrap();
        assert_eq!(gate.height(), 2);
        assert!(gate.is_stable());
    }

    #[test]
    fn non_unitary_matrix_is_rejected() {
        let m = Matrix::diagonal(&[Complex64::new(2.0, 0.0), Complex64::new(1.0, 0.0)]);
        let err = GateBuilder::new("bad", "B").matrix(m).build().unwrap_err();
        assert!(matches!(err, EngineError::InvalidGate(msg) if msg.contains("bad")));
    }

    #[test]
    fn known_matrix_must_match_height() {
        let err = GateBuilder::new("k", "K")
            .height(2)
            .kernels(|_| Ok(Vec::new()))
            .known_matrix(Matrix::hadamard())
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn time_varying_gates_are_unstable() {
        let gate = GateBuilder::new("Z^t", "Z^t")
            .time_varying(|t| Matrix::pauli_power(PauliAxis::Z, 2.0 * t))
            .build()
            .unwrap();
        assert!(!gate.is_stable());
        let half = gate.matrix_at(0.5).unwrap();
        assert!(half.approx_eq(&Matrix::pauli(PauliAxis::Z), 1e-9));
    }

    #[test]
    fn empty_id_and_zero_height_are_rejected() {
        assert!(GateBuilder::new("", "E").build().is_err());
        assert!(GateBuilder::new("z", "Z").height(0).build().is_err());
    }
}
