use num_complex::Complex64;
use rand::Rng;

use super::{GateBuilder, GateDefinition};
use crate::error::EngineError;
use crate::math::Matrix;

/// Id persisted for custom matrix gates; the matrix travels with it.
pub const CUSTOM_GATE_ID: &str = "?";

/// A fresh single-qubit gate with a uniformly random SU(2) unitary.
///
/// The matrix is fixed at construction, so the gate is as immutable as any
/// catalog entry. It is not registered; circuits persist it with its matrix
/// under [`CUSTOM_GATE_ID`].
///
/// # Errors
///
/// Propagates [`GateBuilder::build`] failures.
pub fn mystery_gate<R: Rng>(rng: &mut R) -> Result<GateDefinition, EngineError> {
    let q = random_unit_quaternion(rng);
    let matrix = Matrix::square(
        Complex64::new(q[0], q[1]),
        Complex64::new(q[2], q[3]),
        Complex64::new(-q[2], q[3]),
        Complex64::new(q[0], -q[1]),
    );
    GateBuilder::new(CUSTOM_GATE_ID, "?")
        .title("Mystery Gate")
        .blurb("Different every time.\n(Use a random unitary.)")
        .glyph("mystery")
        .matrix(matrix)
        .build()
}

/// A gate around a user-supplied unitary, persisted under `id` with its
/// matrix.
///
/// # Errors
///
/// [`EngineError::InvalidGate`] unless `matrix` is a unitary whose
/// dimension is a power of two.
pub fn custom_matrix_gate(
    id: impl Into<String>,
    matrix: Matrix,
) -> Result<GateDefinition, EngineError> {
    if matrix.qubit_span().is_none() {
        return Err(EngineError::InvalidGate(format!(
            "custom matrix dimension {} is not a power of two",
            matrix.dim()
        )));
    }
    GateBuilder::new(id, "?")
        .title("Custom Matrix Gate")
        .glyph("matrix")
        .matrix(matrix)
        .build()
}

fn random_unit_quaternion<R: Rng>(rng: &mut R) -> [f64; 4] {
    loop {
        let q: [f64; 4] = std::array::from_fn(|_| rng.random_range(-1.0..1.0));
        let norm_sq: f64 = q.iter().map(|x| x * x).sum();
        if norm_sq > 1e-6 && norm_sq <= 1.0 {
            let norm = norm_sq.sqrt();
            return q.map(|x| x / norm);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn mystery_gates_are_unitary_and_distinct() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = mystery_gate(&mut rng).unwrap();
        let b = mystery_gate(&mut rng).unwrap();
        let ma = a.matrix_at(0.0).unwrap();
        let mb = b.matrix_at(0.0).unwrap();
        assert!(ma.is_unitary(1e-9));
        assert!(!ma.approx_eq(&mb, 1e-9));
        assert_eq!(a.serialized_id(), CUSTOM_GATE_ID);
        assert!(a.is_stable());
    }

    #[test]
    fn custom_matrix_must_be_unitary() {
        let zero = Complex64::new(0.0, 0.0);
        let m = Matrix::square(zero, zero, zero, zero);
        assert!(custom_matrix_gate(CUSTOM_GATE_ID, m).is_err());
        let gate = custom_matrix_gate(CUSTOM_GATE_ID, Matrix::hadamard()).unwrap();
        assert_eq!(gate.height(), 1);
    }
}
