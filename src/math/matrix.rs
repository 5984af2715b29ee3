use std::f64::consts::{FRAC_1_SQRT_2, PI, TAU};
use std::ops::Mul;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Pauli rotation axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PauliAxis {
    /// Bit flip.
    X,
    /// Bit and phase flip.
    Y,
    /// Phase flip.
    Z,
}

/// Square complex matrix stored row-major.
///
/// Serializes as nested rows of `[re, im]` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<[f64; 2]>>", into = "Vec<Vec<[f64; 2]>>")]
pub struct Matrix {
    dim: usize,
    data: Vec<Complex64>,
}

impl Matrix {
    /// Build a `dim` x `dim` matrix from row-major entries.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidGate`] if `data` is not `dim * dim`
    /// entries long or `dim` is zero.
    pub fn new(dim: usize, data: Vec<Complex64>) -> Result<Self, EngineError> {
        if dim == 0 || data.len() != dim * dim {
            return Err(EngineError::InvalidGate(format!(
                "matrix of dimension {dim} needs {} entries, got {}",
                dim * dim,
                data.len()
            )));
        }
        Ok(Self { dim, data })
    }

    /// Build a matrix by evaluating `entry(row, col)`.
    pub fn generate(
        dim: usize,
        entry: impl Fn(usize, usize) -> Complex64,
    ) -> Self {
        let mut data = Vec::with_capacity(dim * dim);
        for r in 0..dim {
            for c in 0..dim {
                data.push(entry(r, c));
            }
        }
        Self { dim, data }
    }

    /// 2x2 matrix `[[a, b], [c, d]]`.
    #[must_use]
    pub fn square(
        a: Complex64,
        b: Complex64,
        c: Complex64,
        d: Complex64,
    ) -> Self {
        Self {
            dim: 2,
            data: vec![a, b, c, d],
        }
    }

    /// Identity of the given dimension.
    #[must_use]
    pub fn identity(dim: usize) -> Self {
        Self::generate(dim, |r, c| {
            if r == c {
                Complex64::new(1.0, 0.0)
            } else {
                Complex64::new(0.0, 0.0)
            }
        })
    }

    /// Diagonal matrix with the given entries.
    #[must_use]
    pub fn diagonal(entries: &[Complex64]) -> Self {
        Self::generate(entries.len(), |r, c| {
            if r == c {
                entries[r]
            } else {
                Complex64::new(0.0, 0.0)
            }
        })
    }

    /// The Hadamard matrix.
    #[must_use]
    pub fn hadamard() -> Self {
        let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
        Self::square(h, h, h, -h)
    }

    /// The Pauli matrix for `axis`.
    #[must_use]
    pub fn pauli(axis: PauliAxis) -> Self {
        let zero = Complex64::new(0.0, 0.0);
        let one = Complex64::new(1.0, 0.0);
        let i = Complex64::new(0.0, 1.0);
        match axis {
            PauliAxis::X => Self::square(zero, one, one, zero),
            PauliAxis::Y => Self::square(zero, -i, i, zero),
            PauliAxis::Z => Self::square(one, zero, zero, -one),
        }
    }

    /// `P^exponent` for a Pauli matrix `P`, using the branch that keeps the
    /// |0⟩ eigenvector of Z fixed: `e^{iπt/2} (cos(πt/2) I - i sin(πt/2) P)`.
    #[must_use]
    pub fn pauli_power(axis: PauliAxis, exponent: f64) -> Self {
        let half = PI * exponent / 2.0;
        let global = Complex64::from_polar(1.0, half);
        let cos = Complex64::new(half.cos(), 0.0);
        let minus_i_sin = Complex64::new(0.0, -half.sin());
        let pauli = Self::pauli(axis);
        Self::generate(2, |r, c| {
            let id = if r == c { cos } else { Complex64::new(0.0, 0.0) };
            global * (id + minus_i_sin * pauli.get(r, c))
        })
    }

    /// Closed-form discrete Fourier transform over `span` qubits:
    /// `ω^(r·c) / √N` with `ω = e^(τi/N)`.
    #[must_use]
    pub fn fourier(span: u32) -> Self {
        let n = 1usize << span;
        let scale = 1.0 / (n as f64).sqrt();
        Self::generate(n, |r, c| {
            let angle = TAU * ((r * c) % n) as f64 / n as f64;
            Complex64::from_polar(scale, angle)
        })
    }

    /// Permutation matrix sending basis state `|x⟩` to `|f(x)⟩`.
    #[must_use]
    pub fn permutation(dim: usize, f: impl Fn(usize) -> usize) -> Self {
        let mut data = vec![Complex64::new(0.0, 0.0); dim * dim];
        for x in 0..dim {
            data[(f(x) % dim) * dim + x] = Complex64::new(1.0, 0.0);
        }
        Self { dim, data }
    }

    /// Matrix dimension (rows == columns).
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of qubits this matrix acts on, if the dimension is a power of
    /// two.
    #[must_use]
    pub fn qubit_span(&self) -> Option<u32> {
        self.dim
            .is_power_of_two()
            .then(|| self.dim.trailing_zeros())
    }

    /// Entry at `(row, col)`.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.data[row * self.dim + col]
    }

    /// Row-major entries.
    #[must_use]
    pub fn entries(&self) -> &[Complex64] {
        &self.data
    }

    /// Conjugate transpose.
    #[must_use]
    pub fn adjoint(&self) -> Self {
        Self::generate(self.dim, |r, c| self.get(c, r).conj())
    }

    /// Multiply a column vector.
    #[must_use]
    pub fn apply(&self, vector: &[Complex64]) -> Vec<Complex64> {
        (0..self.dim)
            .map(|r| {
                (0..self.dim)
                    .map(|c| self.get(r, c) * vector.get(c).copied().unwrap_or_default())
                    .sum()
            })
            .collect()
    }

    /// Entry-wise comparison within `tolerance`.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        self.dim == other.dim
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| (a - b).norm() <= tolerance)
    }

    /// Whether `M · M† = I` within `tolerance`.
    #[must_use]
    pub fn is_unitary(&self, tolerance: f64) -> bool {
        (self * &self.adjoint()).approx_eq(&Self::identity(self.dim), tolerance)
    }
}

impl Mul for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: &Matrix) -> Matrix {
        let n = self.dim.min(rhs.dim);
        Matrix::generate(n, |r, c| {
            (0..n).map(|k| self.get(r, k) * rhs.get(k, c)).sum()
        })
    }
}

impl TryFrom<Vec<Vec<[f64; 2]>>> for Matrix {
    type Error = EngineError;

    fn try_from(rows: Vec<Vec<[f64; 2]>>) -> Result<Self, Self::Error> {
        let dim = rows.len();
        if rows.iter().any(|row| row.len() != dim) {
            return Err(EngineError::InvalidGate(
                "matrix rows must form a square".to_owned(),
            ));
        }
        let data = rows
            .into_iter()
            .flatten()
            .map(|[re, im]| Complex64::new(re, im))
            .collect();
        Self::new(dim, data)
    }
}

impl From<Matrix> for Vec<Vec<[f64; 2]>> {
    fn from(m: Matrix) -> Self {
        m.data
            .chunks(m.dim)
            .map(|row| row.iter().map(|z| [z.re, z.im]).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn pauli_power_one_is_pauli() {
        for axis in [PauliAxis::X, PauliAxis::Y, PauliAxis::Z] {
            assert!(Matrix::pauli_power(axis, 1.0)
                .approx_eq(&Matrix::pauli(axis), EPS));
        }
    }

    #[test]
    fn half_powers_square_to_pauli() {
        let sqrt_x = Matrix::pauli_power(PauliAxis::X, 0.5);
        assert!((&sqrt_x * &sqrt_x).approx_eq(&Matrix::pauli(PauliAxis::X), EPS));
        let s = Matrix::pauli_power(PauliAxis::Z, 0.5);
        assert!((s.get(1, 1) - Complex64::new(0.0, 1.0)).norm() < EPS);
        assert!((s.get(0, 0) - Complex64::new(1.0, 0.0)).norm() < EPS);
    }

    #[test]
    fn fourier_of_one_qubit_is_hadamard() {
        assert!(Matrix::fourier(1).approx_eq(&Matrix::hadamard(), EPS));
    }

    #[test]
    fn fourier_is_unitary() {
        for span in 1..=4 {
            assert!(Matrix::fourier(span).is_unitary(1e-9));
        }
    }

    #[test]
    fn permutation_maps_basis_states() {
        let inc = Matrix::permutation(4, |x| x + 1);
        let out = inc.apply(&[
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(1.0, 0.0),
        ]);
        assert_eq!(out[0], Complex64::new(1.0, 0.0));
        assert!(inc.is_unitary(EPS));
    }

    #[test]
    fn serde_round_trip_preserves_entries() {
        let m = Matrix::pauli(PauliAxis::Y);
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.starts_with("[[[0.0,0.0],"));
        let back: Matrix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let rows = vec![vec![[1.0, 0.0]], vec![[0.0, 0.0], [1.0, 0.0]]];
        assert!(Matrix::try_from(rows).is_err());
    }
}
