//! Host evaluation of the kernels.
//!
//! [`gather`] mirrors each WGSL fragment shader texel for texel, including
//! the `f32` arithmetic and the pass-through of raw texels, so the
//! [`ReferenceBackend`] doubles as a GPU-free engine and as the oracle for
//! GPU parity tests.

use std::cell::RefCell;
use std::f32::consts::{FRAC_1_SQRT_2, PI};

use log::debug;
use num_complex::Complex32;

use super::{Kernel, ShaderPass};
use crate::error::EngineError;
use crate::math::{rotate_left, span_mask};
use crate::resource::{Backend, ContextStatus, TextureShape};

/// Output amplitude at `index` after applying `pass` to `input`.
///
/// `input` holds the stored (possibly quantized) amplitudes; the result is
/// not yet quantized.
#[must_use]
pub fn gather(pass: &ShaderPass, input: &[Complex32], index: u32) -> Complex32 {
    let raw = |i: u32| input[i as usize];
    if !pass.controls.allows(index) {
        return raw(index);
    }
    match &pass.kernel {
        Kernel::Swap { bit_a, bit_b } => {
            if (index >> bit_a) & 1 == (index >> bit_b) & 1 {
                raw(index)
            } else {
                raw(index ^ ((1 << bit_a) | (1 << bit_b)))
            }
        }
        Kernel::CycleBits {
            offset,
            span,
            shift,
        } => {
            let mask = span_mask(*span);
            let local = (index >> offset) & mask;
            let source_local = rotate_left(local, *span, span - shift);
            raw((index & !(mask << offset)) | (source_local << offset))
        }
        Kernel::FourierStep {
            offset,
            span,
            bit,
            inverse,
        } => fourier_step(input, index, *offset, *span, *bit, *inverse),
        Kernel::Arithmetic {
            offset,
            span,
            operand,
            factor,
        } => {
            let mask = span_mask(*span);
            let value = (index >> offset) & mask;
            let delta = (*factor as u32).wrapping_mul(operand.value(index));
            let source_value = value.wrapping_sub(delta) & mask;
            raw((index & !(mask << offset)) | (source_value << offset))
        }
        Kernel::UniversalNot { bit } => {
            let partner = raw(index ^ (1 << bit)).conj();
            if (index >> bit) & 1 == 1 {
                partner
            } else {
                -partner
            }
        }
        Kernel::FaultInjection { .. } => raw(index),
        Kernel::Unitary {
            offset,
            span,
            matrix,
        } => {
            let dim = 1u32 << span;
            let mask = dim - 1;
            let row = (index >> offset) & mask;
            let base = index & !(mask << offset);
            (0..dim)
                .map(|col| {
                    let m = matrix.get(row as usize, col as usize);
                    Complex32::new(m.re as f32, m.im as f32)
                        * raw(base | (col << offset))
                })
                .sum()
        }
    }
}

fn fourier_step(
    input: &[Complex32],
    index: u32,
    offset: u32,
    span: u32,
    bit: u32,
    inverse: bool,
) -> Complex32 {
    let local = (index >> offset) & span_mask(span);
    let target = 1u32 << (offset + bit);
    let v0 = input[(index & !target) as usize];
    let v1 = input[(index | target) as usize];

    let theta: f32 = (bit + 1..span)
        .filter(|c| (local >> c) & 1 == 1)
        .map(|c| PI / (1u32 << (c - bit)) as f32)
        .sum();
    let is_one = (local >> bit) & 1 == 1;
    let phase = Complex32::from_polar(1.0, theta);

    if inverse {
        let w1 = v1 * phase.conj();
        (if is_one { v0 - w1 } else { v0 + w1 }) * FRAC_1_SQRT_2
    } else {
        let h = (if is_one { v0 - v1 } else { v0 + v1 }) * FRAC_1_SQRT_2;
        if is_one {
            h * phase
        } else {
            h
        }
    }
}

/// Apply `pass` to a whole state, quantizing outputs to `shape`'s encoding.
#[must_use]
pub fn apply_pass(
    pass: &ShaderPass,
    shape: TextureShape,
    input: &[Complex32],
) -> Vec<Complex32> {
    (0..input.len() as u32)
        .map(|i| {
            let out = gather(pass, input, i);
            if pass.kernel.is_permutation() || !pass.controls.allows(i) {
                out
            } else {
                shape.encoding.quantize(out)
            }
        })
        .collect()
}

/// Host texture storage.
pub type ReferenceTexture = RefCell<Vec<Complex32>>;

/// A [`Backend`] that evaluates kernels on the CPU.
///
/// Context loss can be simulated to exercise the resource manager's
/// recovery path.
#[derive(Debug)]
pub struct ReferenceBackend {
    lost: bool,
    generation: u64,
    max_dimension: u32,
    passes_rendered: u64,
}

impl Default for ReferenceBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceBackend {
    /// Backend accepting textures up to 8192 texels on a side.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_max_dimension(8192)
    }

    /// Backend refusing textures wider or taller than `max_dimension`.
    #[must_use]
    pub const fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            lost: false,
            generation: 0,
            max_dimension,
            passes_rendered: 0,
        }
    }

    /// Mark the context lost, as a driver reset would.
    pub fn simulate_context_loss(&mut self) {
        self.lost = true;
    }

    /// Number of contexts created after the first.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Passes rendered since construction.
    #[must_use]
    pub const fn passes_rendered(&self) -> u64 {
        self.passes_rendered
    }
}

impl Backend for ReferenceBackend {
    type Texture = ReferenceTexture;

    fn name(&self) -> &'static str {
        "reference"
    }

    fn context_status(&self) -> ContextStatus {
        if self.lost {
            ContextStatus::Lost
        } else {
            ContextStatus::Live
        }
    }

    fn restore_context(&mut self) -> Result<(), EngineError> {
        self.lost = false;
        self.generation += 1;
        debug!("reference context restored (generation {})", self.generation);
        Ok(())
    }

    fn allocate(
        &mut self,
        shape: TextureShape,
        _label: &str,
    ) -> Result<Self::Texture, EngineError> {
        if shape.width > self.max_dimension || shape.height > self.max_dimension
        {
            return Err(EngineError::TextureAllocation {
                operation: "allocate",
                shape,
                detail: format!(
                    "exceeds max texture dimension {}",
                    self.max_dimension
                ),
            });
        }
        Ok(RefCell::new(vec![Complex32::default(); shape.texel_count()]))
    }

    fn upload(
        &mut self,
        texture: &Self::Texture,
        shape: TextureShape,
        amplitudes: &[Complex32],
    ) -> Result<(), EngineError> {
        if amplitudes.len() != shape.texel_count() {
            return Err(EngineError::InvalidPass(format!(
                "{} amplitudes do not fill {shape}",
                amplitudes.len()
            )));
        }
        let mut texels = texture.borrow_mut();
        for (texel, a) in texels.iter_mut().zip(amplitudes) {
            *texel = shape.encoding.quantize(*a);
        }
        Ok(())
    }

    fn render(
        &mut self,
        pass: &ShaderPass,
        shape: TextureShape,
        input: &Self::Texture,
        output: &Self::Texture,
    ) -> Result<(), EngineError> {
        let result = apply_pass(pass, shape, &input.borrow());
        *output.borrow_mut() = result;
        self.passes_rendered += 1;
        Ok(())
    }

    fn read(
        &mut self,
        texture: &Self::Texture,
        _shape: TextureShape,
    ) -> Result<Vec<Complex32>, EngineError> {
        Ok(texture.borrow().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{ControlMask, Operand};
    use crate::math::Matrix;
    use crate::resource::PixelEncoding;
    use num_complex::Complex64;

    const EPS: f32 = 1e-6;

    fn basis(qubits: u32, index: usize) -> Vec<Complex32> {
        let mut v = vec![Complex32::default(); 1 << qubits];
        v[index] = Complex32::new(1.0, 0.0);
        v
    }

    fn run(passes: &[Kernel], input: &[Complex32]) -> Vec<Complex32> {
        let shape = TextureShape::new(input.len() as u32, 1, PixelEncoding::Float);
        passes.iter().fold(input.to_vec(), |state, k| {
            apply_pass(&ShaderPass::new(k.clone()), shape, &state)
        })
    }

    fn peak(state: &[Complex32]) -> usize {
        state
            .iter()
            .position(|a| (a.norm() - 1.0).abs() < EPS)
            .unwrap()
    }

    #[test]
    fn swap_moves_amplitude_between_qubits() {
        let out = run(&[Kernel::swap(0, 2)], &basis(3, 0b001));
        assert_eq!(peak(&out), 0b100);
    }

    #[test]
    fn cycle_bits_rotates_left() {
        // Register of qubits 1..4; value 0b001 rotated left by 1 is 0b010.
        let out = run(&[Kernel::cycle_bits(1, 3, 1)], &basis(4, 0b0010));
        assert_eq!(peak(&out), 0b0100);
        let out = run(&[Kernel::cycle_bits(1, 3, 1)], &basis(4, 0b1000));
        assert_eq!(peak(&out), 0b0010);
        let back = run(&[Kernel::cycle_bits(1, 3, -1)], &out);
        assert_eq!(peak(&back), 0b1000);
    }

    #[test]
    fn increment_wraps_modulo_register() {
        let out = run(&[Kernel::add_constant(0, 2, 1)], &basis(3, 0b111));
        assert_eq!(peak(&out), 0b100);
        let dec = run(&[Kernel::add_constant(0, 2, -1)], &basis(3, 0b100));
        assert_eq!(peak(&dec), 0b111);
    }

    #[test]
    fn register_and_popcount_operands() {
        // target = qubits 0..2, operand = qubits 2..4 holding 3.
        let add = Kernel::Arithmetic {
            offset: 0,
            span: 2,
            operand: Operand::Register { offset: 2, span: 2 },
            factor: 1,
        };
        let out = run(&[add], &basis(4, 0b1101));
        assert_eq!(peak(&out), 0b1100);

        let count = Kernel::Arithmetic {
            offset: 0,
            span: 2,
            operand: Operand::PopCount { offset: 2, span: 2 },
            factor: -1,
        };
        let out = run(&[count], &basis(4, 0b1100));
        assert_eq!(peak(&out), 0b1110);
    }

    #[test]
    fn fourier_passes_match_closed_form() {
        for span in 1..=4u32 {
            let expected = Matrix::fourier(span);
            let passes = Kernel::fourier(0, span, false);
            for x in 0..(1usize << span) {
                let out = run(&passes, &basis(span, x));
                for (y, amp) in out.iter().enumerate() {
                    let e = expected.get(y, x);
                    let diff = Complex64::new(f64::from(amp.re), f64::from(amp.im)) - e;
                    assert!(diff.norm() < 1e-6, "span {span} x {x} y {y}");
                }
            }
        }
    }

    #[test]
    fn inverse_fourier_undoes_forward() {
        let input: Vec<Complex32> = (0..8)
            .map(|i| Complex32::new(i as f32, -(i as f32) / 2.0) / 14.0)
            .collect();
        let mut passes = Kernel::fourier(0, 3, false);
        passes.extend(Kernel::fourier(0, 3, true));
        let out = run(&passes, &input);
        for (a, b) in out.iter().zip(&input) {
            assert!((a - b).norm() < EPS);
        }
    }

    fn sorted_bits(state: &[Complex32]) -> Vec<(u32, u32)> {
        let mut bits: Vec<_> =
            state.iter().map(|a| (a.re.to_bits(), a.im.to_bits())).collect();
        bits.sort_unstable();
        bits
    }

    #[test]
    fn permutations_preserve_the_amplitude_multiset() {
        let kernels = [
            Kernel::swap(0, 3),
            Kernel::cycle_bits(0, 4, 1),
            Kernel::cycle_bits(1, 3, -1),
            Kernel::add_constant(0, 4, 5),
            Kernel::add_constant(2, 2, -1),
            Kernel::Arithmetic {
                offset: 0,
                span: 2,
                operand: Operand::Register { offset: 2, span: 2 },
                factor: 1,
            },
            Kernel::Arithmetic {
                offset: 2,
                span: 2,
                operand: Operand::PopCount { offset: 0, span: 2 },
                factor: -1,
            },
        ];
        for encoding in [PixelEncoding::Float, PixelEncoding::Byte] {
            let shape = TextureShape::new(4, 4, encoding);
            let input: Vec<Complex32> = (0..16)
                .map(|i| {
                    let z = Complex32::from_polar(0.05 + 0.015 * i as f32, 0.7 * i as f32);
                    encoding.quantize(z)
                })
                .collect();
            let expected = sorted_bits(&input);
            assert_eq!(expected.windows(2).filter(|w| w[0] == w[1]).count(), 0);
            for kernel in &kernels {
                assert!(kernel.is_permutation(), "{kernel:?}");
                let out = apply_pass(&ShaderPass::new(kernel.clone()), shape, &input);
                assert_ne!(out, input, "{encoding:?} {kernel:?} moved nothing");
                assert_eq!(sorted_bits(&out), expected, "{encoding:?} {kernel:?}");
            }
        }
    }

    #[test]
    fn universal_not_conjugates_and_flips() {
        let input = vec![Complex32::new(0.6, 0.0), Complex32::new(0.0, 0.8)];
        let out = run(&[Kernel::UniversalNot { bit: 0 }], &input);
        // (a, b) -> (-b*, a*)
        assert!((out[0] - Complex32::new(0.0, 0.8)).norm() < EPS);
        assert!((out[1] - Complex32::new(0.6, 0.0)).norm() < EPS);
    }

    #[test]
    fn controlled_unitary_leaves_unmatched_amplitudes() {
        let pass = ShaderPass::new(Kernel::Unitary {
            offset: 0,
            span: 1,
            matrix: Matrix::hadamard(),
        })
        .with_controls(ControlMask::NONE.with(1, true));
        let shape = TextureShape::new(4, 1, PixelEncoding::Float);
        let untouched = apply_pass(&pass, shape, &basis(2, 0b00));
        assert_eq!(peak(&untouched), 0b00);
        let mixed = apply_pass(&pass, shape, &basis(2, 0b10));
        assert!((mixed[0b10].re - FRAC_1_SQRT_2).abs() < EPS);
        assert!((mixed[0b11].re - FRAC_1_SQRT_2).abs() < EPS);
    }

    #[test]
    fn byte_encoding_quantizes_only_computed_texels() {
        let shape = TextureShape::new(4, 1, PixelEncoding::Byte);
        let stored: Vec<Complex32> = [0.3, -0.2, 0.7, 0.05]
            .iter()
            .map(|&x| PixelEncoding::Byte.quantize(Complex32::new(x, x / 3.0)))
            .collect();
        let swapped =
            apply_pass(&ShaderPass::new(Kernel::swap(0, 1)), shape, &stored);
        assert_eq!(swapped[1], stored[2]);
        assert_eq!(swapped[2], stored[1]);
        let notted = apply_pass(
            &ShaderPass::new(Kernel::UniversalNot { bit: 0 }),
            shape,
            &stored,
        );
        assert_eq!(notted[0], PixelEncoding::Byte.quantize(-stored[1].conj()));
    }

    #[test]
    fn simulated_loss_is_reported_until_restored() {
        let mut backend = ReferenceBackend::new();
        assert_eq!(backend.context_status(), ContextStatus::Live);
        backend.simulate_context_loss();
        assert_eq!(backend.context_status(), ContextStatus::Lost);
        backend.restore_context().unwrap();
        assert_eq!(backend.context_status(), ContextStatus::Live);
        assert_eq!(backend.generation(), 1);
    }
}
