use bytemuck::{Pod, Zeroable};

use super::{Kernel, Operand, ShaderPass};
use crate::math::Matrix;

const OPERAND_CONSTANT: u32 = 0;
const OPERAND_REGISTER: u32 = 1;
const OPERAND_POPCOUNT: u32 = 2;

/// Per-pass parameters (must match `KernelParams` in `amplitude.wgsl`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct KernelUniforms {
    /// Texture width in texels.
    pub width: u32,
    /// Control bit mask.
    pub control_mask: u32,
    /// Required control values.
    pub control_value: u32,
    /// Lowest register qubit.
    pub offset: u32,
    /// Register width.
    pub span: u32,
    /// First single-qubit operand (swap, Fourier bit, universal not).
    pub bit_a: u32,
    /// Second swap qubit.
    pub bit_b: u32,
    /// Cycle shift.
    pub shift: u32,
    /// 0 = constant, 1 = register, 2 = popcount.
    pub operand_kind: u32,
    /// Operand register offset.
    pub operand_offset: u32,
    /// Operand register width.
    pub operand_span: u32,
    /// Constant operand.
    pub constant: u32,
    /// Arithmetic multiplier.
    pub factor: i32,
    /// 1 for adjoint Fourier steps.
    pub inverse: u32,
    /// Pads the struct to 64 bytes.
    pub _pad: [u32; 2],
}

impl KernelUniforms {
    /// Pack a pass for a texture `width` texels wide.
    #[must_use]
    pub fn from_pass(pass: &ShaderPass, width: u32) -> Self {
        let mut u = Self {
            width,
            control_mask: pass.controls.mask(),
            control_value: pass.controls.value(),
            ..Self::default()
        };
        match &pass.kernel {
            Kernel::Swap { bit_a, bit_b } => {
                u.bit_a = *bit_a;
                u.bit_b = *bit_b;
            }
            Kernel::CycleBits {
                offset,
                span,
                shift,
            } => {
                u.offset = *offset;
                u.span = *span;
                u.shift = *shift;
            }
            Kernel::FourierStep {
                offset,
                span,
                bit,
                inverse,
            } => {
                u.offset = *offset;
                u.span = *span;
                u.bit_a = *bit;
                u.inverse = u32::from(*inverse);
            }
            Kernel::Arithmetic {
                offset,
                span,
                operand,
                factor,
            } => {
                u.offset = *offset;
                u.span = *span;
                u.factor = *factor;
                match *operand {
                    Operand::Constant(c) => {
                        u.operand_kind = OPERAND_CONSTANT;
                        u.constant = c;
                    }
                    Operand::Register { offset, span } => {
                        u.operand_kind = OPERAND_REGISTER;
                        u.operand_offset = offset;
                        u.operand_span = span;
                    }
                    Operand::PopCount { offset, span } => {
                        u.operand_kind = OPERAND_POPCOUNT;
                        u.operand_offset = offset;
                        u.operand_span = span;
                    }
                }
            }
            Kernel::UniversalNot { bit } => u.bit_a = *bit,
            Kernel::Unitary { offset, span, .. } => {
                u.offset = *offset;
                u.span = *span;
            }
            Kernel::FaultInjection { .. } => {}
        }
        u
    }
}

/// Dense unitary entries, two complex values per `vec4` (must match
/// `unitary_entries` in `unitary.wgsl`).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MatrixUniform {
    /// Packed `[re, im, re, im]` pairs in row-major order.
    pub entries: [[f32; 4]; 128],
}

impl Default for MatrixUniform {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl MatrixUniform {
    /// Pack a matrix of dimension at most 16.
    #[must_use]
    pub fn from_matrix(matrix: &Matrix) -> Self {
        let mut packed = Self::default();
        for (k, z) in matrix.entries().iter().take(256).enumerate() {
            let lane = (k % 2) * 2;
            packed.entries[k / 2][lane] = z.re as f32;
            packed.entries[k / 2][lane + 1] = z.im as f32;
        }
        packed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::ControlMask;

    #[test]
    fn uniform_block_is_sixty_four_bytes() {
        assert_eq!(std::mem::size_of::<KernelUniforms>(), 64);
        assert_eq!(std::mem::size_of::<MatrixUniform>(), 2048);
    }

    #[test]
    fn arithmetic_pass_packs_operand() {
        let pass = ShaderPass::new(Kernel::Arithmetic {
            offset: 2,
            span: 3,
            operand: Operand::PopCount { offset: 0, span: 2 },
            factor: -1,
        })
        .with_controls(ControlMask::NONE.with(5, false));
        let u = KernelUniforms::from_pass(&pass, 8);
        assert_eq!(u.width, 8);
        assert_eq!(u.control_mask, 1 << 5);
        assert_eq!(u.control_value, 0);
        assert_eq!((u.offset, u.span), (2, 3));
        assert_eq!(u.operand_kind, OPERAND_POPCOUNT);
        assert_eq!((u.operand_offset, u.operand_span), (0, 2));
        assert_eq!(u.factor, -1);
    }

    #[test]
    fn matrix_entries_pack_two_per_vec4() {
        let m = Matrix::pauli(crate::math::PauliAxis::Y);
        let packed = MatrixUniform::from_matrix(&m);
        // Row 0: [0, -i]; row 1: [i, 0].
        assert_eq!(packed.entries[0], [0.0, 0.0, 0.0, -1.0]);
        assert_eq!(packed.entries[1], [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(packed.entries[2], [0.0; 4]);
    }
}
