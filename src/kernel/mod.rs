//! Per-pixel amplitude kernels.
//!
//! Every kernel is a gather: the output texel at amplitude index `i` is
//! computed from a small, fixed set of input texels. Passes with controls
//! copy the input texel unchanged wherever the control bits do not match.
//!
//! The same kernels run on the GPU ([`library::KernelLibrary`]) and on the
//! host ([`reference`]).

pub mod library;
pub mod reference;
mod uniforms;

pub use uniforms::{KernelUniforms, MatrixUniform};

use crate::error::EngineError;
use crate::math::{span_mask, Matrix};

/// Largest register a single kernel addresses.
pub const MAX_REGISTER_SPAN: u32 = 16;
/// Largest dense unitary (4 qubits, 16x16).
pub const MAX_UNITARY_SPAN: u32 = 4;

/// Required values for a set of control qubits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ControlMask {
    mask: u32,
    value: u32,
}

impl ControlMask {
    /// No controls: every amplitude is transformed.
    pub const NONE: Self = Self { mask: 0, value: 0 };

    /// Controls on the bits of `mask`, requiring the bits of `value`.
    #[must_use]
    pub const fn new(mask: u32, value: u32) -> Self {
        Self {
            mask,
            value: value & mask,
        }
    }

    /// Add a control on `bit`, satisfied when the bit equals `required`.
    #[must_use]
    pub const fn with(self, bit: u32, required: bool) -> Self {
        let b = 1 << bit;
        Self {
            mask: self.mask | b,
            value: if required {
                self.value | b
            } else {
                self.value & !b
            },
        }
    }

    /// Control bit mask.
    #[must_use]
    pub const fn mask(self) -> u32 {
        self.mask
    }

    /// Required control values.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.value
    }

    /// Whether the controls are satisfied at `index`.
    #[must_use]
    pub const fn allows(self, index: u32) -> bool {
        index & self.mask == self.value
    }

    /// Whether there are no controls.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.mask == 0
    }
}

/// Second input of an arithmetic kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    /// A fixed value.
    Constant(u32),
    /// The value of another register.
    Register {
        /// Lowest qubit.
        offset: u32,
        /// Register width.
        span: u32,
    },
    /// The number of set bits in another register.
    PopCount {
        /// Lowest qubit.
        offset: u32,
        /// Register width.
        span: u32,
    },
}

impl Operand {
    /// Operand value at amplitude `index`.
    #[must_use]
    pub const fn value(self, index: u32) -> u32 {
        match self {
            Self::Constant(c) => c,
            Self::Register { offset, span } => (index >> offset) & span_mask(span),
            Self::PopCount { offset, span } => {
                ((index >> offset) & span_mask(span)).count_ones()
            }
        }
    }

    /// Bits read from the state, if any.
    #[must_use]
    pub const fn mask(self) -> u32 {
        match self {
            Self::Constant(_) => 0,
            Self::Register { offset, span } | Self::PopCount { offset, span } => {
                span_mask(span) << offset
            }
        }
    }
}

/// A per-pixel transformation.
#[derive(Debug, Clone, PartialEq)]
pub enum Kernel {
    /// Exchange two qubits.
    Swap {
        /// First qubit.
        bit_a: u32,
        /// Second qubit.
        bit_b: u32,
    },
    /// Rotate a register's bits left by `shift`.
    CycleBits {
        /// Lowest qubit.
        offset: u32,
        /// Register width.
        span: u32,
        /// Left rotation in `0..span`.
        shift: u32,
    },
    /// Hadamard on one register bit fused with controlled phases from the
    /// register's higher bits.
    FourierStep {
        /// Lowest qubit of the register.
        offset: u32,
        /// Register width.
        span: u32,
        /// Register-relative bit receiving the Hadamard.
        bit: u32,
        /// Apply the adjoint step.
        inverse: bool,
    },
    /// `target += factor * operand (mod 2^span)`.
    Arithmetic {
        /// Lowest qubit of the target register.
        offset: u32,
        /// Target register width.
        span: u32,
        /// Value added.
        operand: Operand,
        /// Multiplier, usually `1` or `-1`.
        factor: i32,
    },
    /// Anti-unitary `(a, b) -> (-b*, a*)` on one qubit.
    UniversalNot {
        /// Target qubit.
        bit: u32,
    },
    /// Fails the evaluation when run.
    FaultInjection {
        /// Error message.
        message: String,
    },
    /// Dense unitary over a contiguous register of at most
    /// [`MAX_UNITARY_SPAN`] qubits.
    Unitary {
        /// Lowest qubit.
        offset: u32,
        /// Register width.
        span: u32,
        /// `2^span` square matrix.
        matrix: Matrix,
    },
}

/// Shader program selector for a [`Kernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelKind {
    /// `swap.wgsl`
    Swap,
    /// `cycle_bits.wgsl`
    CycleBits,
    /// `fourier_step.wgsl`
    FourierStep,
    /// `arithmetic.wgsl`
    Arithmetic,
    /// `universal_not.wgsl`
    UniversalNot,
    /// `unitary.wgsl`
    Unitary,
}

impl KernelKind {
    /// Every kind with a shader program.
    pub const ALL: [Self; 6] = [
        Self::Swap,
        Self::CycleBits,
        Self::FourierStep,
        Self::Arithmetic,
        Self::UniversalNot,
        Self::Unitary,
    ];

    /// WGSL source.
    #[must_use]
    pub const fn shader_source(self) -> &'static str {
        match self {
            Self::Swap => {
                include_str!("../../assets/shaders/kernels/swap.wgsl")
            }
            Self::CycleBits => {
                include_str!("../../assets/shaders/kernels/cycle_bits.wgsl")
            }
            Self::FourierStep => {
                include_str!("../../assets/shaders/kernels/fourier_step.wgsl")
            }
            Self::Arithmetic => {
                include_str!("../../assets/shaders/kernels/arithmetic.wgsl")
            }
            Self::UniversalNot => {
                include_str!("../../assets/shaders/kernels/universal_not.wgsl")
            }
            Self::Unitary => {
                include_str!("../../assets/shaders/kernels/unitary.wgsl")
            }
        }
    }

    /// Path used in composer diagnostics.
    #[must_use]
    pub const fn shader_path(self) -> &'static str {
        match self {
            Self::Swap => "kernels/swap.wgsl",
            Self::CycleBits => "kernels/cycle_bits.wgsl",
            Self::FourierStep => "kernels/fourier_step.wgsl",
            Self::Arithmetic => "kernels/arithmetic.wgsl",
            Self::UniversalNot => "kernels/universal_not.wgsl",
            Self::Unitary => "kernels/unitary.wgsl",
        }
    }
}

impl Kernel {
    /// Swap two qubits.
    #[must_use]
    pub const fn swap(bit_a: u32, bit_b: u32) -> Self {
        Self::Swap { bit_a, bit_b }
    }

    /// Rotate a register left by `shift` (negative rotates right).
    #[must_use]
    pub fn cycle_bits(offset: u32, span: u32, shift: i32) -> Self {
        let shift = if span == 0 {
            0
        } else {
            shift.rem_euclid(span as i32) as u32
        };
        Self::CycleBits {
            offset,
            span,
            shift,
        }
    }

    /// Add a constant, modulo `2^span` (negative amounts subtract).
    #[must_use]
    pub fn add_constant(offset: u32, span: u32, amount: i64) -> Self {
        let modulus = 1i64 << span.min(MAX_REGISTER_SPAN);
        Self::Arithmetic {
            offset,
            span,
            operand: Operand::Constant(amount.rem_euclid(modulus) as u32),
            factor: 1,
        }
    }

    /// The pass sequence for the quantum Fourier transform over a register
    /// (or its adjoint when `inverse`): bit-reversal swaps followed by one
    /// fused step per bit.
    #[must_use]
    pub fn fourier(offset: u32, span: u32, inverse: bool) -> Vec<Self> {
        let swaps = (0..span / 2)
            .map(|k| Self::swap(offset + k, offset + span - 1 - k));
        let steps = (0..span).map(|bit| Self::FourierStep {
            offset,
            span,
            bit,
            inverse,
        });
        if inverse {
            let mut passes: Vec<Self> = steps.rev().collect();
            passes.extend(swaps);
            passes
        } else {
            swaps.chain(steps).collect()
        }
    }

    /// Short kernel name used in errors and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Swap { .. } => "swap",
            Self::CycleBits { .. } => "cycle_bits",
            Self::FourierStep { .. } => "fourier_step",
            Self::Arithmetic { .. } => "arithmetic",
            Self::UniversalNot { .. } => "universal_not",
            Self::FaultInjection { .. } => "fault_injection",
            Self::Unitary { .. } => "unitary",
        }
    }

    /// Shader program, or `None` for kernels that never reach the device.
    #[must_use]
    pub const fn kind(&self) -> Option<KernelKind> {
        match self {
            Self::Swap { .. } => Some(KernelKind::Swap),
            Self::CycleBits { .. } => Some(KernelKind::CycleBits),
            Self::FourierStep { .. } => Some(KernelKind::FourierStep),
            Self::Arithmetic { .. } => Some(KernelKind::Arithmetic),
            Self::UniversalNot { .. } => Some(KernelKind::UniversalNot),
            Self::FaultInjection { .. } => None,
            Self::Unitary { .. } => Some(KernelKind::Unitary),
        }
    }

    /// Whether the kernel only moves texels (no arithmetic on amplitudes),
    /// so the output is bit-exact in every encoding.
    #[must_use]
    pub const fn is_permutation(&self) -> bool {
        matches!(
            self,
            Self::Swap { .. } | Self::CycleBits { .. } | Self::Arithmetic { .. }
        )
    }

    /// Every qubit the kernel reads as an operand or writes.
    #[must_use]
    pub fn operand_mask(&self) -> u32 {
        match self {
            Self::Swap { bit_a, bit_b } => (1 << bit_a) | (1 << bit_b),
            Self::CycleBits { offset, span, .. }
            | Self::FourierStep { offset, span, .. }
            | Self::Unitary { offset, span, .. } => span_mask(*span) << offset,
            Self::Arithmetic {
                offset,
                span,
                operand,
                ..
            } => (span_mask(*span) << offset) | operand.mask(),
            Self::UniversalNot { bit } => 1 << bit,
            Self::FaultInjection { .. } => 0,
        }
    }

    /// Fail with [`EngineError::InjectedFault`] if this is the
    /// fault-injection kernel.
    ///
    /// # Errors
    ///
    /// See above.
    pub fn check_invocable(&self) -> Result<(), EngineError> {
        match self {
            Self::FaultInjection { message } => {
                Err(EngineError::InjectedFault(message.clone()))
            }
            _ => Ok(()),
        }
    }

    fn validate(&self, qubits: u32) -> Result<(), String> {
        let register = |offset: u32, span: u32, what: &str| {
            if span == 0 || span > MAX_REGISTER_SPAN {
                Err(format!(
                    "{what} span {span} outside 1..={MAX_REGISTER_SPAN}"
                ))
            } else if offset + span > qubits {
                Err(format!(
                    "{what} qubits {offset}..{} exceed {qubits}-qubit state",
                    offset + span
                ))
            } else {
                Ok(())
            }
        };
        match self {
            Self::Swap { bit_a, bit_b } => {
                register(*bit_a, 1, "swap")?;
                register(*bit_b, 1, "swap")?;
                if bit_a == bit_b {
                    return Err(format!("swap of qubit {bit_a} with itself"));
                }
                Ok(())
            }
            Self::CycleBits {
                offset,
                span,
                shift,
            } => {
                register(*offset, *span, "cycle")?;
                if shift >= span {
                    return Err(format!("cycle shift {shift} not below {span}"));
                }
                Ok(())
            }
            Self::FourierStep {
                offset, span, bit, ..
            } => {
                register(*offset, *span, "fourier")?;
                if bit >= span {
                    return Err(format!("fourier bit {bit} not below {span}"));
                }
                Ok(())
            }
            Self::Arithmetic {
                offset,
                span,
                operand,
                ..
            } => {
                register(*offset, *span, "arithmetic target")?;
                match operand {
                    Operand::Constant(_) => Ok(()),
                    Operand::Register { offset: o, span: s }
                    | Operand::PopCount { offset: o, span: s } => {
                        register(*o, *s, "arithmetic operand")?;
                        if operand.mask() & (span_mask(*span) << offset) != 0 {
                            return Err(
                                "arithmetic operand overlaps its target"
                                    .to_owned(),
                            );
                        }
                        Ok(())
                    }
                }
            }
            Self::UniversalNot { bit } => register(*bit, 1, "universal not"),
            Self::FaultInjection { .. } => Ok(()),
            Self::Unitary {
                offset,
                span,
                matrix,
            } => {
                register(*offset, *span, "unitary")?;
                if *span > MAX_UNITARY_SPAN {
                    return Err(format!(
                        "unitary span {span} exceeds {MAX_UNITARY_SPAN}"
                    ));
                }
                if matrix.dim() != 1usize << *span {
                    return Err(format!(
                        "{}x{} matrix does not act on {span} qubits",
                        matrix.dim(),
                        matrix.dim()
                    ));
                }
                Ok(())
            }
        }
    }
}

/// One full-screen render: a kernel plus its controls.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderPass {
    /// The per-pixel transformation.
    pub kernel: Kernel,
    /// Amplitudes outside the controls pass through unchanged.
    pub controls: ControlMask,
}

impl ShaderPass {
    /// Uncontrolled pass.
    #[must_use]
    pub const fn new(kernel: Kernel) -> Self {
        Self {
            kernel,
            controls: ControlMask::NONE,
        }
    }

    /// Replace the controls.
    #[must_use]
    pub const fn with_controls(mut self, controls: ControlMask) -> Self {
        self.controls = controls;
        self
    }

    /// Check that operands and controls fit a `qubits`-qubit state and that
    /// no control bit is also an operand bit.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidPass`] describing the first violation.
    pub fn validate(&self, qubits: u32) -> Result<(), EngineError> {
        self.kernel.validate(qubits).map_err(|msg| {
            EngineError::InvalidPass(format!("{}: {msg}", self.kernel.name()))
        })?;
        if self.controls.mask() & !span_mask(qubits) != 0 {
            return Err(EngineError::InvalidPass(format!(
                "{}: control mask {:#b} exceeds {qubits}-qubit state",
                self.kernel.name(),
                self.controls.mask()
            )));
        }
        if self.controls.mask() & self.kernel.operand_mask() != 0 {
            return Err(EngineError::InvalidPass(format!(
                "{}: controls overlap operand qubits",
                self.kernel.name()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_mask_matches_required_values() {
        let c = ControlMask::NONE.with(0, true).with(2, false);
        assert_eq!(c.mask(), 0b101);
        assert_eq!(c.value(), 0b001);
        assert!(c.allows(0b011));
        assert!(!c.allows(0b111));
        assert!(!c.allows(0b010));
        assert!(ControlMask::NONE.allows(0xFFFF));
    }

    #[test]
    fn cycle_shift_is_normalized() {
        assert_eq!(
            Kernel::cycle_bits(0, 3, -1),
            Kernel::CycleBits {
                offset: 0,
                span: 3,
                shift: 2
            }
        );
    }

    #[test]
    fn fourier_sequence_has_reversal_then_steps() {
        let passes = Kernel::fourier(1, 3, false);
        assert_eq!(passes.len(), 4);
        assert_eq!(passes[0], Kernel::swap(1, 3));
        assert!(matches!(passes[1], Kernel::FourierStep { bit: 0, .. }));
        let inverse = Kernel::fourier(1, 3, true);
        assert!(matches!(
            inverse[0],
            Kernel::FourierStep {
                bit: 2,
                inverse: true,
                ..
            }
        ));
        assert_eq!(inverse[3], Kernel::swap(1, 3));
    }

    #[test]
    fn controls_may_not_touch_operands() {
        let pass = ShaderPass::new(Kernel::swap(0, 1))
            .with_controls(ControlMask::NONE.with(1, true));
        assert!(matches!(
            pass.validate(3),
            Err(EngineError::InvalidPass(_))
        ));
        let ok = ShaderPass::new(Kernel::swap(0, 1))
            .with_controls(ControlMask::NONE.with(2, true));
        assert!(ok.validate(3).is_ok());
    }

    #[test]
    fn out_of_range_operands_are_rejected() {
        assert!(ShaderPass::new(Kernel::UniversalNot { bit: 3 })
            .validate(3)
            .is_err());
        let unitary = Kernel::Unitary {
            offset: 0,
            span: 2,
            matrix: Matrix::hadamard(),
        };
        assert!(ShaderPass::new(unitary).validate(4).is_err());
        let overlapping = Kernel::Arithmetic {
            offset: 0,
            span: 2,
            operand: Operand::Register { offset: 1, span: 2 },
            factor: 1,
        };
        assert!(ShaderPass::new(overlapping).validate(4).is_err());
    }

    #[test]
    fn fault_injection_is_not_invocable() {
        let k = Kernel::FaultInjection {
            message: "boom".to_owned(),
        };
        assert!(matches!(
            k.check_invocable(),
            Err(EngineError::InjectedFault(m)) if m == "boom"
        ));
        assert!(k.kind().is_none());
    }
}
