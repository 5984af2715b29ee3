use log::debug;

use super::Column;
use crate::catalog::{GateContext, GateRole, Register};
use crate::error::EngineError;
use crate::kernel::{ControlMask, Kernel, ShaderPass};

/// Translate one column into shader passes at animation `time`.
///
/// Controls and anti-controls in the column condition every pass it
/// produces. A column holds at most one `inputA` register, which
/// arithmetic gates read, and zero or two swap halves.
///
/// # Errors
///
/// [`EngineError::Circuit`] when gates overlap or do not fit `qubits` (at
/// most 32), a
/// swap half is unpaired, or `inputA` is placed twice; errors from the
/// gates' kernel functions unchanged.
pub fn compile_column(
    column: &Column,
    qubits: u32,
    time: f64,
) -> Result<Vec<ShaderPass>, EngineError> {
    if qubits > u32::BITS {
        return Err(EngineError::Circuit(format!(
            "{qubits} wires exceed the {}-wire addressing limit",
            u32::BITS
        )));
    }
    let mut controls = ControlMask::NONE;
    let mut input_a = None;
    let mut swap_halves = Vec::new();
    let mut covered = 0u64;

    for (wire, cell) in column.occupied() {
        let gate = cell.gate();
        let end = wire + gate.height();
        if end > qubits {
            return Err(EngineError::Circuit(format!(
                "{} at wire {wire} does not fit {qubits} wires",
                gate.serialized_id()
            )));
        }
        let wires = ((1u64 << gate.height()) - 1) << wire;
        if covered & wires != 0 {
            return Err(EngineError::Circuit(format!(
                "{} at wire {wire} overlaps another gate",
                gate.serialized_id()
            )));
        }
        covered |= wires;

        match gate.role() {
            GateRole::Control { required } => {
                controls = controls.with(wire, required);
            }
            GateRole::InputRegister => {
                if input_a.is_some() {
                    return Err(EngineError::Circuit(
                        "column has more than one inputA register".to_owned(),
                    ));
                }
                input_a = Some(Register {
                    offset: wire,
                    span: gate.height(),
                });
            }
            GateRole::SwapHalf => swap_halves.push(wire),
            GateRole::Operation | GateRole::Spacer | GateRole::Placeholder => {}
        }
    }

    let mut kernels = Vec::new();
    match swap_halves.as_slice() {
        [] => {}
        [a, b] => kernels.push(Kernel::swap(*a, *b)),
        halves => {
            return Err(EngineError::Circuit(format!(
                "swap needs exactly two halves, column has {}",
                halves.len()
            )));
        }
    }
    for (wire, cell) in column.occupied() {
        let gate = cell.gate();
        match gate.role() {
            GateRole::Operation => {
                let context = GateContext {
                    offset: wire,
                    span: gate.height(),
                    time,
                    input_a,
                };
                kernels.extend(gate.kernels(&context)?);
            }
            GateRole::Placeholder => {
                debug!("skipping unresolved gate '{}'", gate.serialized_id());
            }
            _ => {}
        }
    }

    Ok(kernels
        .into_iter()
        .map(|k| ShaderPass::new(k).with_controls(controls))
        .collect())
}
