use crate::catalog::{GateBuilder, GateCatalog, GateFamily};
use crate::error::EngineError;
use crate::kernel::{Kernel, MAX_REGISTER_SPAN, MAX_UNITARY_SPAN};
use crate::math::{rotate_left, Matrix};

pub(super) fn register(catalog: &mut GateCatalog) -> Result<(), EngineError> {
    for (prefix, partner, shift) in [("<<", ">>", 1), (">>", "<<", -1)] {
        catalog.register_family(GateFamily::new(
            prefix,
            2..=MAX_REGISTER_SPAN,
            move |span| {
                let mut builder = GateBuilder::new(format!("{prefix}{span}"), prefix)
                    .title(if shift > 0 {
                        "Left Rotate"
                    } else {
                        "Right Rotate"
                    })
                    .blurb(if shift > 0 {
                        "Rotates bits upward, the top bit wrapping to the bottom."
                    } else {
                        "Rotates bits downward, the bottom bit wrapping to the top."
                    })
                    .height(span)
                    .glyph("cycle_bits")
                    .adjoint(format!("{partner}{span}"))
                    .kernels(move |ctx| {
                        Ok(vec![Kernel::cycle_bits(ctx.offset, span, shift)])
                    });
                if span <= MAX_UNITARY_SPAN {
                    let steps = shift.rem_euclid(span as i32) as u32;
                    builder = builder.known_matrix(Matrix::permutation(
                        1 << span,
                        |x| rotate_left(x as u32, span, steps) as usize,
                    ));
                }
                builder.build()
            },
        ))?;
    }
    Ok(())
}
