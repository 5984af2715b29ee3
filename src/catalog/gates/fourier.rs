use crate::catalog::{GateBuilder, GateCatalog, GateFamily};
use crate::error::EngineError;
use crate::kernel::{Kernel, MAX_REGISTER_SPAN, MAX_UNITARY_SPAN};
use crate::math::Matrix;

pub(super) fn register(catalog: &mut GateCatalog) -> Result<(), EngineError> {
    for inverse in [false, true] {
        let (prefix, partner) = if inverse {
            ("QFT†", "QFT")
        } else {
            ("QFT", "QFT†")
        };
        catalog.register_family(GateFamily::new(
            prefix,
            1..=MAX_REGISTER_SPAN,
            move |span| {
                let mut builder = GateBuilder::new(format!("{prefix}{span}"), prefix)
                    .title(if inverse {
                        "Inverse Fourier Transform Gate"
                    } else {
                        "Fourier Transform Gate"
                    })
                    .blurb(if inverse {
                        "Undoes the quantum Fourier transform."
                    } else {
                        "Transforms to and from the frequency domain."
                    })
                    .height(span)
                    .glyph("fourier")
                    .adjoint(format!("{partner}{span}"))
                    .kernels(move |ctx| Ok(Kernel::fourier(ctx.offset, span, inverse)));
                if span <= MAX_UNITARY_SPAN {
                    let m = Matrix::fourier(span);
                    builder = builder.known_matrix(if inverse { m.adjoint() } else { m });
                }
                builder.build()
            },
        ))?;
    }
    Ok(())
}
