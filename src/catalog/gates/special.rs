use crate::catalog::{GateBuilder, GateCatalog};
use crate::error::EngineError;
use crate::kernel::Kernel;

pub(super) fn register(catalog: &mut GateCatalog) -> Result<(), EngineError> {
    let _ = catalog.register(
        GateBuilder::new("__unstable__UniversalNot", "UniNot")
            .title("Universal Not Gate")
            .blurb(
                "Mirrors a qubit's state through the center of the Bloch \
                 sphere.\nAnti-unitary; not a physical operation.",
            )
            .glyph("universal_not")
            .kernels(|ctx| Ok(vec![Kernel::UniversalNot { bit: ctx.offset }]))
            .build()?,
    )?;
    let _ = catalog.register(
        GateBuilder::new("__error__", "Error")
            .title("Error Gate")
            .blurb("Fails the evaluation. Exercises error reporting.")
            .glyph("error")
            .kernels(|_| {
                Ok(vec![Kernel::FaultInjection {
                    message: "error gate evaluated".to_owned(),
                }])
            })
            .build()?,
    )?;
    Ok(())
}
