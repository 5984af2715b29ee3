//! Column structure: controls, swap halves, spacers.

use crate::catalog::{GateBuilder, GateCatalog, GateRole};
use crate::error::EngineError;

pub(super) fn register(catalog: &mut GateCatalog) -> Result<(), EngineError> {
    let _ = catalog.register(
        GateBuilder::new("•", "•")
            .title("Control")
            .blurb("Conditions the column's operations on this wire being ON.")
            .role(GateRole::Control { required: true })
            .glyph("control")
            .build()?,
    )?;
    let _ = catalog.register(
        GateBuilder::new("◦", "◦")
            .title("Anti-Control")
            .blurb("Conditions the column's operations on this wire being OFF.")
            .role(GateRole::Control { required: false })
            .glyph("anti_control")
            .build()?,
    )?;
    let _ = catalog.register(
        GateBuilder::new("…", "…")
            .title("Spacer")
            .blurb("Takes up space. Does nothing.")
            .role(GateRole::Spacer)
            .glyph("spacer")
            .build()?,
    )?;
    let _ = catalog.register(
        GateBuilder::new("Swap", "×")
            .title("Swap Gate")
            .blurb(
                "Exchanges two wires.\nPlace two swap gates in the same \
                 column to pair them.",
            )
            .role(GateRole::SwapHalf)
            .glyph("swap")
            .adjoint("Swap")
            .build()?,
    )?;
    Ok(())
}
