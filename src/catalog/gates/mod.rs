//! The built-in gates.

mod arithmetic;
mod basic;
mod cycle_bits;
mod fourier;
mod pauli;
mod special;

use super::GateCatalog;
use crate::error::EngineError;

pub(super) fn register_standard(catalog: &mut GateCatalog) -> Result<(), EngineError> {
    basic::register(catalog)?;
    pauli::register(catalog)?;
    fourier::register(catalog)?;
    cycle_bits::register(catalog)?;
    arithmetic::register(catalog)?;
    special::register(catalog)
}
