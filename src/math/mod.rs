//! Dense complex matrices and register bit helpers.

mod matrix;

pub use matrix::{Matrix, PauliAxis};

/// Mask with the low `span` bits set.
#[must_use]
pub const fn span_mask(span: u32) -> u32 {
    if span >= 32 {
        u32::MAX
    } else {
        (1u32 << span) - 1
    }
}

/// Rotate the low `span` bits of `value` left by `shift`.
#[must_use]
pub const fn rotate_left(value: u32, span: u32, shift: u32) -> u32 {
    if span == 0 {
        return value;
    }
    let mask = span_mask(span);
    let v = value & mask;
    let s = shift % span;
    if s == 0 {
        v
    } else {
        ((v << s) | (v >> (span - s))) & mask
    }
}
