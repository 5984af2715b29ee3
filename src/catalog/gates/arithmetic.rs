//! Modular arithmetic on a target register.

use crate::catalog::{GateBuilder, GateCatalog, GateContext, GateFamily, GateRole};
use crate::error::EngineError;
use crate::kernel::{Kernel, Operand, MAX_REGISTER_SPAN, MAX_UNITARY_SPAN};
use crate::math::{span_mask, Matrix};

/// Widest register the counting gates animate over.
const MAX_COUNTING_SPAN: u32 = 8;

pub(super) fn register(catalog: &mut GateCatalog) -> Result<(), EngineError> {
    catalog.register_family(GateFamily::new(
        "inputA",
        1..=MAX_REGISTER_SPAN,
        |span| {
            GateBuilder::new(format!("inputA{span}"), "input A")
                .title("Input Gate [A]")
                .blurb("Marks the wires read as register A by arithmetic gates.")
                .height(span)
                .role(GateRole::InputRegister)
                .glyph("input_register")
                .build()
        },
    ))?;

    for (prefix, partner, amount) in [("inc", "dec", 1), ("dec", "inc", -1)] {
        catalog.register_family(GateFamily::new(
            prefix,
            1..=MAX_REGISTER_SPAN,
            move |span| {
                let mut builder = GateBuilder::new(
                    format!("{prefix}{span}"),
                    if amount > 0 { "+1" } else { "−1" },
                )
                .title(if amount > 0 {
                    "Increment Gate"
                } else {
                    "Decrement Gate"
                })
                .blurb("Adds a constant, wrapping modulo the register size.")
                .height(span)
                .glyph("arithmetic")
                .adjoint(format!("{partner}{span}"))
                .kernels(move |ctx| Ok(vec![Kernel::add_constant(ctx.offset, span, amount)]));
                if span <= MAX_UNITARY_SPAN {
                    let dim = 1usize << span;
                    builder = builder.known_matrix(Matrix::permutation(dim, |x| {
                        (x as i64 + amount).rem_euclid(dim as i64) as usize
                    }));
                }
                builder.build()
            },
        ))?;
    }

    let register_operands: [(&'static str, &'static str, i32, bool); 4] = [
        ("+=A", "-=A", 1, false),
        ("-=A", "+=A", -1, false),
        ("+cntA", "-cntA", 1, true),
        ("-cntA", "+cntA", -1, true),
    ];
    for (prefix, partner, factor, count_bits) in register_operands {
        catalog.register_family(GateFamily::new(
            prefix,
            1..=MAX_REGISTER_SPAN,
            move |span| {
                GateBuilder::new(format!("{prefix}{span}"), prefix)
                    .title(match (count_bits, factor > 0) {
                        (false, true) => "Addition Gate",
                        (false, false) => "Subtraction Gate",
                        (true, true) => "Bit Count Addition Gate",
                        (true, false) => "Bit Count Subtraction Gate",
                    })
                    .blurb(if count_bits {
                        "Adds or subtracts the number of ON wires in input A."
                    } else {
                        "Adds or subtracts the value of input A."
                    })
                    .height(span)
                    .glyph("arithmetic")
                    .adjoint(format!("{partner}{span}"))
                    .kernels(move |ctx| {
                        let a = ctx.require_input_a(prefix)?;
                        let operand = if count_bits {
                            Operand::PopCount {
                                offset: a.offset,
                                span: a.span,
                            }
                        } else {
                            Operand::Register {
                                offset: a.offset,
                                span: a.span,
                            }
                        };
                        Ok(vec![Kernel::Arithmetic {
                            offset: ctx.offset,
                            span,
                            operand,
                            factor,
                        }])
                    })
                    .build()
            },
        ))?;
    }

    for (prefix, partner, sign) in
        [("Counting", "Uncounting", 1), ("Uncounting", "Counting", -1)]
    {
        catalog.register_family(GateFamily::new(
            prefix,
            1..=MAX_COUNTING_SPAN,
            move |span| {
                GateBuilder::new(
                    format!("{prefix}{span}"),
                    if sign > 0 { "+⌈t⌉" } else { "−⌈t⌉" },
                )
                .title(if sign > 0 {
                    "Counting Gate"
                } else {
                    "Uncounting Gate"
                })
                .blurb("Adds or subtracts a value that increases over time.")
                .height(span)
                .glyph("counting")
                .adjoint(format!("{partner}{span}"))
                .unstable()
                .kernels(move |ctx| {
                    Ok(vec![Kernel::add_constant(
                        ctx.offset,
                        span,
                        sign * counting_value(ctx, span),
                    )])
                })
                .build()
            },
        ))?;
    }
    Ok(())
}

/// `floor(t · 2^span)`, clamped into the register.
fn counting_value(ctx: &GateContext, span: u32) -> i64 {
    let scaled = (ctx.time.clamp(0.0, 1.0) * f64::from(1u32 << span)).floor();
    (scaled as i64) & i64::from(span_mask(span))
}
