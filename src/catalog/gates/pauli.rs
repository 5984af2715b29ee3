//! Single-qubit turns: half, quarter and eighth turns, phase gradients and
//! the spinning gates.

use crate::catalog::{GateBuilder, GateCatalog};
use crate::error::EngineError;
use crate::math::{Matrix, PauliAxis};

const AXES: [(PauliAxis, &str); 3] =
    [(PauliAxis::X, "X"), (PauliAxis::Y, "Y"), (PauliAxis::Z, "Z")];

/// `(exponent, label, title)` for the fractional turns on every axis.
const TURNS: [(f64, &str, &str); 4] = [
    (0.5, "½", "Quarter Turn"),
    (-0.5, "-½", "Quarter Turn"),
    (0.25, "¼", "Eighth Turn"),
    (-0.25, "-¼", "Eighth Turn"),
];

/// Z-only phase gradients.
const PHASES: [(f64, &str, &str); 4] = [
    (0.125, "⅛", "Sixteenth Turn"),
    (-0.125, "-⅛", "Sixteenth Turn"),
    (0.0625, "⅟₁₆", "Thirty-Second Turn"),
    (-0.0625, "-⅟₁₆", "Thirty-Second Turn"),
];

fn negated(label: &str) -> String {
    label
        .strip_prefix('-')
        .map_or_else(|| format!("-{label}"), str::to_owned)
}

fn direction(exponent: f64) -> &'static str {
    if exponent < 0.0 {
        "counter-clockwise"
    } else {
        "clockwise"
    }
}

pub(super) fn register(catalog: &mut GateCatalog) -> Result<(), EngineError> {
    let _ = catalog.register(
        GateBuilder::new("H", "H")
            .title("Hadamard Gate")
            .blurb(
                "Creates simple superpositions.\nMaps ON to ON-OFF and OFF \
                 to ON+OFF.",
            )
            .matrix(Matrix::hadamard())
            .adjoint("H")
            .build()?,
    )?;
    for (axis, letter) in AXES {
        let blurb = match axis {
            PauliAxis::X => "The NOT gate.\nToggles between ON and OFF.",
            PauliAxis::Y => "Toggles with both value and phase flips.",
            PauliAxis::Z => "The phase flip gate.\nNegates phases when ON.",
        };
        let _ = catalog.register(
            GateBuilder::new(letter, letter)
                .title(format!("Pauli {letter} Gate"))
                .blurb(blurb)
                .matrix(Matrix::pauli(axis))
                .adjoint(letter)
                .build()?,
        )?;
        for (exponent, label, title) in TURNS {
            register_turn(catalog, axis, letter, exponent, label, title)?;
        }
        let spin = format!("{letter}^t");
        let unspin = format!("{letter}^-t");
        for (sign, id, inverse) in [(1.0, &spin, &unspin), (-1.0, &unspin, &spin)]
        {
            let _ = catalog.register(
                GateBuilder::new(id.as_str(), id.as_str())
                    .title(format!("{letter}-Axis Spinning Gate"))
                    .blurb(format!(
                        "Rotates {} around the {letter} axis, one full turn \
                         per animation cycle.",
                        direction(sign)
                    ))
                    .glyph("spinning")
                    .adjoint(inverse.as_str())
                    .time_varying(move |t| {
                        Matrix::pauli_power(axis, sign * 2.0 * t)
                    })
                    .build()?,
            )?;
        }
    }
    for (exponent, label, title) in PHASES {
        register_turn(catalog, PauliAxis::Z, "Z", exponent, label, title)?;
    }
    Ok(())
}

fn register_turn(
    catalog: &mut GateCatalog,
    axis: PauliAxis,
    letter: &str,
    exponent: f64,
    label: &str,
    title: &str,
) -> Result<(), EngineError> {
    let id = format!("{letter}^{label}");
    let _ = catalog.register(
        GateBuilder::new(id.as_str(), id.as_str())
            .title(format!("{letter}-Axis {title}"))
            .blurb(format!(
                "Rotates {} around the {letter} axis by {}°.",
                direction(exponent),
                (exponent * 180.0).abs()
            ))
            .matrix(Matrix::pauli_power(axis, exponent))
            .adjoint(format!("{letter}^{}", negated(label)))
            .build()?,
    )?;
    Ok(())
}
