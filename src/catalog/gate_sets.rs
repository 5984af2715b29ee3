use serde::Serialize;

/// A named toolbox grouping of gate ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GateSet {
    /// Heading shown above the group.
    pub name: &'static str,
    /// Serialization ids, in display order.
    pub ids: &'static [&'static str],
}

/// The standard toolbox.
pub const STANDARD_GATE_SETS: &[GateSet] = &[
    GateSet {
        name: "Structure",
        ids: &["•", "◦", "…", "Swap"],
    },
    GateSet {
        name: "Half Turns",
        ids: &["H", "X", "Y", "Z"],
    },
    GateSet {
        name: "Quarter Turns",
        ids: &["X^½", "X^-½", "Y^½", "Y^-½", "Z^½", "Z^-½"],
    },
    GateSet {
        name: "Eighth Turns",
        ids: &["X^¼", "X^-¼", "Y^¼", "Y^-¼", "Z^¼", "Z^-¼"],
    },
    GateSet {
        name: "Phase Gradients",
        ids: &["Z^⅛", "Z^-⅛", "Z^⅟₁₆", "Z^-⅟₁₆"],
    },
    GateSet {
        name: "Spinning",
        ids: &["X^t", "X^-t", "Y^t", "Y^-t", "Z^t", "Z^-t"],
    },
    GateSet {
        name: "Frequency",
        ids: &["QFT3", "QFT†3"],
    },
    GateSet {
        name: "Order",
        ids: &["<<3", ">>3"],
    },
    GateSet {
        name: "Arithmetic",
        ids: &[
            "inc3", "dec3", "inputA2", "+=A2", "-=A2", "+cntA2", "-cntA2",
        ],
    },
    GateSet {
        name: "Time",
        ids: &["Counting3", "Uncounting3"],
    },
    GateSet {
        name: "Unstable",
        ids: &["__unstable__UniversalNot", "__error__"],
    },
];
