//! Circuits: columns of gates over wires, their JSON form, and evaluation.
//!
//! ```json
//! {"cols": [["H", 1, "•"], ["QFT3"]]}
//! ```
//!
//! Each column is indexed by wire. `1` or `null` is an empty wire, a string
//! is a catalog id, and `{"id": .., "matrix": ..}` is a custom matrix gate.
//! Ids the catalog does not know load as placeholders and are written back
//! unchanged.

mod compile;
mod evaluator;

use std::sync::Arc;

pub use compile::compile_column;
pub use evaluator::{CircuitEvaluator, EvaluationFailure, EvaluationOutput};
use serde::{Deserialize, Serialize};

use crate::catalog::{custom_matrix_gate, GateCatalog, GateDefinition};
use crate::error::EngineError;
use crate::math::Matrix;

/// One occupied wire of a column.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    gate: Arc<GateDefinition>,
    persist_matrix: bool,
}

impl Cell {
    /// A catalog gate, persisted by id.
    #[must_use]
    pub const fn new(gate: Arc<GateDefinition>) -> Self {
        Self {
            gate,
            persist_matrix: false,
        }
    }

    /// A gate persisted by id together with its matrix (custom and mystery
    /// gates).
    #[must_use]
    pub fn with_matrix(gate: GateDefinition) -> Self {
        Self {
            gate: Arc::new(gate),
            persist_matrix: true,
        }
    }

    /// The gate.
    #[must_use]
    pub fn gate(&self) -> &Arc<GateDefinition> {
        &self.gate
    }
}

impl From<Arc<GateDefinition>> for Cell {
    fn from(gate: Arc<GateDefinition>) -> Self {
        Self::new(gate)
    }
}

/// Gates applied together, indexed by their top wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Column {
    cells: Vec<Option<Cell>>,
}

impl Column {
    /// Empty column.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `cell` with its top at `wire`.
    #[must_use]
    pub fn with(mut self, wire: u32, cell: impl Into<Cell>) -> Self {
        self.set(wire, Some(cell.into()));
        self
    }

    /// Replace the cell at `wire`.
    pub fn set(&mut self, wire: u32, cell: Option<Cell>) {
        let wire = wire as usize;
        if self.cells.len() <= wire {
            self.cells.resize(wire + 1, None);
        }
        self.cells[wire] = cell;
        while matches!(self.cells.last(), Some(None)) {
            let _ = self.cells.pop();
        }
    }

    /// Cell at `wire`.
    #[must_use]
    pub fn cell(&self, wire: u32) -> Option<&Cell> {
        self.cells.get(wire as usize).and_then(Option::as_ref)
    }

    /// Occupied wires with their cells, top to bottom.
    pub fn occupied(&self) -> impl Iterator<Item = (u32, &Cell)> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(w, c)| c.as_ref().map(|c| (w as u32, c)))
    }

    /// Wires spanned, counting gate heights.
    #[must_use]
    pub fn extent(&self) -> u32 {
        self.occupied()
            .map(|(w, c)| w + c.gate.height())
            .max()
            .unwrap_or(0)
    }
}

/// An ordered list of columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Circuit {
    columns: Vec<Column>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum PersistedCell {
    Id(String),
    Custom { id: String, matrix: Matrix },
    Blank(u64),
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedCircuit {
    cols: Vec<Vec<Option<PersistedCell>>>,
}

impl Circuit {
    /// A circuit over the given columns.
    #[must_use]
    pub const fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Columns in application order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Wires needed by the widest column, at least one.
    #[must_use]
    pub fn qubit_count(&self) -> u32 {
        self.columns.iter().map(Column::extent).max().unwrap_or(0).max(1)
    }

    /// Parse the JSON form, resolving ids against `catalog`.
    ///
    /// # Errors
    ///
    /// [`EngineError::Circuit`] for malformed JSON or cells;
    /// [`EngineError::InvalidGate`] for custom matrices that are not
    /// unitary.
    pub fn from_json(json: &str, catalog: &GateCatalog) -> Result<Self, EngineError> {
        let persisted: PersistedCircuit = serde_json::from_str(json)
            .map_err(|e| EngineError::Circuit(e.to_string()))?;
        let mut columns = Vec::with_capacity(persisted.cols.len());
        for (c, col) in persisted.cols.into_iter().enumerate() {
            let mut column = Column::new();
            for (w, entry) in col.into_iter().enumerate() {
                let cell = match entry {
                    None | Some(PersistedCell::Blank(1)) => continue,
                    Some(PersistedCell::Blank(n)) => {
                        return Err(EngineError::Circuit(format!(
                            "column {c} wire {w}: unexpected cell value {n}"
                        )));
                    }
                    Some(PersistedCell::Id(id)) => {
                        Cell::new(catalog.lookup_or_placeholder(&id))
                    }
                    Some(PersistedCell::Custom { id, matrix }) => {
                        Cell::with_matrix(custom_matrix_gate(id, matrix)?)
                    }
                };
                column.set(w as u32, Some(cell));
            }
            columns.push(column);
        }
        Ok(Self { columns })
    }

    /// The JSON form. Empty wires are written as `1`.
    ///
    /// # Errors
    ///
    /// [`EngineError::Circuit`] if a matrix-carrying cell has no matrix.
    pub fn to_json(&self) -> Result<String, EngineError> {
        let mut cols = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let mut col = Vec::with_capacity(column.cells.len());
            for cell in &column.cells {
                col.push(Some(match cell {
                    None => PersistedCell::Blank(1),
                    Some(cell) if cell.persist_matrix => {
                        let matrix = cell.gate.matrix_at(0.0).ok_or_else(|| {
                            EngineError::Circuit(format!(
                                "{} has no matrix to persist",
                                cell.gate.serialized_id()
                            ))
                        })?;
                        PersistedCell::Custom {
                            id: cell.gate.serialized_id().to_owned(),
                            matrix,
                        }
                    }
                    Some(cell) => {
                        PersistedCell::Id(cell.gate.serialized_id().to_owned())
                    }
                }));
            }
            cols.push(col);
        }
        serde_json::to_string(&PersistedCircuit { cols })
            .map_err(|e| EngineError::Circuit(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{mystery_gate, GateRole, CUSTOM_GATE_ID};

    fn catalog() -> GateCatalog {
        GateCatalog::standard().unwrap()
    }

    #[test]
    fn round_trips_ids_and_blanks() {
        let json = r#"{"cols":[["H",1,"•"],["QFT3"]]}"#;
        let circuit = Circuit::from_json(json, &catalog()).unwrap();
        assert_eq!(circuit.columns().len(), 2);
        assert_eq!(circuit.qubit_count(), 3);
        assert_eq!(circuit.to_json().unwrap(), json);
    }

    #[test]
    fn null_is_an_empty_wire() {
        let circuit =
            Circuit::from_json(r#"{"cols":[[null,"X"]]}"#, &catalog()).unwrap();
        let column = &circuit.columns()[0];
        assert!(column.cell(0).is_none());
        assert_eq!(column.cell(1).unwrap().gate().serialized_id(), "X");
        assert_eq!(circuit.to_json().unwrap(), r#"{"cols":[[1,"X"]]}"#);
    }

    #[test]
    fn unknown_ids_become_placeholders_and_survive() {
        let json = r#"{"cols":[["Frobnicate",1,"H"]]}"#;
        let circuit = Circuit::from_json(json, &catalog()).unwrap();
        let cell = circuit.columns()[0].cell(0).unwrap();
        assert_eq!(cell.gate().role(), GateRole::Placeholder);
        assert_eq!(circuit.to_json().unwrap(), json);
    }

    #[test]
    fn custom_matrices_round_trip() {
        let json = r#"{"cols":[[{"id":"?","matrix":[[[0.0,0.0],[1.0,0.0]],[[1.0,0.0],[0.0,0.0]]]}]]}"#;
        let circuit = Circuit::from_json(json, &catalog()).unwrap();
        let gate = circuit.columns()[0].cell(0).unwrap().gate();
        assert_eq!(gate.serialized_id(), CUSTOM_GATE_ID);
        let back: serde_json::Value =
            serde_json::from_str(&circuit.to_json().unwrap()).unwrap();
        let original: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn mystery_gates_persist_their_matrix() {
        let gate = mystery_gate(&mut rand::rng()).unwrap();
        let matrix = gate.matrix_at(0.0).unwrap();
        let circuit =
            Circuit::new(vec![Column::new().with(0, Cell::with_matrix(gate))]);
        let reloaded =
            Circuit::from_json(&circuit.to_json().unwrap(), &catalog()).unwrap();
        let loaded = reloaded.columns()[0].cell(0).unwrap().gate();
        assert!(loaded.matrix_at(0.0).unwrap().approx_eq(&matrix, 1e-12));
    }

    #[test]
    fn malformed_input_is_a_circuit_error() {
        let cat = catalog();
        assert!(matches!(
            Circuit::from_json("{\"cols\": 3}", &cat),
            Err(EngineError::Circuit(_))
        ));
        assert!(matches!(
            Circuit::from_json(r#"{"cols":[[2]]}"#, &cat),
            Err(EngineError::Circuit(_))
        ));
        let non_unitary = r#"{"cols":[[{"id":"?","matrix":[[[2.0,0.0],[0.0,0.0]],[[0.0,0.0],[1.0,0.0]]]}]]}"#;
        assert!(matches!(
            Circuit::from_json(non_unitary, &cat),
            Err(EngineError::InvalidGate(_))
        ));
    }

    #[test]
    fn qubit_count_includes_gate_heights() {
        let cat = catalog();
        let circuit = Circuit::new(vec![
            Column::new().with(1, cat.lookup("QFT4").unwrap()),
            Column::new().with(0, cat.lookup("X").unwrap()),
        ]);
        assert_eq!(circuit.qubit_count(), 5);
        assert_eq!(Circuit::default().qubit_count(), 1);
    }
}
