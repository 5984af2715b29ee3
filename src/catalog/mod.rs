//! Gate definitions and the registry that resolves serialization ids.
//!
//! A [`GateDefinition`] is immutable once built. The [`GateCatalog`] maps
//! unique serialization ids to shared definitions and span-indexed
//! [`GateFamily`]s to their variants. Lookups of unknown ids are
//! recoverable: the circuit loader substitutes
//! [`GateDefinition::placeholder`] and keeps going.

mod builder;
mod definition;
mod family;
mod gate_sets;
mod gates;
mod mystery;

use std::sync::Arc;

pub use builder::GateBuilder;
pub use definition::{
    GateBody, GateContext, GateDefinition, GateRole, KernelFn, MatrixFn,
    Register,
};
pub use family::GateFamily;
pub use gate_sets::{GateSet, STANDARD_GATE_SETS};
use log::{debug, warn};
pub use mystery::{custom_matrix_gate, mystery_gate, CUSTOM_GATE_ID};
use rustc_hash::FxHashMap;

use crate::error::EngineError;

/// Registry of gates keyed by serialization id.
#[derive(Debug, Default)]
pub struct GateCatalog {
    gates: FxHashMap<String, Arc<GateDefinition>>,
    families: FxHashMap<String, GateFamily>,
}

impl GateCatalog {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in gates and families.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidGate`] if a built-in definition fails
    /// validation.
    pub fn standard() -> Result<Self, EngineError> {
        let mut catalog = Self::new();
        gates::register_standard(&mut catalog)?;
        debug!(
            "standard catalog: {} gates, {} families",
            catalog.gates.len(),
            catalog.families.len()
        );
        Ok(catalog)
    }

    /// Register a gate under its serialization id.
    ///
    /// Registering a structurally equal definition again returns the
    /// existing entry.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidGate`] if a different definition already uses
    /// the id.
    pub fn register(
        &mut self,
        gate: GateDefinition,
    ) -> Result<Arc<GateDefinition>, EngineError> {
        self.insert(Arc::new(gate))
    }

    fn insert(
        &mut self,
        gate: Arc<GateDefinition>,
    ) -> Result<Arc<GateDefinition>, EngineError> {
        if let Some(existing) = self.gates.get(gate.serialized_id()) {
            if **existing == *gate {
                return Ok(Arc::clone(existing));
            }
            return Err(EngineError::InvalidGate(format!(
                "id '{}' is already registered to a different gate",
                gate.serialized_id()
            )));
        }
        let _ = self
            .gates
            .insert(gate.serialized_id().to_owned(), Arc::clone(&gate));
        Ok(gate)
    }

    /// Register a family and every one of its variants.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidGate`] if the family id is taken or a variant
    /// fails to build or clashes with a registered gate.
    pub fn register_family(&mut self, family: GateFamily) -> Result<(), EngineError> {
        if self.families.contains_key(family.id()) {
            return Err(EngineError::InvalidGate(format!(
                "family '{}' is already registered",
                family.id()
            )));
        }
        for variant in family.all_variants()? {
            let _ = self.insert(variant)?;
        }
        let _ = self.families.insert(family.id().to_owned(), family);
        Ok(())
    }

    /// Resolve a serialization id.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownGate`] (recoverable) if nothing is registered
    /// under `id`.
    pub fn lookup(&self, id: &str) -> Result<Arc<GateDefinition>, EngineError> {
        self.gates
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownGate(id.to_owned()))
    }

    /// Resolve `id`, substituting a placeholder that remembers the id when
    /// it is unknown.
    #[must_use]
    pub fn lookup_or_placeholder(&self, id: &str) -> Arc<GateDefinition> {
        self.lookup(id).unwrap_or_else(|e| {
            warn!("{e}; substituting a placeholder");
            Arc::new(GateDefinition::placeholder(id))
        })
    }

    /// The id under which `gate` is registered, if it is.
    #[must_use]
    pub fn id_of(&self, gate: &GateDefinition) -> Option<&str> {
        self.gates
            .get_key_value(gate.serialized_id())
            .filter(|(_, registered)| ***registered == *gate)
            .map(|(id, _)| id.as_str())
    }

    /// A registered family.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownFamily`] if no family uses `family_id`.
    pub fn family(&self, family_id: &str) -> Result<&GateFamily, EngineError> {
        self.families
            .get(family_id)
            .ok_or_else(|| EngineError::UnknownFamily(family_id.to_owned()))
    }

    /// Every variant of a family, smallest span first.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownFamily`] if no family uses `family_id`.
    pub fn all_family_variants(
        &self,
        family_id: &str,
    ) -> Result<Vec<Arc<GateDefinition>>, EngineError> {
        self.family(family_id)?.all_variants()
    }

    /// Registered ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.gates.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered gates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Toolbox groupings over this catalog's ids.
    #[must_use]
    pub const fn gate_sets(&self) -> &'static [GateSet] {
        STANDARD_GATE_SETS
    }
}

#[cfg(test)]
mod tests {
    use num_complex::{Complex32, Complex64};
    use rustc_hash::FxHashSet;

    use super::*;
    use crate::kernel::reference::apply_pass;
    use crate::kernel::{ShaderPass, MAX_REGISTER_SPAN};
    use crate::math::Matrix;
    use crate::resource::{PixelEncoding, TextureShape};

    const EPS: f32 = 1e-6;

    fn catalog() -> GateCatalog {
        GateCatalog::standard().unwrap()
    }

    fn run(
        gate: &GateDefinition,
        ctx: &GateContext,
        qubits: u32,
        state: Vec<Complex32>,
    ) -> Vec<Complex32> {
        let shape = TextureShape::for_qubits(qubits, PixelEncoding::Float).unwrap();
        gate.kernels(ctx)
            .unwrap()
            .iter()
            .fold(state, |s, k| apply_pass(&ShaderPass::new(k.clone()), shape, &s))
    }

    fn sample(qubits: u32) -> Vec<Complex32> {
        let n = 1usize << qubits;
        let norm = (n as f32).sqrt();
        (0..n)
            .map(|i| Complex32::from_polar(1.0 / norm, i as f32 * 1.3 + 0.2))
            .collect()
    }

    fn close(a: &[Complex32], b: &[Complex32]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).norm() < EPS)
    }

    #[test]
    fn qft_family_has_one_id_per_span() {
        let cat = catalog();
        let variants = cat.all_family_variants("QFT").unwrap();
        assert_eq!(variants.len(), MAX_REGISTER_SPAN as usize);
        let ids: FxHashSet<&str> =
            variants.iter().map(|g| g.serialized_id()).collect();
        assert_eq!(ids.len(), 16);
        for span in 1..=16u32 {
            let gate = cat.lookup(&format!("QFT{span}")).unwrap();
            assert_eq!(gate.height(), span);
        }
    }

    #[test]
    fn qft1_is_hadamard() {
        let cat = catalog();
        let qft1 = cat.lookup("QFT1").unwrap();
        assert!(qft1.matrix_at(0.0).unwrap().approx_eq(&Matrix::hadamard(), 1e-12));
        let h = cat.lookup("H").unwrap();
        let ctx = GateContext::at(0, 1);
        let state = sample(1);
        assert!(close(
            &run(&qft1, &ctx, 1, state.clone()),
            &run(&h, &ctx, 1, state)
        ));
    }

    #[test]
    fn qft1_then_inverse_is_identity() {
        let cat = catalog();
        let ctx = GateContext::at(0, 1);
        let state = sample(1);
        let forward = run(&cat.lookup("QFT1").unwrap(), &ctx, 1, state.clone());
        let back = run(&cat.lookup("QFT†1").unwrap(), &ctx, 1, forward);
        assert!(close(&back, &state));
    }

    #[test]
    fn hadamard_on_zero_is_uniform() {
        let cat = catalog();
        let mut zero = vec![Complex32::new(0.0, 0.0); 2];
        zero[0] = Complex32::new(1.0, 0.0);
        let out = run(&cat.lookup("H").unwrap(), &GateContext::at(0, 1), 1, zero);
        let r = std::f32::consts::FRAC_1_SQRT_2;
        assert!(close(&out, &[Complex32::new(r, 0.0), Complex32::new(r, 0.0)]));
    }

    #[test]
    fn every_gate_then_its_adjoint_is_identity() {
        let cat = catalog();
        let mut checked = 0;
        for id in cat.ids() {
            let gate = cat.lookup(id).unwrap();
            let Some(adjoint_id) = gate.adjoint_id() else {
                continue;
            };
            let adjoint = cat.lookup(adjoint_id).unwrap();
            assert_eq!(adjoint.adjoint_id(), Some(id), "{id} adjoint pairing");
            if gate.height() > 5 {
                continue;
            }
            // Two spare wires hold input register A.
            let qubits = gate.height() + 2;
            let ctx = GateContext {
                offset: 0,
                span: gate.height(),
                time: 0.3,
                input_a: Some(Register {
                    offset: gate.height(),
                    span: 2,
                }),
            };
            let state = sample(qubits);
            let there = run(&gate, &ctx, qubits, state.clone());
            let back = run(&adjoint, &ctx, qubits, there);
            assert!(close(&back, &state), "{id} then {adjoint_id}");
            checked += 1;
        }
        assert!(checked > 50);
    }

    #[test]
    fn known_matrices_match_kernels() {
        let cat = catalog();
        for id in cat.ids() {
            let gate = cat.lookup(id).unwrap();
            if !matches!(gate.body(), GateBody::Kernels(_)) {
                continue;
            }
            let Some(matrix) = gate.matrix_at(0.0) else {
                continue;
            };
            let span = gate.height();
            let dim = 1usize << span;
            let ctx = GateContext::at(0, span);
            for col in 0..dim {
                let mut basis = vec![Complex32::new(0.0, 0.0); dim];
                basis[col] = Complex32::new(1.0, 0.0);
                let out = run(&gate, &ctx, span, basis);
                for (row, amp) in out.iter().enumerate() {
                    let m = matrix.get(row, col);
                    let diff = Complex32::new(m.re as f32, m.im as f32) - amp;
                    assert!(diff.norm() < EPS, "{id} entry ({row}, {col})");
                }
            }
        }
    }

    #[test]
    fn kernels_match_matrix_product_on_superpositions() {
        let cat = catalog();
        let mut checked = 0;
        for id in cat.ids() {
            let gate = cat.lookup(id).unwrap();
            let Some(matrix) = gate.matrix_at(0.3) else {
                continue;
            };
            let span = gate.height();
            let ctx = GateContext {
                time: 0.3,
                ..GateContext::at(0, span)
            };
            let Ok(kernels) = gate.kernels(&ctx) else {
                continue;
            };
            let state = sample(span);
            let shape = TextureShape::for_qubits(span, PixelEncoding::Float).unwrap();
            let out = kernels.iter().fold(state.clone(), |s, k| {
                apply_pass(&ShaderPass::new(k.clone()), shape, &s)
            });
            let wide: Vec<Complex64> = state
                .iter()
                .map(|a| Complex64::new(f64::from(a.re), f64::from(a.im)))
                .collect();
            for (i, (got, want)) in out.iter().zip(matrix.apply(&wide)).enumerate() {
                let diff = Complex64::new(f64::from(got.re), f64::from(got.im)) - want;
                assert!(diff.norm() < 1e-6, "{id} amplitude {i}: {got} vs {want}");
            }
            checked += 1;
        }
        assert!(checked > 30);
    }

    #[test]
    fn conflicting_registration_is_rejected() {
        let mut cat = GateCatalog::new();
        let h = GateBuilder::new("H", "H").matrix(Matrix::hadamard()).build().unwrap();
        let first = cat.register(h.clone()).unwrap();
        let again = cat.register(h).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        let impostor = GateBuilder::new("H", "H")
            .matrix(Matrix::identity(2))
            .build()
            .unwrap();
        assert!(matches!(cat.register(impostor), Err(EngineError::InvalidGate(_))));
        assert_eq!(cat.len(), 1);
    }

    #[test]
    fn unknown_ids_are_recoverable() {
        let cat = catalog();
        let err = cat.lookup("NotAGate").unwrap_err();
        assert!(matches!(err, EngineError::UnknownGate(_)));
        assert!(!err.is_fatal());
        let placeholder = cat.lookup_or_placeholder("NotAGate");
        assert_eq!(placeholder.serialized_id(), "NotAGate");
        assert_eq!(placeholder.role(), GateRole::Placeholder);
        assert!(matches!(
            cat.all_family_variants("Nope"),
            Err(EngineError::UnknownFamily(_))
        ));
    }

    #[test]
    fn reverse_lookup_finds_registered_gates_only() {
        let cat = catalog();
        let x = cat.lookup("X").unwrap();
        assert_eq!(cat.id_of(&x), Some("X"));
        let mut rng = rand::rng();
        let mystery = mystery_gate(&mut rng).unwrap();
        assert_eq!(cat.id_of(&mystery), None);
        assert_eq!(cat.id_of(&GateDefinition::placeholder("X")), None);
    }

    #[test]
    fn gate_sets_resolve_without_repeats() {
        let cat = catalog();
        for set in cat.gate_sets() {
            let unique: FxHashSet<&str> = set.ids.iter().copied().collect();
            assert_eq!(unique.len(), set.ids.len(), "{} repeats an id", set.name);
            for id in set.ids {
                assert!(cat.lookup(id).is_ok(), "{} lists unknown {id}", set.name);
            }
        }
    }

    #[test]
    fn spinning_gates_vary_with_time() {
        let cat = catalog();
        let gate = cat.lookup("X^t").unwrap();
        assert!(!gate.is_stable());
        let a = gate.matrix_at(0.1).unwrap();
        let b = gate.matrix_at(0.6).unwrap();
        assert!(!a.approx_eq(&b, 1e-6));
        assert!(gate.matrix_at(0.0).unwrap().approx_eq(&Matrix::identity(2), 1e-12));
    }

    #[test]
    fn arithmetic_with_register_needs_input_a() {
        let cat = catalog();
        let gate = cat.lookup("+=A2").unwrap();
        assert!(matches!(
            gate.kernels(&GateContext::at(0, 2)),
            Err(EngineError::Circuit(_))
        ));
    }
}
