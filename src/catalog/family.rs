use std::fmt;
use std::ops::RangeInclusive;
use std::sync::{Arc, OnceLock};

use super::definition::GateDefinition;
use crate::error::EngineError;

type VariantFn =
    Box<dyn Fn(u32) -> Result<GateDefinition, EngineError> + Send + Sync>;

/// Span-indexed gates sharing an id prefix (`"QFT"` → `QFT1`, `QFT2`, …).
///
/// `of_size` is a pure function of the span; each variant is built at most
/// once and shared afterwards.
pub struct GateFamily {
    prefix: String,
    spans: RangeInclusive<u32>,
    make: VariantFn,
    variants: Vec<OnceLock<Arc<GateDefinition>>>,
}

impl GateFamily {
    /// A family over `spans`. `make(span)` must return a gate with id
    /// `prefix + span` and height `span`.
    pub fn new(
        prefix: impl Into<String>,
        spans: RangeInclusive<u32>,
        make: impl Fn(u32) -> Result<GateDefinition, EngineError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        let count = spans.clone().count();
        Self {
            prefix: prefix.into(),
            spans,
            make: Box::new(make),
            variants: (0..count).map(|_| OnceLock::new()).collect(),
        }
    }

    /// Family id, also the prefix of every variant id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.prefix
    }

    /// Supported spans.
    #[must_use]
    pub fn spans(&self) -> RangeInclusive<u32> {
        self.spans.clone()
    }

    /// Serialization id of the variant of `span`.
    #[must_use]
    pub fn variant_id(&self, span: u32) -> String {
        format!("{}{span}", self.prefix)
    }

    /// The variant covering `span` wires.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownGate`] when `span` is outside the family's
    /// range; [`EngineError::InvalidGate`] when the constructed variant
    /// does not carry the expected id and height.
    pub fn of_size(&self, span: u32) -> Result<Arc<GateDefinition>, EngineError> {
        let slot = span
            .checked_sub(*self.spans.start())
            .filter(|_| self.spans.contains(&span))
            .and_then(|i| self.variants.get(i as usize))
            .ok_or_else(|| EngineError::UnknownGate(self.variant_id(span)))?;
        if let Some(gate) = slot.get() {
            return Ok(Arc::clone(gate));
        }
        let gate = (self.make)(span)?;
        let expected = self.variant_id(span);
        if gate.serialized_id() != expected || gate.height() != span {
            return Err(EngineError::InvalidGate(format!(
                "family {} built '{}' (height {}) for span {span}",
                self.prefix,
                gate.serialized_id(),
                gate.height()
            )));
        }
        Ok(Arc::clone(slot.get_or_init(|| Arc::new(gate))))
    }

    /// Every variant, smallest span first.
    ///
    /// # Errors
    ///
    /// The first error raised by [`Self::of_size`].
    pub fn all_variants(&self) -> Result<Vec<Arc<GateDefinition>>, EngineError> {
        self.spans().map(|span| self.of_size(span)).collect()
    }
}

impl fmt::Debug for GateFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateFamily")
            .field("prefix", &self.prefix)
            .field("spans", &self.spans)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::catalog::GateBuilder;

    #[test]
    fn variants_are_built_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let family = GateFamily::new("spacer", 1..=3, move |span| {
            let _ = counter.fetch_add(1, Ordering::Relaxed);
            GateBuilder::new(format!("spacer{span}"), "…").height(span).build()
        });
        let a = family.of_size(2).unwrap();
        let b = family.of_size(2).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(family.all_variants().unwrap().len(), 3);
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn out_of_range_span_is_unknown() {
        let family = GateFamily::new("x", 2..=4, |span| {
            GateBuilder::new(format!("x{span}"), "x").height(span).build()
        });
        assert!(matches!(family.of_size(1), Err(EngineError::UnknownGate(id)) if id == "x1"));
        assert!(family.of_size(5).is_err());
        assert!(family.of_size(4).is_ok());
    }

    #[test]
    fn mismatched_variant_is_rejected() {
        let family = GateFamily::new("y", 1..=2, |_| GateBuilder::new("y1", "y").build());
        assert!(family.of_size(1).is_ok());
        assert!(matches!(family.of_size(2), Err(EngineError::InvalidGate(_))));
    }
}
