use tracing::{debug, info, instrument};

use crate::dataset::{Dataset, FieldValue};
use crate::pipeline::mapping::{FieldMapping, RunStamp, CANONICAL_FIELDS};

/// The engine every per-municipality adapter configuration runs on.
///
/// Applies a declarative `FieldMapping` to a working dataset in place:
/// afterwards every feature carries a value (possibly null) for all 14
/// canonical fields and nothing else. Operates on the staged working copy
/// only, never the vendor file.
pub struct FieldNormalizer {
    stamp: RunStamp,
}

impl FieldNormalizer {
    pub fn new(stamp: RunStamp) -> Self {
        Self { stamp }
    }

    #[instrument(skip(self, dataset, mapping), fields(source = mapping.source_id))]
    pub fn normalize(&self, dataset: &mut Dataset, mapping: &FieldMapping) {
        info!(features = dataset.len(), "Normalizing source dataset");

        for feature in &mut dataset.features {
            let mut canonical = std::collections::BTreeMap::new();
            for field in CANONICAL_FIELDS {
                let value = match mapping.rule_for(field) {
                    Some(rule) => rule.evaluate(feature, &self.stamp),
                    None => FieldValue::Null,
                };
                canonical.insert(field.to_string(), value);
            }
            // Replacing the attribute map wholesale both populates the
            // canonical fields and drops every native field in one step.
            feature.attributes = canonical;
        }

        debug!(source = mapping.source_id, "Source normalized to canonical schema");
    }
}
