use crate::dataset::{Feature, FieldValue};
use crate::geometry;

/// The canonical intermediate schema every municipal source is normalized
/// into. These names survive until the finalizer renames them to the
/// published schema.
pub const CANONICAL_FIELDS: [&str; 14] = [
    "parcel_id",
    "owner_name",
    "house_number",
    "street",
    "city",
    "state",
    "zip_code",
    "square_feet",
    "acres",
    "subdivision_name",
    "legal_description",
    "info_source",
    "edit_date",
    "edit_by",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaKind {
    SquareFeet,
    Acres,
}

/// One declarative rule populating one canonical field from a source record.
///
/// Rules are pure per-record; the run-stamp rules (`RunDate`, `Operator`,
/// `StateCode`) evaluate to the same value for the whole run.
#[derive(Debug, Clone)]
pub enum FieldRule {
    /// Copy a native field verbatim.
    DirectCopy(&'static str),
    /// A fixed per-source value, e.g. the provenance label.
    Constant(&'static str),
    /// First whitespace-delimited token of a combined address string.
    SplitFirstToken(&'static str),
    /// Everything after the first token, rejoined with single spaces.
    SplitRemainder(&'static str),
    /// Numeric house number coerced to text, then an apartment/suffix
    /// field appended. String concatenation, never arithmetic.
    NumberWithSuffix {
        number: &'static str,
        suffix: &'static str,
    },
    /// Recomputed from geometry; source area attributes are never trusted.
    ComputedArea(AreaKind),
    /// The run's date stamp (yyyymmdd).
    RunDate,
    /// The operator identity for this run.
    Operator,
    /// The deployment's two-letter jurisdiction code.
    StateCode,
}

/// Run-constant inputs the stamp rules draw from.
#[derive(Debug, Clone)]
pub struct RunStamp {
    pub date_stamp: String,
    pub operator: String,
    pub state_code: String,
}

impl FieldRule {
    /// Evaluates the rule against one feature. A referenced native field
    /// that is absent or null yields `Null` rather than an error; the
    /// pipeline's soft-fail policy leaves such fields empty for the whole
    /// source instead of aborting the batch.
    pub fn evaluate(&self, feature: &Feature, stamp: &RunStamp) -> FieldValue {
        match self {
            FieldRule::DirectCopy(native) => feature.get(native).clone(),
            FieldRule::Constant(value) => FieldValue::Text((*value).to_string()),
            FieldRule::SplitFirstToken(native) => match feature.get(native).as_text() {
                Some(text) => FieldValue::Text(split_first_token(&text)),
                None => FieldValue::Null,
            },
            FieldRule::SplitRemainder(native) => match feature.get(native).as_text() {
                Some(text) => FieldValue::Text(split_remainder(&text)),
                None => FieldValue::Null,
            },
            FieldRule::NumberWithSuffix { number, suffix } => {
                match feature.get(number).as_text() {
                    Some(house) => {
                        let suffix = feature.get(suffix).as_text().unwrap_or_default();
                        FieldValue::Text(format!("{house}{suffix}"))
                    }
                    None => FieldValue::Null,
                }
            }
            FieldRule::ComputedArea(kind) => FieldValue::Number(match kind {
                AreaKind::SquareFeet => geometry::area_square_feet(&feature.geometry),
                AreaKind::Acres => geometry::area_acres(&feature.geometry),
            }),
            FieldRule::RunDate => FieldValue::Text(stamp.date_stamp.clone()),
            FieldRule::Operator => FieldValue::Text(stamp.operator.clone()),
            FieldRule::StateCode => FieldValue::Text(stamp.state_code.clone()),
        }
    }
}

/// First whitespace-delimited token. "123 Main St" -> "123";
/// "Parcel42" -> "Parcel42".
pub fn split_first_token(text: &str) -> String {
    text.split_whitespace().next().unwrap_or("").to_string()
}

/// Everything after the first token, rejoined with single spaces.
/// "123 Main St" -> "Main St"; a string with no internal space -> "".
pub fn split_remainder(text: &str) -> String {
    let mut tokens = text.split_whitespace();
    tokens.next();
    tokens.collect::<Vec<_>>().join(" ")
}

/// The declarative normalization table for one municipality: at most one
/// rule per canonical field; unmapped canonical fields default to null.
#[derive(Debug, Clone)]
pub struct FieldMapping {
    pub source_id: &'static str,
    pub rules: Vec<(&'static str, FieldRule)>,
}

impl FieldMapping {
    pub fn rule_for(&self, canonical: &str) -> Option<&FieldRule> {
        self.rules
            .iter()
            .find(|(field, _)| *field == canonical)
            .map(|(_, rule)| rule)
    }
}
