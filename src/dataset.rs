use crate::error::{PipelineError, Result};
use geo::Polygon;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::debug;

/// A single attribute value on a parcel feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Null,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Text form of the value; numbers render without a trailing `.0`
    /// so house numbers stored as doubles concatenate cleanly.
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Number(n) => Some(number_to_text(*n)),
            FieldValue::Null => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.parse().ok(),
            FieldValue::Null => None,
        }
    }
}

fn number_to_text(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// One parcel polygon plus its attribute map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub geometry: Polygon<f64>,
    pub attributes: BTreeMap<String, FieldValue>,
}

static NULL_VALUE: FieldValue = FieldValue::Null;

impl Feature {
    pub fn new(geometry: Polygon<f64>) -> Self {
        Self {
            geometry,
            attributes: BTreeMap::new(),
        }
    }

    /// Attribute lookup; fields a feature never carried read as null.
    pub fn get(&self, field: &str) -> &FieldValue {
        self.attributes.get(field).unwrap_or(&NULL_VALUE)
    }

    pub fn set(&mut self, field: &str, value: FieldValue) {
        self.attributes.insert(field.to_string(), value);
    }
}

/// A named collection of parcel features sharing one coordinate system.
///
/// Both the per-municipality working datasets and the merged master are
/// represented this way; they differ only in which attribute fields their
/// features carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    /// CRS identifier, e.g. "EPSG:2284". Coordinates are in US feet.
    pub crs: String,
    pub features: Vec<Feature>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, crs: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            crs: crs.into(),
            features: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// The set of attribute fields present across all features.
    pub fn field_names(&self) -> BTreeSet<String> {
        self.features
            .iter()
            .flat_map(|f| f.attributes.keys().cloned())
            .collect()
    }

    /// Drops every attribute not in `keep` from every feature. This is the
    /// single projection primitive applied wherever a field-set boundary is
    /// crossed (after normalization, after each join, after finalization).
    pub fn project(&mut self, keep: &[&str]) {
        for feature in &mut self.features {
            feature.attributes.retain(|name, _| keep.contains(&name.as_str()));
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let dataset: Dataset = serde_json::from_str(&content)?;
        debug!(dataset = %dataset.name, features = dataset.len(), "Loaded dataset");
        Ok(dataset)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        debug!(dataset = %self.name, path = %path.display(), "Saved dataset");
        Ok(())
    }

    /// Load wrapper that tags failures with the owning source id, so the
    /// orchestrator can report a missing or malformed staged file as that
    /// municipality's soft failure.
    pub fn load_for_source(path: &Path, source_id: &str) -> Result<Self> {
        Dataset::load(path).map_err(|e| PipelineError::SourceUnavailable {
            source_id: source_id.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square() -> Polygon<f64> {
        polygon![
            (x: 0.0, y: 0.0),
            (x: 100.0, y: 0.0),
            (x: 100.0, y: 100.0),
            (x: 0.0, y: 100.0),
            (x: 0.0, y: 0.0),
        ]
    }

    #[test]
    fn numbers_render_as_text_without_decimal_point() {
        assert_eq!(FieldValue::Number(123.0).as_text().unwrap(), "123");
        assert_eq!(FieldValue::Number(12.5).as_text().unwrap(), "12.5");
        assert_eq!(FieldValue::Text("7A".into()).as_text().unwrap(), "7A");
        assert!(FieldValue::Null.as_text().is_none());
    }

    #[test]
    fn projection_drops_everything_outside_the_keep_list() {
        let mut dataset = Dataset::new("test", "EPSG:2284");
        let mut feature = Feature::new(square());
        feature.set("parcel_id", FieldValue::Text("1".into()));
        feature.set("GPIN", FieldValue::Text("native".into()));
        feature.set("OWNERSNAME", FieldValue::Text("native".into()));
        dataset.features.push(feature);

        dataset.project(&["parcel_id"]);

        let names = dataset.field_names();
        assert_eq!(names.len(), 1);
        assert!(names.contains("parcel_id"));
    }

    #[test]
    fn roundtrips_through_json_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wb.json");

        let mut dataset = Dataset::new("williamsburg", "EPSG:2284");
        let mut feature = Feature::new(square());
        feature.set("PID", FieldValue::Text("48-1-01-0-0001".into()));
        feature.set("ACRES", FieldValue::Number(0.23));
        dataset.features.push(feature);
        dataset.save(&path).unwrap();

        let loaded = Dataset::load(&path).unwrap();
        assert_eq!(loaded.name, "williamsburg");
        assert_eq!(loaded.len(), 1);
        assert_eq!(
            loaded.features[0].get("PID"),
            &FieldValue::Text("48-1-01-0-0001".into())
        );
    }

    #[test]
    fn load_for_source_tags_the_failing_source() {
        let err = Dataset::load_for_source(Path::new("/nonexistent/hampton.json"), "hampton")
            .unwrap_err();
        match err {
            PipelineError::SourceUnavailable { source_id, .. } => {
                assert_eq!(source_id, "hampton")
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
