use tracing::{info, instrument};

use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};

/// Concatenates normalized source datasets into one master dataset.
///
/// Inputs must agree on field set and coordinate system; a mismatch aborts
/// the whole merge rather than producing a corrupted master. A zero-feature
/// input is a valid empty monthly delivery: it contributes 0 records and is
/// exempt from the field-set check, since it has no attributes to compare.
/// Feature order is input order, so the output is stable across runs for a
/// fixed source list.
#[instrument(skip(datasets), fields(inputs = datasets.len()))]
pub fn merge(name: &str, datasets: Vec<Dataset>) -> Result<Dataset> {
    let mut iter = datasets.into_iter();
    let first = iter.next().ok_or_else(|| PipelineError::SchemaMismatch {
        dataset: name.to_string(),
        message: "no source datasets to merge".to_string(),
    })?;

    let crs = first.crs.clone();
    // Established by the first non-empty input
    let mut schema = if first.is_empty() {
        None
    } else {
        Some(first.field_names())
    };

    let mut master = Dataset::new(name, crs.clone());
    let first_name = first.name.clone();
    let first_len = first.len();
    master.features.extend(first.features);
    info!(source = %first_name, features = first_len, "Merged source");

    for dataset in iter {
        if dataset.crs != crs {
            return Err(PipelineError::SchemaMismatch {
                dataset: dataset.name,
                message: format!("coordinate system '{}' differs from '{}'", dataset.crs, crs),
            });
        }
        if !dataset.is_empty() {
            let fields = dataset.field_names();
            match &schema {
                Some(expected) if *expected != fields => {
                    return Err(PipelineError::SchemaMismatch {
                        dataset: dataset.name,
                        message: "field set differs from other sources".to_string(),
                    });
                }
                Some(_) => {}
                None => schema = Some(fields),
            }
        }
        info!(source = %dataset.name, features = dataset.len(), "Merged source");
        master.features.extend(dataset.features);
    }

    info!(features = master.len(), "Master dataset assembled");
    Ok(master)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Feature, FieldValue};
    use geo::polygon;

    fn unit_square() -> geo::Polygon<f64> {
        polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ]
    }

    fn dataset(name: &str, crs: &str, ids: &[&str]) -> Dataset {
        let mut d = Dataset::new(name, crs);
        for id in ids {
            let mut f = Feature::new(unit_square());
            f.set("parcel_id", FieldValue::Text((*id).into()));
            f.set("info_source", FieldValue::Text(name.into()));
            d.features.push(f);
        }
        d
    }

    #[test]
    fn merge_is_a_disjoint_union_preserving_input_order() {
        let a = dataset("a", "EPSG:2284", &["a1", "a2"]);
        let b = dataset("b", "EPSG:2284", &["b1"]);
        let c = dataset("c", "EPSG:2284", &["c1", "c2", "c3"]);

        let master = merge("master", vec![a, b, c]).unwrap();
        assert_eq!(master.len(), 6);

        let ids: Vec<String> = master
            .features
            .iter()
            .map(|f| f.get("parcel_id").as_text().unwrap())
            .collect();
        assert_eq!(ids, vec!["a1", "a2", "b1", "c1", "c2", "c3"]);
    }

    #[test]
    fn crs_mismatch_fails_the_whole_merge() {
        let a = dataset("a", "EPSG:2284", &["a1"]);
        let b = dataset("b", "EPSG:4326", &["b1"]);

        let err = merge("master", vec![a, b]).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
    }

    #[test]
    fn field_set_mismatch_fails_the_whole_merge() {
        let a = dataset("a", "EPSG:2284", &["a1"]);
        let mut b = dataset("b", "EPSG:2284", &["b1"]);
        b.features[0].set("rogue_field", FieldValue::Text("x".into()));

        let err = merge("master", vec![a, b]).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
    }

    #[test]
    fn empty_input_list_is_an_error() {
        assert!(merge("master", vec![]).is_err());
    }

    #[test]
    fn empty_delivery_contributes_zero_records_without_failing() {
        let a = dataset("a", "EPSG:2284", &["a1", "a2"]);
        let empty = dataset("b", "EPSG:2284", &[]);
        let c = dataset("c", "EPSG:2284", &["c1"]);

        let master = merge("master", vec![a, empty, c]).unwrap();
        assert_eq!(master.len(), 3);
    }

    #[test]
    fn empty_first_input_defers_schema_to_later_sources() {
        let empty = dataset("a", "EPSG:2284", &[]);
        let b = dataset("b", "EPSG:2284", &["b1"]);
        let mut c = dataset("c", "EPSG:2284", &["c1"]);
        c.features[0].set("rogue_field", FieldValue::Text("x".into()));

        // Schema comes from b, the first non-empty input; c still mismatches
        let err = merge("master", vec![empty, b, c]).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
    }

    #[test]
    fn empty_delivery_in_the_wrong_crs_still_fails() {
        let a = dataset("a", "EPSG:2284", &["a1"]);
        let empty = dataset("b", "EPSG:4326", &[]);

        let err = merge("master", vec![a, empty]).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
    }
}
