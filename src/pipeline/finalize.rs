use tracing::{info, instrument};

use crate::dataset::{Dataset, Feature, FieldValue};
use crate::geometry;
use crate::pipeline::mapping::RunStamp;

/// Placeholder written when a parcel has no usable house number.
pub const NO_HOUSE_NUMBER: &str = "--";

/// Canonical field name -> published field name, the exact schema the
/// downstream consumer appends into production.
pub const PUBLISHED_SCHEMA: [(&str, &str); 14] = [
    ("parcel_id", "Parcel_ID"),
    ("owner_name", "Name_Owner"),
    ("house_number", "HouseNumber"),
    ("street", "Street"),
    ("city", "City_Loc"),
    ("state", "State"),
    ("zip_code", "Zip_Code"),
    ("square_feet", "Square_Feet"),
    ("acres", "Acres_US"),
    ("subdivision_name", "Sub_Name"),
    ("legal_description", "Legal_Desc"),
    ("info_source", "Info_Source"),
    ("edit_date", "EditDate"),
    ("edit_by", "EditBy"),
];

pub fn published_field_names() -> Vec<&'static str> {
    PUBLISHED_SCHEMA.iter().map(|(_, published)| *published).collect()
}

fn starts_with_digit(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// The two ordered house-number corrections.
///
/// Pass 1 folds a non-numeric "house number" (e.g. "Lot", "Route") back
/// into the street name; pass 2 then replaces it with the `--` placeholder.
/// The passes share the original value, so street is decided before house
/// number is overwritten. Already-corrected records (placeholder, null,
/// empty) are left alone, which makes the correction idempotent.
fn correct_address(feature: &mut Feature) {
    let original = match feature.get("house_number").as_text() {
        Some(v) => v,
        None => return,
    };
    if original.is_empty() {
        feature.set("house_number", FieldValue::Text(NO_HOUSE_NUMBER.into()));
        return;
    }
    if starts_with_digit(&original) || original == NO_HOUSE_NUMBER {
        return;
    }

    // Pass 1: prepend the non-numeric token(s) to the street name
    let street = feature.get("street").as_text().unwrap_or_default();
    let corrected = if street.is_empty() {
        original.clone()
    } else {
        format!("{original} {street}")
    };
    feature.set("street", FieldValue::Text(corrected));

    // Pass 2: the original value was not a usable house number
    feature.set("house_number", FieldValue::Text(NO_HOUSE_NUMBER.into()));
}

/// Produces the terminal published artifact from the enriched master:
/// corrects house number/street, recomputes areas from geometry, stamps
/// state and edit fields, renames to the published schema, and projects
/// away everything else.
#[instrument(skip(master, stamp), fields(features = master.len()))]
pub fn finalize(master: &mut Dataset, final_name: &str, stamp: &RunStamp) {
    info!("Finalizing published schema");

    for feature in &mut master.features {
        correct_address(feature);

        feature.set(
            "square_feet",
            FieldValue::Number(geometry::area_square_feet(&feature.geometry)),
        );
        feature.set(
            "acres",
            FieldValue::Number(geometry::area_acres(&feature.geometry)),
        );
        feature.set("state", FieldValue::Text(stamp.state_code.clone()));
        feature.set("edit_date", FieldValue::Text(stamp.date_stamp.clone()));
        feature.set("edit_by", FieldValue::Text(stamp.operator.clone()));

        // Rename canonical fields to their published names
        for (canonical, published) in PUBLISHED_SCHEMA {
            let value = feature
                .attributes
                .remove(canonical)
                .unwrap_or(FieldValue::Null);
            feature.set(published, value);
        }
    }

    master.project(&published_field_names());
    master.name = final_name.to_string();
    info!(dataset = %master.name, "Published artifact ready");
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn stamp() -> RunStamp {
        RunStamp {
            date_stamp: "20160729".into(),
            operator: "bkingery".into(),
            state_code: "VA".into(),
        }
    }

    fn feature(house: Option<&str>, street: Option<&str>) -> Feature {
        let mut f = Feature::new(polygon![
            (x: 0.0, y: 0.0),
            (x: 100.0, y: 0.0),
            (x: 100.0, y: 100.0),
            (x: 0.0, y: 100.0),
            (x: 0.0, y: 0.0),
        ]);
        f.set(
            "house_number",
            house.map_or(FieldValue::Null, |v| FieldValue::Text(v.into())),
        );
        f.set(
            "street",
            street.map_or(FieldValue::Null, |v| FieldValue::Text(v.into())),
        );
        f
    }

    #[test]
    fn numeric_house_numbers_pass_through_unchanged() {
        let mut f = feature(Some("123"), Some("Oak Ave"));
        correct_address(&mut f);
        assert_eq!(f.get("house_number"), &FieldValue::Text("123".into()));
        assert_eq!(f.get("street"), &FieldValue::Text("Oak Ave".into()));
    }

    #[test]
    fn non_numeric_house_number_folds_into_street_then_becomes_placeholder() {
        let mut f = feature(Some("Lot A"), Some("Main St"));
        correct_address(&mut f);
        assert_eq!(f.get("street"), &FieldValue::Text("Lot A Main St".into()));
        assert_eq!(f.get("house_number"), &FieldValue::Text("--".into()));
    }

    #[test]
    fn correction_is_idempotent() {
        let mut f = feature(Some("Lot A"), Some("Main St"));
        correct_address(&mut f);
        let once = f.clone();
        correct_address(&mut f);
        assert_eq!(f.get("house_number"), once.get("house_number"));
        assert_eq!(f.get("street"), once.get("street"));
    }

    #[test]
    fn null_house_number_is_left_null() {
        let mut f = feature(None, Some("Main St"));
        correct_address(&mut f);
        assert_eq!(f.get("house_number"), &FieldValue::Null);
        assert_eq!(f.get("street"), &FieldValue::Text("Main St".into()));
    }

    #[test]
    fn non_numeric_house_number_with_empty_street_becomes_the_street() {
        let mut f = feature(Some("Route 5"), Some(""));
        correct_address(&mut f);
        assert_eq!(f.get("street"), &FieldValue::Text("Route 5".into()));
        assert_eq!(f.get("house_number"), &FieldValue::Text("--".into()));
    }

    #[test]
    fn finalize_yields_exactly_the_published_field_set() {
        let mut master = Dataset::new("master_join_2_city", "EPSG:2284");
        let mut f = feature(Some("123"), Some("Oak Ave"));
        // Leftover upstream fields that must not survive
        f.set("Join_Count", FieldValue::Number(1.0));
        f.set("TARGET_FID", FieldValue::Number(7.0));
        for canonical in ["parcel_id", "owner_name", "city", "state", "zip_code",
            "square_feet", "acres", "subdivision_name", "legal_description",
            "info_source", "edit_date", "edit_by"]
        {
            f.set(canonical, FieldValue::Text("x".into()));
        }
        master.features.push(f);

        finalize(&mut master, "real_property_parcel", &stamp());

        let names = master.field_names();
        assert_eq!(names.len(), 14);
        for (_, published) in PUBLISHED_SCHEMA {
            assert!(names.contains(published), "missing {published}");
        }
        assert!(!names.contains("Join_Count"));
        assert!(!names.contains("parcel_id"));
    }

    #[test]
    fn finalize_recomputes_areas_and_stamps_run_fields() {
        let mut master = Dataset::new("master", "EPSG:2284");
        let mut f = feature(Some("123"), Some("Oak Ave"));
        f.set("square_feet", FieldValue::Number(1.0)); // stale
        master.features.push(f);

        finalize(&mut master, "real_property_parcel", &stamp());

        let f = &master.features[0];
        assert_eq!(f.get("Square_Feet"), &FieldValue::Number(10_000.0));
        assert_eq!(f.get("Acres_US"), &FieldValue::Number(0.23));
        assert_eq!(f.get("State"), &FieldValue::Text("VA".into()));
        assert_eq!(f.get("EditDate"), &FieldValue::Text("20160729".into()));
        assert_eq!(f.get("EditBy"), &FieldValue::Text("bkingery".into()));
    }
}
