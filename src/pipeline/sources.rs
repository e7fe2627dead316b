use once_cell::sync::Lazy;

use super::mapping::{AreaKind, FieldMapping, FieldRule};

/// Every municipality's normalization table, in merge order. Adding a new
/// source is adding one entry here; the normalizer engine does the rest.
pub static SOURCE_MAPPINGS: Lazy<Vec<FieldMapping>> = Lazy::new(|| {
    vec![
        williamsburg(),
        york_county(),
        poquoson(),
        newport_news(),
        james_city_county(),
        hampton(),
        new_kent_county(),
    ]
});

/// Source ids in configured merge order.
pub fn source_ids() -> Vec<&'static str> {
    SOURCE_MAPPINGS.iter().map(|m| m.source_id).collect()
}

pub fn mapping_for(source_id: &str) -> Option<&'static FieldMapping> {
    SOURCE_MAPPINGS.iter().find(|m| m.source_id == source_id)
}

/// Rules shared by every municipality: recomputed areas, jurisdiction code,
/// and the run stamps.
fn common_rules() -> Vec<(&'static str, FieldRule)> {
    vec![
        ("square_feet", FieldRule::ComputedArea(AreaKind::SquareFeet)),
        ("acres", FieldRule::ComputedArea(AreaKind::Acres)),
        ("state", FieldRule::StateCode),
        ("edit_date", FieldRule::RunDate),
        ("edit_by", FieldRule::Operator),
    ]
}

fn with_common(source_id: &'static str, mut rules: Vec<(&'static str, FieldRule)>) -> FieldMapping {
    rules.extend(common_rules());
    FieldMapping { source_id, rules }
}

fn williamsburg() -> FieldMapping {
    with_common(
        "williamsburg",
        vec![
            ("parcel_id", FieldRule::DirectCopy("PID")),
            ("legal_description", FieldRule::DirectCopy("LUCat")),
            ("info_source", FieldRule::Constant("Williamsburg GIS Website")),
        ],
    )
}

fn york_county() -> FieldMapping {
    with_common(
        "york_county",
        vec![
            ("parcel_id", FieldRule::DirectCopy("GPIN")),
            ("owner_name", FieldRule::DirectCopy("OWNERSNAME")),
            ("house_number", FieldRule::SplitFirstToken("LOCADDR")),
            ("street", FieldRule::DirectCopy("STRTNAME")),
            ("subdivision_name", FieldRule::DirectCopy("SUBDIVISION")),
            ("legal_description", FieldRule::DirectCopy("LEGLDESC")),
            ("info_source", FieldRule::Constant("York County GIS Manager")),
        ],
    )
}

fn poquoson() -> FieldMapping {
    with_common(
        "poquoson",
        vec![
            ("parcel_id", FieldRule::DirectCopy("MAP_PIN")),
            ("owner_name", FieldRule::DirectCopy("OWNRNAME")),
            // STRTNUMB is numeric in the vendor data; NUMBSUFX carries the
            // apartment suffix
            (
                "house_number",
                FieldRule::NumberWithSuffix {
                    number: "STRTNUMB",
                    suffix: "NUMBSUFX",
                },
            ),
            ("street", FieldRule::DirectCopy("STRTNAME")),
            ("subdivision_name", FieldRule::DirectCopy("PROPDESC")),
            ("legal_description", FieldRule::DirectCopy("LEGLDESC")),
            ("info_source", FieldRule::Constant("Poquoson Assessor Office")),
        ],
    )
}

fn newport_news() -> FieldMapping {
    with_common(
        "newport_news",
        vec![
            ("parcel_id", FieldRule::DirectCopy("REISID")),
            (
                "house_number",
                FieldRule::NumberWithSuffix {
                    number: "HouseNo",
                    suffix: "Apt",
                },
            ),
            ("street", FieldRule::DirectCopy("Street")),
            ("subdivision_name", FieldRule::DirectCopy("SubdivName")),
            ("legal_description", FieldRule::DirectCopy("LeglDesc")),
            ("info_source", FieldRule::Constant("NN Dept of Engineering")),
        ],
    )
}

fn james_city_county() -> FieldMapping {
    with_common(
        "james_city_county",
        vec![
            ("parcel_id", FieldRule::DirectCopy("PIN")),
            ("house_number", FieldRule::SplitFirstToken("LOCADDR")),
            ("street", FieldRule::SplitRemainder("LOCADDR")),
            ("legal_description", FieldRule::DirectCopy("Legal1")),
            (
                "info_source",
                FieldRule::Constant("James City County GIS Website"),
            ),
        ],
    )
}

fn hampton() -> FieldMapping {
    with_common(
        "hampton",
        vec![
            ("parcel_id", FieldRule::DirectCopy("LRSNTXT")),
            ("house_number", FieldRule::SplitFirstToken("SITUS")),
            ("street", FieldRule::SplitRemainder("SITUS")),
            ("subdivision_name", FieldRule::DirectCopy("Sub_Div")),
            ("info_source", FieldRule::Constant("Hampton IT GIS")),
        ],
    )
}

fn new_kent_county() -> FieldMapping {
    with_common(
        "new_kent_county",
        vec![
            ("parcel_id", FieldRule::DirectCopy("GPIN")),
            ("owner_name", FieldRule::DirectCopy("REM_OWN_NAME")),
            ("house_number", FieldRule::SplitFirstToken("REM_PRCL_LOCN")),
            ("street", FieldRule::SplitRemainder("REM_PRCL_LOCN")),
            ("subdivision_name", FieldRule::DirectCopy("SUBDIVISION")),
            ("legal_description", FieldRule::DirectCopy("VNS_STYLE_DESC")),
            ("info_source", FieldRule::Constant("New Kent County GIS")),
        ],
    )
}
