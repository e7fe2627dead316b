use geo::{Contains, Point};
use std::path::Path;
use tracing::{info, instrument, warn};

use crate::dataset::{Dataset, FieldValue};
use crate::error::Result;
use crate::geometry;

/// A read-only boundary dataset used for containment lookups, never mutated.
pub struct ReferenceLayer {
    dataset: Dataset,
    /// Attribute on the boundary polygons whose value is copied onto
    /// matching parcels.
    value_field: String,
}

impl ReferenceLayer {
    pub fn new(dataset: Dataset, value_field: impl Into<String>) -> Self {
        Self {
            dataset,
            value_field: value_field.into(),
        }
    }

    pub fn load(path: &Path, value_field: &str) -> Result<Self> {
        let dataset = Dataset::load(path)?;
        info!(layer = %dataset.name, polygons = dataset.len(), "Loaded reference layer");
        Ok(Self::new(dataset, value_field))
    }

    pub fn name(&self) -> &str {
        &self.dataset.name
    }

    /// Value of the first boundary polygon (layer order) containing the
    /// point. Boundary-straddling parcels can legitimately fall inside more
    /// than one polygon; first match wins and the rest are ignored.
    fn lookup(&self, point: Point<f64>) -> Option<FieldValue> {
        self.dataset
            .features
            .iter()
            .find(|f| f.geometry.contains(&point))
            .map(|f| f.get(&self.value_field).clone())
    }
}

/// Copies a reference layer value onto each parcel whose representative
/// point falls inside a boundary polygon. Parcels matching nothing keep a
/// null target field and are never dropped (KEEP_ALL).
#[instrument(skip(master, layer), fields(layer = layer.name(), target = target_field))]
pub fn spatial_join(master: &mut Dataset, layer: &ReferenceLayer, target_field: &str) {
    let mut matched = 0usize;
    let mut unmatched = 0usize;

    for feature in &mut master.features {
        let value = geometry::representative_point(&feature.geometry)
            .and_then(|point| layer.lookup(point));
        match value {
            Some(value) => {
                feature.set(target_field, value);
                matched += 1;
            }
            None => {
                feature.set(target_field, FieldValue::Null);
                unmatched += 1;
            }
        }
    }

    info!(matched, unmatched, "Spatial join complete");
    if unmatched > 0 {
        warn!(unmatched, target = target_field, "Parcels outside every reference polygon kept with null");
    }
}

/// Runs both reference joins against the master dataset: zip code first,
/// then city, matching the historical join order.
pub struct SpatialEnricher {
    zip_layer: ReferenceLayer,
    city_layer: ReferenceLayer,
}

impl SpatialEnricher {
    pub fn new(zip_layer: ReferenceLayer, city_layer: ReferenceLayer) -> Self {
        Self {
            zip_layer,
            city_layer,
        }
    }

    pub fn enrich_zip(&self, master: &mut Dataset) {
        spatial_join(master, &self.zip_layer, "zip_code");
    }

    pub fn enrich_city(&self, master: &mut Dataset) {
        spatial_join(master, &self.city_layer, "city");
    }
}
