use std::fs;
use std::path::PathBuf;
use tracing::{error, info, instrument, warn};

use crate::config::Config;
use crate::context::RunContext;
use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use crate::notifier::Notifier;
use crate::pipeline::enrich::{ReferenceLayer, SpatialEnricher};
use crate::pipeline::mapping::RunStamp;
use crate::pipeline::normalize::FieldNormalizer;
use crate::pipeline::report::{RunErrorKind, RunReport};
use crate::pipeline::{finalize, merge, sources};

/// Drives one monthly run end to end: per-source normalization (soft-fail),
/// merge (hard-fail), the two reference joins, schema finalization, and the
/// operator notification. Every artifact lands in the run-date folder.
pub struct Orchestrator {
    config: Config,
    ctx: RunContext,
}

impl Orchestrator {
    pub fn new(config: Config, ctx: RunContext) -> Self {
        Self { config, ctx }
    }

    fn stamp(&self) -> RunStamp {
        RunStamp {
            date_stamp: self.ctx.date_stamp(),
            operator: self.ctx.operator.clone(),
            state_code: self.config.state_code.clone(),
        }
    }

    /// Creates this run's working folder, wiping any previous attempt for
    /// the same date. Vendor datasets are then staged into `staging/` by
    /// hand before `normalize` runs.
    #[instrument(skip(self))]
    pub fn start(&self) -> Result<PathBuf> {
        let run_dir = self.ctx.run_dir();
        if run_dir.exists() {
            warn!(dir = %run_dir.display(), "Run folder exists, recreating");
            fs::remove_dir_all(&run_dir)?;
        }
        fs::create_dir_all(self.ctx.staging_dir())?;
        fs::create_dir_all(self.ctx.normalized_dir())?;
        info!(dir = %run_dir.display(), "Run folder ready");
        Ok(run_dir)
    }

    /// Normalizes every configured source present in `staging/`. A source
    /// whose staged file is missing or malformed is recorded in the report
    /// and skipped; the batch continues.
    #[instrument(skip(self, report))]
    pub fn normalize_sources(&self, report: &mut RunReport) -> Result<()> {
        let normalizer = FieldNormalizer::new(self.stamp());

        for mapping in sources::SOURCE_MAPPINGS.iter() {
            let staged = self
                .ctx
                .staging_dir()
                .join(format!("{}.json", mapping.source_id));

            let mut dataset = match Dataset::load_for_source(&staged, mapping.source_id) {
                Ok(d) => d,
                Err(e) => {
                    error!(source = mapping.source_id, error = %e, "Source unavailable, skipping");
                    report.record_error(mapping.source_id, RunErrorKind::SourceUnavailable, e.to_string());
                    continue;
                }
            };

            normalizer.normalize(&mut dataset, mapping);

            let out = self
                .ctx
                .normalized_dir()
                .join(format!("{}.json", mapping.source_id));
            dataset.save(&out)?;
            report.record_source(mapping.source_id, dataset.len());
        }

        Ok(())
    }

    /// Merge, enrich, finalize, notify. Merge and finalize failures are
    /// structural and abort the run; the notification never does.
    #[instrument(skip(self, report, notifier))]
    pub fn finish(&self, report: &mut RunReport, notifier: &dyn Notifier) -> Result<PathBuf> {
        // When `finish` runs in a fresh invocation the report has no
        // normalized entries yet; pick up whatever the normalize stage left
        // behind, in configured merge order.
        let mut inputs = Vec::new();
        if report.normalized.is_empty() {
            for source_id in sources::source_ids() {
                let path = self.ctx.normalized_dir().join(format!("{source_id}.json"));
                if path.exists() {
                    let dataset = Dataset::load(&path)?;
                    report.record_source(source_id, dataset.len());
                    inputs.push(dataset);
                }
            }
        } else {
            for (source_id, _) in &report.normalized {
                let path = self.ctx.normalized_dir().join(format!("{source_id}.json"));
                inputs.push(Dataset::load(&path)?);
            }
        }

        let master_name = format!("master_parcels_{}", self.ctx.date_stamp());
        let mut master = match merge::merge(&master_name, inputs) {
            Ok(m) => m,
            Err(e) => {
                report.record_error(&master_name, RunErrorKind::SchemaMismatch, e.to_string());
                self.write_report(report)?;
                return Err(e);
            }
        };
        report.merged_count = Some(master.len());
        master.save(&self.ctx.master_path())?;

        let enricher = SpatialEnricher::new(
            ReferenceLayer::load(
                &self.config.reference.zip_codes.path,
                &self.config.reference.zip_codes.value_field,
            )?,
            ReferenceLayer::load(
                &self.config.reference.cities.path,
                &self.config.reference.cities.value_field,
            )?,
        );

        // Intermediate join artifacts are kept for audit
        enricher.enrich_zip(&mut master);
        master.save(&self.ctx.zip_join_path())?;
        enricher.enrich_city(&mut master);
        master.save(&self.ctx.city_join_path())?;

        finalize::finalize(&mut master, "real_property_parcel", &self.stamp());
        let final_path = self.ctx.final_path();
        master.save(&final_path)?;
        info!(path = %final_path.display(), features = master.len(), "Published artifact written");

        notifier.notify(report);
        self.write_report(report)?;
        Ok(final_path)
    }

    /// `normalize` followed by `finish` in one invocation. The caller's
    /// report is filled in either way, so the per-source errors survive a
    /// failed run.
    pub fn run(&self, report: &mut RunReport, notifier: &dyn Notifier) -> Result<PathBuf> {
        self.normalize_sources(report)?;
        if report.normalized.is_empty() {
            self.write_report(report)?;
            return Err(PipelineError::NoSources(
                "every source failed normalization".to_string(),
            ));
        }
        self.finish(report, notifier)
    }

    fn write_report(&self, report: &RunReport) -> Result<()> {
        let content = serde_json::to_string_pretty(report)?;
        fs::write(self.ctx.report_path(), content)?;
        Ok(())
    }
}
