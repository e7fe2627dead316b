use serde::{Deserialize, Serialize};
use std::fmt;

/// What went wrong for one source or stage during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunErrorKind {
    /// A municipality's staged input is missing or malformed; the run
    /// continues without it.
    SourceUnavailable,
    /// Incompatible field sets or coordinate systems at merge time; the run
    /// aborts.
    SchemaMismatch,
    /// The status mail could not be sent; logged and swallowed.
    Notification,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunError {
    pub source: String,
    pub kind: RunErrorKind,
    pub message: String,
}

/// Collected outcome of one pipeline run, surfaced once at the end instead
/// of only inline as failures happen. Persisted next to the run's artifacts
/// for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_date: String,
    /// (source id, normalized feature count) for each source that made it
    /// through normalization, in merge order.
    pub normalized: Vec<(String, usize)>,
    pub errors: Vec<RunError>,
    pub merged_count: Option<usize>,
}

impl RunReport {
    pub fn new(run_date: impl Into<String>) -> Self {
        Self {
            run_date: run_date.into(),
            normalized: Vec::new(),
            errors: Vec::new(),
            merged_count: None,
        }
    }

    pub fn record_source(&mut self, source_id: &str, features: usize) {
        self.normalized.push((source_id.to_string(), features));
    }

    pub fn record_error(&mut self, source: &str, kind: RunErrorKind, message: impl Into<String>) {
        self.errors.push(RunError {
            source: source.to_string(),
            kind,
            message: message.into(),
        });
    }

    /// True when every configured source was normalized without error.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn total_normalized(&self) -> usize {
        self.normalized.iter().map(|(_, n)| n).sum()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Parcel update run {}", self.run_date)?;
        for (source, count) in &self.normalized {
            writeln!(f, "  {source}: {count} parcels")?;
        }
        if let Some(merged) = self.merged_count {
            writeln!(f, "  merged: {merged} parcels")?;
        }
        if self.errors.is_empty() {
            writeln!(f, "  no errors")?;
        } else {
            writeln!(f, "  {} error(s):", self.errors.len())?;
            for e in &self.errors {
                writeln!(f, "    [{:?}] {}: {}", e.kind, e.source, e.message)?;
            }
        }
        Ok(())
    }
}
