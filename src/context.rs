use chrono::NaiveDate;
use std::path::PathBuf;

/// Immutable per-run state handed to every pipeline component.
///
/// One run corresponds to one calendar processing date; every artifact the
/// run produces is named deterministically from that date. A second
/// invocation on the same date reuses (and overwrites) the same run folder.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_date: NaiveDate,
    pub workspace: PathBuf,
    pub operator: String,
}

impl RunContext {
    pub fn new(run_date: NaiveDate, workspace: PathBuf, operator: String) -> Self {
        Self {
            run_date,
            workspace,
            operator,
        }
    }

    /// Date stamp used in artifact names and the `edit_date` field.
    pub fn date_stamp(&self) -> String {
        self.run_date.format("%Y%m%d").to_string()
    }

    /// The working folder for this run.
    pub fn run_dir(&self) -> PathBuf {
        self.workspace.join(self.date_stamp())
    }

    /// Where raw vendor datasets are staged by hand before the run starts.
    pub fn staging_dir(&self) -> PathBuf {
        self.run_dir().join("staging")
    }

    /// Where normalized per-source datasets are written.
    pub fn normalized_dir(&self) -> PathBuf {
        self.run_dir().join("normalized")
    }

    pub fn master_path(&self) -> PathBuf {
        self.run_dir()
            .join(format!("master_parcels_{}.json", self.date_stamp()))
    }

    pub fn zip_join_path(&self) -> PathBuf {
        self.run_dir().join("master_join_1_zipcode.json")
    }

    pub fn city_join_path(&self) -> PathBuf {
        self.run_dir().join("master_join_2_city.json")
    }

    /// The terminal deliverable, ready for the downstream append.
    pub fn final_path(&self) -> PathBuf {
        self.run_dir().join("real_property_parcel.json")
    }

    pub fn report_path(&self) -> PathBuf {
        self.run_dir().join("run_report.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_paths_are_keyed_by_run_date() {
        let ctx = RunContext::new(
            NaiveDate::from_ymd_opt(2016, 7, 29).unwrap(),
            PathBuf::from("/data/parcels"),
            "bkingery".into(),
        );

        assert_eq!(ctx.date_stamp(), "20160729");
        assert_eq!(ctx.run_dir(), PathBuf::from("/data/parcels/20160729"));
        assert_eq!(
            ctx.master_path(),
            PathBuf::from("/data/parcels/20160729/master_parcels_20160729.json")
        );
    }
}
