use crate::error::{PipelineError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Pipeline-wide settings loaded once at startup from `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Root directory under which each run's working folder is created.
    pub workspace: PathBuf,
    /// Operator identity stamped into every published record.
    pub operator: String,
    /// Two-letter jurisdiction code for this deployment (e.g. "VA").
    pub state_code: String,
    /// CRS identifier every source dataset must carry before merge.
    pub crs: String,
    pub reference: ReferenceConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceConfig {
    pub zip_codes: ReferenceLayerConfig,
    pub cities: ReferenceLayerConfig,
}

/// One reference boundary dataset and the attribute to copy out of it.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceLayerConfig {
    pub path: PathBuf,
    /// Field on the reference polygons holding the value to transfer
    /// (zip layer: the 5-digit code; city layer: the display name).
    pub value_field: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    pub relay: String,
    pub sender: String,
    pub recipients: Vec<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        let config: Config = toml::from_str(&content)?;

        if config.state_code.len() != 2 {
            return Err(PipelineError::Config(format!(
                "state_code must be a two-letter code, got '{}'",
                config.state_code
            )));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("config.toml");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_a_complete_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
workspace = "/tmp/parcels"
operator = "bkingery"
state_code = "VA"
crs = "EPSG:2284"

[reference.zip_codes]
path = "/tmp/ref/zipcode.json"
value_field = "ZCTA5CE10"

[reference.cities]
path = "/tmp/ref/city.json"
value_field = "NAMELSAD"

[notify]
relay = "mail.example.gov"
sender = "gis@example.gov"
recipients = ["analyst@example.gov"]
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.state_code, "VA");
        assert_eq!(config.reference.zip_codes.value_field, "ZCTA5CE10");
        assert_eq!(config.notify.recipients.len(), 1);
    }

    #[test]
    fn rejects_bad_state_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
workspace = "/tmp/parcels"
operator = "bkingery"
state_code = "Virginia"
crs = "EPSG:2284"

[reference.zip_codes]
path = "/tmp/ref/zipcode.json"
value_field = "ZCTA5CE10"

[reference.cities]
path = "/tmp/ref/city.json"
value_field = "NAMELSAD"

[notify]
relay = "mail.example.gov"
sender = "gis@example.gov"
recipients = []
"#,
        );

        assert!(Config::load(&path).is_err());
    }
}
