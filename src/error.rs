use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source '{source_id}' unavailable: {message}")]
    SourceUnavailable { source_id: String, message: String },

    #[error("Schema mismatch in '{dataset}': {message}")]
    SchemaMismatch { dataset: String, message: String },

    #[error("No sources available to merge: {0}")]
    NoSources(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
