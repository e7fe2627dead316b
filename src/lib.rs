pub mod config;
pub mod context;
pub mod dataset;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod notifier;
pub mod pipeline;

pub use config::Config;
pub use context::RunContext;
pub use error::{PipelineError, Result};
