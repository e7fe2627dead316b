pub mod enrich;
pub mod finalize;
pub mod mapping;
pub mod merge;
pub mod normalize;
pub mod orchestrator;
pub mod report;
pub mod sources;
