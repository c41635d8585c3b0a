pub mod config;
pub mod errors;
pub mod types;

// Re-export commonly used items for convenience
pub use config::Config;
pub use errors::{ConfigError, ExtractionError, PipelineError};
pub use types::{
    DispatchOutcome, ExtractionRecord, RunReport, SliceBoundary, SliceChunk, TextCategory,
};
