// Library exports for the webtoon text extraction workflow

// Core modules
pub mod core;
pub mod middleware;
pub mod orchestration;
pub mod services;
pub mod utils;

// Re-export commonly used types and functions
pub use crate::core::{
    config::Config,
    errors::{ConfigError, ExtractionError, PipelineError},
    types::{
        DispatchOutcome, ExtractionRecord, RunReport, SliceBoundary, SliceChunk, TextCategory,
    },
};

pub use middleware::CredentialPool;

pub use orchestration::{ExtractionPipeline, ResilientDispatcher};

pub use services::{ExtractionClient, GeminiExtractionClient, SegmentationEngine};

pub use utils::{encode_slices_async, load_image_from_memory_async};
