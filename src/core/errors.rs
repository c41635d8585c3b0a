// Custom error types for better error handling and debugging
//
// Using thiserror for ergonomic error definitions with:
// - Context preservation
// - Type-safe error matching
// - Source error chaining
//
// Taxonomy: ConfigError aborts startup, PipelineError aborts a single run,
// ExtractionError is recovered per slice and never fails a run.

use thiserror::Error;

/// Configuration errors (fatal, reported before any processing starts)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No API credentials configured (set EXTRACTION_API_KEYS environment variable)")]
    NoCredentials,

    #[error("Slice bounds are degenerate: min_slice_height ({min}) must be >= 1 and < max_slice_height ({max})")]
    InvalidSliceBounds { min: u32, max: u32 },

    #[error("Invalid scan stride: {0}")]
    InvalidStride(String),

    #[error("Penalty weight must be a finite non-negative number, got {0}")]
    InvalidPenaltyWeight(f32),

    #[error("max_concurrent_slices must be > 0, got {0}")]
    InvalidConcurrency(usize),
}

/// Per-slice extraction errors (recovered by credential rotation, never fatal)
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("API request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("API returned error status {status}: {body}")]
    ErrorStatus { status: u16, body: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Run-level pipeline errors (input errors and internal faults)
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Image decoding failed: {0}")]
    ImageDecodeFailed(#[from] image::ImageError),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidImageSize { width: u32, height: u32 },

    #[error("Slice encoding failed for slice {index}: {source}")]
    SliceEncodeFailed {
        index: usize,
        source: image::ImageError,
    },

    #[error("Task join failed: {0}")]
    TaskJoinFailed(String),
}

// Convenience type aliases for Results
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type ExtractionResult<T> = Result<T, ExtractionError>;
pub type PipelineResult<T> = Result<T, PipelineError>;
