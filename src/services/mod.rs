pub mod extraction;
pub mod segmentation;
pub mod transcript;

// Re-export commonly used services
pub use extraction::{ExtractionClient, GeminiExtractionClient};
pub use segmentation::SegmentationEngine;
