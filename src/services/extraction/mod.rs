// Structured text extraction over slice chunks
//
// One call = one encoded slice in, one ordered record list out, or an error.
// The trait is the seam between the dispatch loop and the concrete service
// so the failover logic is testable without network access.

pub mod gemini;

use std::future::Future;

use crate::core::errors::ExtractionResult;
use crate::core::types::{ExtractionRecord, SliceChunk};

pub use gemini::GeminiExtractionClient;

/// External extraction service boundary.
///
/// Implementations must be cheap to share (`&self` calls, internal `Arc`s
/// where needed); the dispatcher holds one instance for the whole run.
pub trait ExtractionClient: Send + Sync {
    /// Extract the text regions of one slice using the given credential.
    ///
    /// Errors are retryable from the caller's perspective: the dispatcher
    /// rotates to the next credential in the pool. Timeouts surface here as
    /// request failures.
    fn extract(
        &self,
        credential: &str,
        chunk: &SliceChunk,
    ) -> impl Future<Output = ExtractionResult<Vec<ExtractionRecord>>> + Send;
}
