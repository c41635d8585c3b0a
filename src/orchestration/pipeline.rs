// End-to-end run: decode → segment → encode → dispatch → aggregate

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::core::config::Config;
use crate::core::errors::{ConfigError, PipelineError};
use crate::core::types::RunReport;
use crate::middleware::CredentialPool;
use crate::orchestration::dispatcher::ResilientDispatcher;
use crate::services::extraction::ExtractionClient;
use crate::services::segmentation::SegmentationEngine;
use crate::services::transcript::aggregate;
use crate::utils::image_ops::{encode_slices_async, load_image_from_memory_async};

/// One-shot extraction pipeline; all state is scoped to a single run.
pub struct ExtractionPipeline<C> {
    engine: SegmentationEngine,
    dispatcher: ResilientDispatcher<C>,
}

impl<C: ExtractionClient> ExtractionPipeline<C> {
    pub fn new(config: &Config, client: Arc<C>) -> Result<Self, ConfigError> {
        let pool = Arc::new(CredentialPool::new(config.credentials().to_vec())?);
        Ok(Self {
            engine: SegmentationEngine::new(config.segmentation.clone()),
            dispatcher: ResilientDispatcher::new(
                client,
                pool,
                config.dispatch.max_concurrent_slices,
            ),
        })
    }

    /// Run extraction over one image.
    ///
    /// Input errors (undecodable bytes, zero-dimension raster) fail the run;
    /// per-slice extraction failures do not — they only lower output
    /// completeness, reported via `failed_slices`.
    #[instrument(skip(self, image_bytes), fields(bytes = image_bytes.len()))]
    pub async fn run(&self, image_bytes: Vec<u8>) -> Result<RunReport> {
        let img = Arc::new(load_image_from_memory_async(image_bytes).await?);
        let (width, height) = (img.width(), img.height());
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidImageSize { width, height }.into());
        }

        // Seam search is a pixel scan over the whole image; keep it off the
        // async runtime like the other CPU-bound image work.
        let engine = self.engine.clone();
        let scan_img = Arc::clone(&img);
        let boundaries = tokio::task::spawn_blocking(move || engine.segment(&scan_img))
            .await
            .map_err(|e| PipelineError::TaskJoinFailed(e.to_string()))?;

        info!(
            "Segmented {}x{} image into {} slices",
            width,
            height,
            boundaries.len()
        );

        let chunks = encode_slices_async(img, boundaries).await?;
        let outcomes = self.dispatcher.process_all(&chunks).await?;

        let failed_slices = outcomes.iter().filter(|o| o.is_exhausted()).count();
        let text = aggregate(&outcomes);

        // Partial success is still success; failed slices only reduce
        // completeness.
        info!(
            "Run complete: {} slices, {} failed, {} transcript bytes",
            outcomes.len(),
            failed_slices,
            text.len()
        );

        Ok(RunReport {
            text,
            slices: outcomes.len(),
            failed_slices,
        })
    }
}
