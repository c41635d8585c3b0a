use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::sync::Arc;

use crate::core::errors::{PipelineError, PipelineResult};
use crate::core::types::{SliceBoundary, SliceChunk};

/// Rasterize one boundary range into a self-contained PNG chunk.
///
/// The crop spans the full image width; only the vertical range varies.
pub fn encode_slice_png(
    img: &DynamicImage,
    boundary: SliceBoundary,
    index: usize,
) -> PipelineResult<SliceChunk> {
    let cropped = img.crop_imm(0, boundary.start_y, img.width(), boundary.height);
    let mut png_bytes = Vec::new();
    cropped
        .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|source| PipelineError::SliceEncodeFailed { index, source })?;

    Ok(SliceChunk {
        index,
        png_bytes,
        width: cropped.width(),
        height: cropped.height(),
    })
}

/// Encode every boundary into an ordered chunk list on the blocking pool.
///
/// PNG encoding is CPU-intensive and would stall the async runtime if done
/// inline; one blocking task covers the whole batch.
pub async fn encode_slices_async(
    img: Arc<DynamicImage>,
    boundaries: Vec<SliceBoundary>,
) -> PipelineResult<Vec<SliceChunk>> {
    tokio::task::spawn_blocking(move || {
        boundaries
            .into_iter()
            .enumerate()
            .map(|(index, boundary)| encode_slice_png(&img, boundary, index))
            .collect()
    })
    .await
    .map_err(|e| PipelineError::TaskJoinFailed(e.to_string()))?
}

/// Decode an image from raw bytes on the blocking pool.
pub async fn load_image_from_memory_async(bytes: Vec<u8>) -> PipelineResult<DynamicImage> {
    tokio::task::spawn_blocking(move || {
        image::load_from_memory(&bytes).map_err(PipelineError::ImageDecodeFailed)
    })
    .await
    .map_err(|e| PipelineError::TaskJoinFailed(e.to_string()))?
}
