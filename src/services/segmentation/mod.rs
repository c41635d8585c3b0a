// Seam-aware segmentation for very tall strip images
//
// Splits the image into height-bounded slices, cutting at visually "quiet"
// rows so speech bubbles and lettering are never sliced through. A row's
// energy is how far its pixels sit from pure white or pure black: flat
// background and solid ink are quiet, mid-tone art and anti-aliased text
// edges are noisy. Lower energy = better seam.

use image::{DynamicImage, GenericImageView};
use tracing::debug;

use crate::core::config::SegmentationConfig;
use crate::core::types::SliceBoundary;

/// Per-row busyness score.
///
/// Samples every `pixel_stride`-th pixel of row `y`; each sample contributes
/// min(distance-to-white, distance-to-black) where distance is the summed
/// channel delta. The row score is the mean over samples. Subsampling trades
/// precision for scan cost; a seam a few pixels off is visually harmless.
pub fn row_energy(img: &DynamicImage, y: u32, pixel_stride: u32) -> f32 {
    let width = img.width();
    let mut total: u32 = 0;
    let mut samples: u32 = 0;

    let mut x = 0;
    while x < width {
        let [r, g, b, _] = img.get_pixel(x, y).0;
        let to_white = (255 - r as u32) + (255 - g as u32) + (255 - b as u32);
        let to_black = r as u32 + g as u32 + b as u32;
        total += to_white.min(to_black);
        samples += 1;
        x += pixel_stride;
    }

    if samples == 0 {
        return 0.0;
    }
    total as f32 / samples as f32
}

/// Windowed seam search over the full image height.
#[derive(Clone)]
pub struct SegmentationEngine {
    config: SegmentationConfig,
}

impl SegmentationEngine {
    pub fn new(config: SegmentationConfig) -> Self {
        Self { config }
    }

    /// Produce ordered slice boundaries covering [0, H) exactly once.
    ///
    /// Each iteration scans rows [current + min, current + max) at
    /// `row_stride` granularity and cuts at the minimum penalized energy. The
    /// penalty grows linearly with distance from the window end, favoring
    /// fuller slices when energies are similar and so fewer API calls. If the
    /// whole remainder fits under the max height it becomes the final slice
    /// with no scan at all.
    pub fn segment(&self, img: &DynamicImage) -> Vec<SliceBoundary> {
        let height = img.height();
        let max = self.config.max_slice_height;
        let min = self.config.min_slice_height;

        let mut boundaries = Vec::new();
        let mut current_y = 0;

        while current_y < height {
            let remaining = height - current_y;
            if remaining <= max {
                boundaries.push(SliceBoundary {
                    start_y: current_y,
                    height: remaining,
                });
                break;
            }

            let cut_y = self.find_seam(img, current_y + min, current_y + max);
            debug!(
                "Seam at y={} (slice {} rows, {} remaining)",
                cut_y,
                cut_y - current_y,
                height - cut_y
            );

            boundaries.push(SliceBoundary {
                start_y: current_y,
                height: cut_y - current_y,
            });
            current_y = cut_y;
        }

        boundaries
    }

    /// Best cut row in [window_start, window_end). Defaults to the window end
    /// (a max-height slice) when no candidate row improves on it.
    fn find_seam(&self, img: &DynamicImage, window_start: u32, window_end: u32) -> u32 {
        let window_height = (window_end - window_start) as f32;
        let mut best_y = window_end;
        let mut best_score = f32::INFINITY;

        let mut y = window_start;
        while y < window_end {
            let energy = row_energy(img, y, self.config.pixel_stride);
            let offset = (y - window_start) as f32;
            let score = energy + (window_height - offset) * self.config.penalty_weight;
            if score < best_score {
                best_score = score;
                best_y = y;
            }
            y += self.config.row_stride;
        }

        best_y
    }
}
