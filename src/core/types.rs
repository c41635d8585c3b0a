// Core types for the slice-and-extract workflow

use serde::{Deserialize, Serialize};

/// A contiguous horizontal band of the source image.
///
/// Boundaries produced by segmentation are contiguous, non-overlapping, and
/// their heights sum to the image height. Every boundary respects the
/// configured min/max height except possibly the final remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceBoundary {
    pub start_y: u32,
    pub height: u32,
}

impl SliceBoundary {
    /// Exclusive end row of this slice.
    pub fn end_y(&self) -> u32 {
        self.start_y + self.height
    }
}

/// A self-contained, encoded image fragment ready for dispatch.
///
/// `index` is the slice ordinal and the sole means of re-establishing order
/// after concurrent or failure-prone processing.
#[derive(Debug, Clone)]
pub struct SliceChunk {
    pub index: usize,
    pub png_bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Categories the extraction service assigns to text regions.
///
/// Wire labels are matched as pure string literals; the label set is lower
/// snake case apart from the historical `smallText`. Unknown or absent labels
/// decode as `Speech`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextCategory {
    #[default]
    Speech,
    Thought,
    Box,
    Narration,
    SmallText,
    Sfx,
    System,
    Scream,
    Linked,
}

impl TextCategory {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "speech" => Some(TextCategory::Speech),
            "thought" => Some(TextCategory::Thought),
            "box" => Some(TextCategory::Box),
            "narration" => Some(TextCategory::Narration),
            "smallText" => Some(TextCategory::SmallText),
            "sfx" => Some(TextCategory::Sfx),
            "system" => Some(TextCategory::System),
            "scream" => Some(TextCategory::Scream),
            "linked" => Some(TextCategory::Linked),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TextCategory::Speech => "speech",
            TextCategory::Thought => "thought",
            TextCategory::Box => "box",
            TextCategory::Narration => "narration",
            TextCategory::SmallText => "smallText",
            TextCategory::Sfx => "sfx",
            TextCategory::System => "system",
            TextCategory::Scream => "scream",
            TextCategory::Linked => "linked",
        }
    }
}

impl Serialize for TextCategory {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for TextCategory {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(TextCategory::from_label(&label).unwrap_or_default())
    }
}

/// One text region returned by the extraction service for a slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub text: String,
    #[serde(default)]
    pub category: TextCategory,
}

/// Per-slice result of the resilient dispatch loop.
///
/// A slice either fully succeeds on one credential attempt or is marked
/// exhausted after the whole pool has been tried; there is no partial state.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    Extracted {
        index: usize,
        records: Vec<ExtractionRecord>,
    },
    Exhausted {
        index: usize,
        attempts: usize,
    },
}

impl DispatchOutcome {
    pub fn index(&self) -> usize {
        match self {
            DispatchOutcome::Extracted { index, .. } => *index,
            DispatchOutcome::Exhausted { index, .. } => *index,
        }
    }

    /// Records contributed to the final transcript. Exhausted slices
    /// contribute nothing but do not fail the run.
    pub fn records(&self) -> &[ExtractionRecord] {
        match self {
            DispatchOutcome::Extracted { records, .. } => records,
            DispatchOutcome::Exhausted { .. } => &[],
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, DispatchOutcome::Exhausted { .. })
    }
}

/// Summary of one completed extraction run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Final ordered transcript, one formatted line per record.
    pub text: String,
    pub slices: usize,
    pub failed_slices: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_decodes_known_labels() {
        let cat: TextCategory = serde_json::from_str("\"narration\"").unwrap();
        assert_eq!(cat, TextCategory::Narration);

        // The historical odd-cased label is matched as a pure literal.
        let cat: TextCategory = serde_json::from_str("\"smallText\"").unwrap();
        assert_eq!(cat, TextCategory::SmallText);
    }

    #[test]
    fn unknown_label_defaults_to_speech() {
        let cat: TextCategory = serde_json::from_str("\"whisper\"").unwrap();
        assert_eq!(cat, TextCategory::Speech);
    }

    #[test]
    fn absent_category_defaults_to_speech() {
        let record: ExtractionRecord = serde_json::from_str(r#"{"text": "hello"}"#).unwrap();
        assert_eq!(record.category, TextCategory::Speech);
    }

    #[test]
    fn exhausted_outcome_contributes_no_records() {
        let outcome = DispatchOutcome::Exhausted {
            index: 2,
            attempts: 3,
        };
        assert!(outcome.records().is_empty());
        assert!(outcome.is_exhausted());
        assert_eq!(outcome.index(), 2);
    }
}
