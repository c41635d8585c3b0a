// Transcript assembly: per-category formatting + ordered aggregation
//
// This ordering is the external correctness contract: readers consume the
// output top to bottom expecting the original reading order, so records are
// emitted slice-ordinal-first, then in their returned order within a slice.

use crate::core::types::{DispatchOutcome, TextCategory};

/// Fixed rendering prefix for each known category.
pub fn category_prefix(category: TextCategory) -> &'static str {
    match category {
        TextCategory::Speech => "",
        TextCategory::Thought => "(thought) ",
        TextCategory::Box => "[box] ",
        TextCategory::Narration => "[narration] ",
        TextCategory::SmallText => "(small) ",
        TextCategory::Sfx => "[sfx] ",
        TextCategory::System => "[system] ",
        TextCategory::Scream => "[scream] ",
        TextCategory::Linked => "[linked] ",
    }
}

/// Render one record as a single line (without the trailing newline).
///
/// Pure and total: a record whose category could not be recognized renders as
/// the bare trimmed text.
pub fn format_line(text: &str, category: Option<TextCategory>) -> String {
    match category {
        Some(category) => format!("{}{}", category_prefix(category), text.trim()),
        None => text.trim().to_string(),
    }
}

/// Concatenate per-slice outcomes into the final transcript.
///
/// Outcomes are visited in slice-ordinal order regardless of the order they
/// arrive in; exhausted slices contribute nothing. One newline-terminated
/// line per record; an empty run yields an empty string.
pub fn aggregate(outcomes: &[DispatchOutcome]) -> String {
    let mut ordered: Vec<&DispatchOutcome> = outcomes.iter().collect();
    ordered.sort_by_key(|o| o.index());

    let mut transcript = String::new();
    for outcome in ordered {
        for record in outcome.records() {
            transcript.push_str(&format_line(&record.text, Some(record.category)));
            transcript.push('\n');
        }
    }
    transcript
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ExtractionRecord;

    fn record(text: &str, category: TextCategory) -> ExtractionRecord {
        ExtractionRecord {
            text: text.to_string(),
            category,
        }
    }

    #[test]
    fn every_known_category_has_a_fixed_prefix() {
        let cases = [
            (TextCategory::Speech, ""),
            (TextCategory::Thought, "(thought) "),
            (TextCategory::Box, "[box] "),
            (TextCategory::Narration, "[narration] "),
            (TextCategory::SmallText, "(small) "),
            (TextCategory::Sfx, "[sfx] "),
            (TextCategory::System, "[system] "),
            (TextCategory::Scream, "[scream] "),
            (TextCategory::Linked, "[linked] "),
        ];
        for (category, prefix) in cases {
            assert_eq!(category_prefix(category), prefix);
        }
    }

    #[test]
    fn unknown_category_renders_bare_trimmed_text() {
        assert_eq!(format_line("  hello there  ", None), "hello there");
    }

    #[test]
    fn formatting_trims_text() {
        assert_eq!(
            format_line("  WHAM  ", Some(TextCategory::Sfx)),
            "[sfx] WHAM"
        );
    }

    #[test]
    fn aggregation_preserves_slice_then_record_order() {
        let outcomes = vec![
            DispatchOutcome::Extracted {
                index: 0,
                records: vec![
                    record("first", TextCategory::Speech),
                    record("second", TextCategory::Thought),
                ],
            },
            DispatchOutcome::Extracted {
                index: 1,
                records: vec![record("third", TextCategory::Narration)],
            },
        ];
        assert_eq!(
            aggregate(&outcomes),
            "first\n(thought) second\n[narration] third\n"
        );
    }

    #[test]
    fn aggregation_reorders_out_of_order_outcomes() {
        let a = DispatchOutcome::Extracted {
            index: 0,
            records: vec![record("top", TextCategory::Speech)],
        };
        let b = DispatchOutcome::Extracted {
            index: 1,
            records: vec![record("bottom", TextCategory::Speech)],
        };
        // Completion order reversed; output order must not change.
        assert_eq!(aggregate(&[b, a]), "top\nbottom\n");
    }

    #[test]
    fn exhausted_slices_are_silent() {
        let outcomes = vec![
            DispatchOutcome::Extracted {
                index: 0,
                records: vec![record("kept", TextCategory::Speech)],
            },
            DispatchOutcome::Exhausted {
                index: 1,
                attempts: 2,
            },
            DispatchOutcome::Extracted {
                index: 2,
                records: vec![record("also kept", TextCategory::Speech)],
            },
        ];
        assert_eq!(aggregate(&outcomes), "kept\nalso kept\n");
    }

    #[test]
    fn empty_run_is_empty_string() {
        assert_eq!(aggregate(&[]), "");
        let outcomes = vec![DispatchOutcome::Extracted {
            index: 0,
            records: Vec::new(),
        }];
        assert_eq!(aggregate(&outcomes), "");
    }
}
