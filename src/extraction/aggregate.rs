//! Span aggregation
//!
//! Merges WordPiece fragments and adjacent same-label predictions into
//! phrase-level spans.

use crate::extraction::prediction::{char_slice, AggregatedSpan, RawPrediction};

/// WordPiece continuation prefix. If the upstream tokenizer switches to a
/// different convention, fragments stop merging rather than failing.
pub const CONTINUATION_MARKER: &str = "##";

/// Maximum gap, in characters, between two same-label spans that still
/// counts as adjacent (a space or a punctuation mark).
pub const MAX_ADJACENT_GAP: i64 = 2;

/// Merge raw predictions into aggregated spans
pub fn aggregate_spans(predictions: &[RawPrediction], transcript: &str) -> Vec<AggregatedSpan> {
    let mut merged = Vec::new();
    let mut buffer: Option<AggregatedSpan> = None;

    for prediction in predictions.iter().filter(|p| is_usable(p)) {
        let word = prediction.text_fragment.as_str();

        buffer = match buffer.take() {
            Some(mut current) if word.starts_with(CONTINUATION_MARKER) => {
                current.text.push_str(&word.replace(CONTINUATION_MARKER, ""));
                current.end = prediction.end;
                current.score = current.score.max(prediction.score);
                Some(current)
            }
            Some(mut current)
                if current.label == prediction.label && is_adjacent(&current, prediction) =>
            {
                let gap = char_slice(transcript, current.end, prediction.start).unwrap_or("");
                current.text.push_str(gap);
                current.text.push_str(word);
                current.end = prediction.end;
                current.score = (current.score + prediction.score) / 2.0;
                Some(current)
            }
            Some(current) => {
                merged.push(current);
                Some(AggregatedSpan::from(prediction))
            }
            None => Some(AggregatedSpan::from(prediction)),
        };
    }

    if let Some(current) = buffer {
        merged.push(current);
    }

    tracing::debug!(
        "Aggregated {} predictions into {} spans",
        predictions.len(),
        merged.len()
    );

    merged
}

fn is_usable(prediction: &RawPrediction) -> bool {
    !prediction.label.is_empty() && !prediction.text_fragment.trim().is_empty()
}

fn is_adjacent(current: &AggregatedSpan, next: &RawPrediction) -> bool {
    next.start as i64 - current.end as i64 <= MAX_ADJACENT_GAP
}
