//! Extraction module for orform
//!
//! Turns a transcript and raw token-classification output into an `OrForm`:
//! aggregate fragments into spans, map spans onto fields, then let the
//! transcript rules override surgeons and in/out times.

mod aggregate;
mod dates;
mod normalize;
mod prediction;
mod rules;

pub use aggregate::{aggregate_spans, CONTINUATION_MARKER, MAX_ADJACENT_GAP};
pub use dates::normalize_date;
pub use normalize::{apply_model_spans, join_clean, normalize_time};
pub use prediction::{
    char_slice, decode_predictions, entity_type, parse_predictions_json, AggregatedSpan,
    FieldSpanGroups, RawPrediction, WirePrediction,
};
pub use rules::{
    apply_overrides, clean_transcript, extract_in_time, extract_out_time, extract_surgeons,
    normalize_clock_time, SurgeonSlots,
};

use crate::schema::OrForm;

/// Build an OR form from a transcript and the model's raw predictions.
///
/// Never fails: anything that cannot be parsed is left unset.
pub fn extract(transcript: &str, predictions: &[RawPrediction]) -> OrForm {
    let spans = aggregate_spans(predictions, transcript);
    let groups = FieldSpanGroups::from_spans(&spans);

    tracing::debug!(
        "Span groups: {}",
        groups.labels().collect::<Vec<_>>().join(", ")
    );

    let mut form = OrForm::default();
    apply_model_spans(&mut form, &groups);
    apply_overrides(&mut form, transcript);
    form
}
