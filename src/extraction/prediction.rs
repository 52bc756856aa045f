//! Prediction and span types shared by the extraction stages

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One token or sub-token prediction from the token-classification model.
///
/// Offsets are character (not byte) offsets into the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPrediction {
    pub label: String,
    pub text_fragment: String,
    pub start: usize,
    pub end: usize,
    pub score: f64,
}

impl RawPrediction {
    pub fn new(
        label: impl Into<String>,
        text_fragment: impl Into<String>,
        start: usize,
        end: usize,
        score: f64,
    ) -> Self {
        Self {
            label: label.into(),
            text_fragment: text_fragment.into(),
            start,
            end,
            score,
        }
    }
}

/// A labeled phrase built from one or more adjacent predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSpan {
    pub label: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub score: f64,
}

impl From<&RawPrediction> for AggregatedSpan {
    fn from(prediction: &RawPrediction) -> Self {
        Self {
            label: prediction.label.clone(),
            text: prediction.text_fragment.clone(),
            start: prediction.start,
            end: prediction.end,
            score: prediction.score,
        }
    }
}

/// Aggregated spans grouped by entity label, in transcript order
#[derive(Debug, Clone, Default)]
pub struct FieldSpanGroups {
    groups: BTreeMap<String, Vec<AggregatedSpan>>,
}

impl FieldSpanGroups {
    /// Group spans by label. A leading BIO prefix is dropped so that `B-DATE`
    /// and `I-DATE` land next to plain `DATE`.
    pub fn from_spans(spans: &[AggregatedSpan]) -> Self {
        let mut groups: BTreeMap<String, Vec<AggregatedSpan>> = BTreeMap::new();
        for span in spans {
            groups
                .entry(entity_type(&span.label).to_string())
                .or_default()
                .push(span.clone());
        }
        Self { groups }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.groups.contains_key(label)
    }

    /// Span texts for a label, in order. Empty if the label is absent.
    pub fn texts(&self, label: &str) -> Vec<&str> {
        self.groups
            .get(label)
            .map(|spans| spans.iter().map(|s| s.text.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn get(&self, label: &str) -> Option<&[AggregatedSpan]> {
        self.groups.get(label).map(Vec::as_slice)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Strip a `B-`/`I-` prefix from a label
pub fn entity_type(label: &str) -> &str {
    label
        .strip_prefix("B-")
        .or_else(|| label.strip_prefix("I-"))
        .unwrap_or(label)
}

/// Prediction as emitted by a Hugging Face style token-classification
/// endpoint. Aggregated pipelines send `entity_group`, raw ones `entity`.
#[derive(Debug, Clone, Deserialize)]
pub struct WirePrediction {
    #[serde(default)]
    pub entity_group: Option<String>,
    #[serde(default)]
    pub entity: Option<String>,
    #[serde(default)]
    pub word: Option<String>,
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
    #[serde(default)]
    pub score: Option<f64>,
}

impl WirePrediction {
    /// Convert to a `RawPrediction`, or `None` if the label or fragment is missing
    pub fn into_raw(self) -> Option<RawPrediction> {
        let label = self.entity_group.or(self.entity)?;
        let word = self.word?;
        if label.is_empty() {
            return None;
        }
        let start = self.start.unwrap_or(0);
        let end = self.end.unwrap_or(start);
        Some(RawPrediction {
            label,
            text_fragment: word,
            start,
            end,
            score: self.score.unwrap_or(0.0),
        })
    }
}

/// Decode a list of wire predictions, dropping malformed entries
pub fn decode_predictions(wire: Vec<WirePrediction>) -> Vec<RawPrediction> {
    let total = wire.len();
    let predictions: Vec<RawPrediction> =
        wire.into_iter().filter_map(WirePrediction::into_raw).collect();

    if predictions.len() < total {
        tracing::warn!(
            "Dropped {} malformed predictions (missing label or fragment)",
            total - predictions.len()
        );
    }

    predictions
}

/// Parse a JSON array of predictions in either the wire format or the
/// `RawPrediction` format.
pub fn parse_predictions_json(content: &str) -> serde_json::Result<Vec<RawPrediction>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(content)?;
    let wire = values
        .into_iter()
        .map(|value| {
            let mut wire: WirePrediction = serde_json::from_value(value.clone())?;
            if wire.entity_group.is_none() && wire.entity.is_none() {
                wire.entity = value
                    .get("label")
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
            }
            if wire.word.is_none() {
                wire.word = value
                    .get("text_fragment")
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
            }
            Ok(wire)
        })
        .collect::<serde_json::Result<Vec<_>>>()?;

    Ok(decode_predictions(wire))
}

/// Substring by character offsets. `None` if the range is out of bounds.
pub fn char_slice(text: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return Some("");
    }
    let byte_at = |pos: usize| -> Option<usize> {
        if pos == 0 {
            return Some(0);
        }
        text.char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .nth(pos)
    };
    let from = byte_at(start)?;
    let to = byte_at(end)?;
    text.get(from..to)
}
