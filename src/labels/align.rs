//! Align character-span predictions onto whitespace tokens as BIO tags
//!
//! The result is a starting point for a human reviewer, not gold data.

use serde::{Deserialize, Serialize};

use crate::extraction::RawPrediction;
use crate::labels::vocabulary::{LabelVocabulary, ValidationError};

pub const OUTSIDE_TAG: &str = "O";

/// Parallel tokens and tags, one tag per token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSequence {
    pub tokens: Vec<String>,
    pub tags: Vec<String>,
}

impl TagSequence {
    /// Replace one predicted tag with a reviewer's correction
    pub fn set_tag(
        &mut self,
        index: usize,
        tag: &str,
        vocabulary: &LabelVocabulary,
    ) -> Result<(), ValidationError> {
        if index >= self.tags.len() {
            return Err(ValidationError::IndexOutOfRange {
                index,
                len: self.tags.len(),
            });
        }
        if !vocabulary.contains(tag) {
            return Err(ValidationError::UnknownTags {
                tags: vec![tag.to_string()],
            });
        }
        self.tags[index] = tag.to_string();
        Ok(())
    }

    /// Number of tokens carrying an entity tag
    pub fn entity_count(&self) -> usize {
        self.tags.iter().filter(|t| *t != OUTSIDE_TAG).count()
    }
}

/// Split a transcript the way the correction tool tokenizes it
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Assign each token the tag of the predictions overlapping it.
///
/// An `O` token takes any incoming tag; an already tagged token is only
/// replaced by a `B-` tag of a different entity type.
pub fn align_to_tokens(tokens: &[String], predictions: &[RawPrediction]) -> TagSequence {
    let mut tags = vec![OUTSIDE_TAG.to_string(); tokens.len()];

    if !predictions.is_empty() {
        let positions = token_positions(tokens);

        for prediction in predictions {
            let tag = bio_tag(&prediction.label);

            for (index, (token_start, token_end)) in positions.iter().enumerate() {
                let overlaps = prediction.start < *token_end && prediction.end > *token_start;
                if !overlaps {
                    continue;
                }
                let current = &tags[index];
                if current == OUTSIDE_TAG
                    || (tag.starts_with("B-") && tag_type(&tag) != tag_type(current))
                {
                    tags[index] = tag.clone();
                }
            }
        }
    }

    TagSequence {
        tokens: tokens.to_vec(),
        tags,
    }
}

/// Character ranges of each token inside the space-joined token text
fn token_positions(tokens: &[String]) -> Vec<(usize, usize)> {
    let text = tokens.join(" ");
    let mut positions = Vec::with_capacity(tokens.len());
    let mut byte_pos = 0;
    let mut char_pos = 0;

    for token in tokens {
        let token_chars = token.chars().count();
        match text[byte_pos..].find(token.as_str()) {
            Some(offset) => {
                let start = char_pos + text[byte_pos..byte_pos + offset].chars().count();
                let end = start + token_chars;
                positions.push((start, end));
                byte_pos += offset + token.len();
                char_pos = end;
            }
            None => {
                tracing::debug!("Token {:?} not found, using approximate offset", token);
                positions.push((char_pos, char_pos + token_chars));
            }
        }
    }

    positions
}

/// Upper-cased BIO tag for a model label; non-BIO labels map to `O`
fn bio_tag(label: &str) -> String {
    let upper = label.to_uppercase();
    if upper.starts_with("B-") || upper.starts_with("I-") {
        upper
    } else {
        OUTSIDE_TAG.to_string()
    }
}

fn tag_type(tag: &str) -> &str {
    tag.get(2..).unwrap_or("")
}
