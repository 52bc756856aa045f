//! Label vocabulary and validation of corrected tag sequences

use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;

use crate::labels::align::OUTSIDE_TAG;
use crate::{OrFormError, Result};

/// Hard failures for caller-supplied token/tag data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Empty tokens or tags")]
    Empty,

    #[error("Token and tag count mismatch ({tokens} tokens vs {tags} tags)")]
    LengthMismatch { tokens: usize, tags: usize },

    #[error("Token index {index} out of range for {len} tokens")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Unknown tags not in label vocabulary: {}", .tags.join(", "))]
    UnknownTags { tags: Vec<String> },
}

/// Ordered set of valid BIO tags, loaded from a `label_map.json` array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVocabulary {
    labels: Vec<String>,
}

impl LabelVocabulary {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let labels = labels
            .into_iter()
            .map(Into::into)
            .filter(|label: &String| seen.insert(label.clone()))
            .collect();
        Self { labels }
    }

    /// Load from a JSON array of tag strings
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(OrFormError::NotFound(format!(
                "label map {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let labels: Vec<String> = serde_json::from_str(&content)?;
        tracing::info!("Loaded {} labels from {}", labels.len(), path.display());
        Ok(Self::new(labels))
    }

    /// Load, or fall back to a vocabulary holding only `O` if the file is
    /// missing or unreadable.
    pub fn load_or_outside(path: &Path) -> Self {
        match Self::load(path) {
            Ok(vocabulary) => vocabulary,
            Err(e) => {
                tracing::warn!("Could not load label map: {}", e);
                Self::new([OUTSIDE_TAG])
            }
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        tag == OUTSIDE_TAG || self.labels.iter().any(|l| l == tag)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Tags not in the vocabulary, each once, in first-seen order
    pub fn unknown_tags<S: AsRef<str>>(&self, tags: &[S]) -> Vec<String> {
        let mut unknown: Vec<String> = Vec::new();
        for tag in tags.iter().map(AsRef::as_ref) {
            if !self.contains(tag) && !unknown.iter().any(|u| u == tag) {
                unknown.push(tag.to_string());
            }
        }
        unknown
    }

    /// Check a corrected sequence: it must be non-empty, lengths must match
    /// and every tag must be known.
    pub fn validate<T, S>(&self, tokens: &[T], tags: &[S]) -> std::result::Result<(), ValidationError>
    where
        S: AsRef<str>,
    {
        if tokens.is_empty() || tags.is_empty() {
            return Err(ValidationError::Empty);
        }
        if tokens.len() != tags.len() {
            return Err(ValidationError::LengthMismatch {
                tokens: tokens.len(),
                tags: tags.len(),
            });
        }

        let unknown = self.unknown_tags(tags);
        if !unknown.is_empty() {
            return Err(ValidationError::UnknownTags { tags: unknown });
        }

        Ok(())
    }
}
