//! Correction records for retraining
//!
//! Reviewed token/tag sequences are appended to a JSONL file, one record per
//! line, and later merged with the training set.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::labels::vocabulary::LabelVocabulary;
use crate::{OrFormError, Result};

/// One reviewed sentence. Keys this crate does not interpret (a training
/// record `id`, for instance) are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRecord {
    #[serde(default)]
    pub tokens: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CorrectionMetadata>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CorrectionMetadata {
    /// Metadata stamped with the current time
    pub fn now(corrected_by: Option<String>, session: &str) -> Self {
        Self {
            corrected_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            corrected_by,
            session: Some(session.to_string()),
            extra: Map::new(),
        }
    }
}

impl CorrectionRecord {
    pub fn new(tokens: Vec<String>, tags: Vec<String>) -> Self {
        Self {
            tokens,
            tags,
            metadata: None,
            extra: Map::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: CorrectionMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Duplicate-detection key: the space-joined tokens
    pub fn signature(&self) -> String {
        self.tokens.join(" ")
    }
}

/// A problem found in one record of a corrections file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum RecordIssue {
    TokenTagMismatch {
        record_idx: usize,
        tokens: usize,
        tags: usize,
    },
    InvalidTags {
        record_idx: usize,
        invalid_tags: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub total_records: usize,
    pub valid_records: usize,
    pub issues: Vec<RecordIssue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrectionAnalysis {
    pub total_correction_records: usize,
    pub unique_correctors: Vec<String>,
    pub tag_frequencies: BTreeMap<String, usize>,
    pub most_common_tags: Vec<(String, usize)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrectionReport {
    pub generated_at: DateTime<Utc>,
    pub correction_file: PathBuf,
    pub analysis: CorrectionAnalysis,
    pub validation: ValidationReport,
}

/// Reads and writes JSONL correction files
#[derive(Debug, Clone)]
pub struct CorrectionStore {
    backup: bool,
}

impl Default for CorrectionStore {
    fn default() -> Self {
        Self { backup: true }
    }
}

impl CorrectionStore {
    pub fn new(backup: bool) -> Self {
        Self { backup }
    }

    /// Load all records; lines that do not parse are logged and skipped
    pub fn load(&self, path: &Path) -> Result<Vec<CorrectionRecord>> {
        let file = std::fs::File::open(path)?;
        let mut records = Vec::new();

        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<CorrectionRecord>(line.trim()) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!("Could not parse line {} in {}: {}", idx, path.display(), e)
                }
            }
        }

        tracing::info!("Loaded {} records from {}", records.len(), path.display());
        Ok(records)
    }

    /// Overwrite `path` with the given records
    pub fn save(&self, path: &Path, records: &[CorrectionRecord]) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        for record in records {
            writeln!(file, "{}", serde_json::to_string(record)?)?;
        }
        tracing::info!("Saved {} records to {}", records.len(), path.display());
        Ok(())
    }

    /// Validate a reviewed record and append it to `path`
    pub fn append(
        &self,
        path: &Path,
        record: &CorrectionRecord,
        vocabulary: &LabelVocabulary,
    ) -> Result<()> {
        vocabulary.validate(&record.tokens, &record.tags)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", serde_json::to_string(record)?)?;

        tracing::info!("Saved correction to {}", path.display());
        Ok(())
    }

    /// Combine training data with corrections and write the result to
    /// `output`. Returns the number of records written. Nothing is written
    /// when the corrections file holds no records.
    pub fn merge(
        &self,
        corrections_path: &Path,
        training: &Path,
        output: &Path,
        deduplicate: bool,
    ) -> Result<usize> {
        let corrections = self.load(corrections_path)?;
        if corrections.is_empty() {
            tracing::warn!("No corrections loaded from {}", corrections_path.display());
            return Err(OrFormError::NotFound(format!(
                "correction records in {}",
                corrections_path.display()
            )));
        }

        let mut merged = if training.exists() {
            self.load(training)?
        } else {
            Vec::new()
        };
        merged.extend(corrections);

        if deduplicate {
            merged = deduplicate_records(merged);
        }

        if self.backup && output.exists() {
            let backup = backup_path(output);
            std::fs::copy(output, &backup)?;
            tracing::info!("Backed up original to {}", backup.display());
        }

        self.save(output, &merged)?;
        Ok(merged.len())
    }

    /// Tag frequencies and correctors across a corrections file
    pub fn analyze(&self, path: &Path) -> Result<CorrectionAnalysis> {
        let records = self.load(path)?;

        let mut tag_frequencies: BTreeMap<String, usize> = BTreeMap::new();
        let mut correctors = BTreeSet::new();

        for record in &records {
            for tag in &record.tags {
                *tag_frequencies.entry(tag.clone()).or_default() += 1;
            }
            if let Some(by) = record.metadata.as_ref().and_then(|m| m.corrected_by.as_ref()) {
                correctors.insert(by.clone());
            }
        }

        let mut most_common: Vec<(String, usize)> = tag_frequencies
            .iter()
            .map(|(tag, count)| (tag.clone(), *count))
            .collect();
        most_common.sort_by(|a, b| b.1.cmp(&a.1));
        most_common.truncate(5);

        Ok(CorrectionAnalysis {
            total_correction_records: records.len(),
            unique_correctors: correctors.into_iter().collect(),
            tag_frequencies,
            most_common_tags: most_common,
        })
    }

    /// Check every record for length mismatches and unknown tags
    pub fn validate(&self, path: &Path, vocabulary: &LabelVocabulary) -> Result<ValidationReport> {
        let records = self.load(path)?;
        let mut issues = Vec::new();
        let mut valid_records = 0;

        for (record_idx, record) in records.iter().enumerate() {
            if record.tokens.len() != record.tags.len() {
                issues.push(RecordIssue::TokenTagMismatch {
                    record_idx,
                    tokens: record.tokens.len(),
                    tags: record.tags.len(),
                });
                continue;
            }

            let invalid_tags = vocabulary.unknown_tags(&record.tags);
            if !invalid_tags.is_empty() {
                issues.push(RecordIssue::InvalidTags {
                    record_idx,
                    invalid_tags,
                });
                continue;
            }

            valid_records += 1;
        }

        Ok(ValidationReport {
            total_records: records.len(),
            valid_records,
            issues,
        })
    }

    /// Analysis plus validation, written as pretty JSON to `output`
    pub fn report(
        &self,
        path: &Path,
        vocabulary: &LabelVocabulary,
        output: &Path,
    ) -> Result<CorrectionReport> {
        let report = CorrectionReport {
            generated_at: Utc::now(),
            correction_file: path.to_path_buf(),
            analysis: self.analyze(path)?,
            validation: self.validate(path, vocabulary)?,
        };

        std::fs::write(output, serde_json::to_string_pretty(&report)?)?;
        tracing::info!("Saved report to {}", output.display());
        Ok(report)
    }
}

/// Keep the first record for each token sequence
fn deduplicate_records(records: Vec<CorrectionRecord>) -> Vec<CorrectionRecord> {
    let total = records.len();
    let mut seen = HashSet::new();
    let unique: Vec<CorrectionRecord> = records
        .into_iter()
        .filter(|record| seen.insert(record.signature()))
        .collect();
    tracing::info!("Deduplicated {} records to {} unique records", total, unique.len());
    unique
}

fn backup_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".backup");
    PathBuf::from(name)
}
