//! Label tooling for the human correction workflow
//!
//! BIO alignment of model output, vocabulary validation, and the JSONL files
//! that collect reviewed sequences for retraining.

mod align;
mod corrections;
mod vocabulary;

pub use align::{align_to_tokens, tokenize, TagSequence, OUTSIDE_TAG};
pub use corrections::{
    CorrectionAnalysis, CorrectionMetadata, CorrectionRecord, CorrectionReport, CorrectionStore,
    RecordIssue, ValidationReport,
};
pub use vocabulary::{LabelVocabulary, ValidationError};
