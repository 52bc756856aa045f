use anyhow::Result;
use async_trait::async_trait;

use crate::config::ModelSettings;
use crate::extraction::RawPrediction;
use crate::model::client::{ModelInfo, TokenClassifier};

/// Back-end with no model: extraction falls through to the transcript rules
/// and free-text notes.
pub struct RulesOnlyClassifier;

impl RulesOnlyClassifier {
    pub(crate) fn boxed(_settings: &ModelSettings) -> Result<Box<dyn TokenClassifier>> {
        Ok(Box::new(Self))
    }
}

#[async_trait]
impl TokenClassifier for RulesOnlyClassifier {
    async fn predict(&self, _transcript: &str) -> Result<Vec<RawPrediction>> {
        Ok(Vec::new())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo::from([
            ("status".to_string(), "available".to_string()),
            ("model_type".to_string(), "rules-only".to_string()),
        ])
    }
}
