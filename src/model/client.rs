use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::ModelSettings;
use crate::extraction::{extract, RawPrediction};
use crate::model::remote::RemoteClassifier;
use crate::model::rules_only::RulesOnlyClassifier;
use crate::schema::OrForm;

/// Metadata reported by a back-end
pub type ModelInfo = BTreeMap<String, String>;

/// A token-classification back-end
#[async_trait]
pub trait TokenClassifier: Send + Sync {
    /// Raw per-token predictions for a transcript
    async fn predict(&self, transcript: &str) -> Result<Vec<RawPrediction>>;

    /// Whether the back-end is configured well enough to be used
    fn is_available(&self) -> bool;

    fn model_info(&self) -> ModelInfo;
}

/// Constructor for one back-end type
pub type ClassifierConstructor = fn(&ModelSettings) -> Result<Box<dyn TokenClassifier>>;

/// Result of checking a back-end configuration without running it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelValidation {
    pub valid: bool,
    pub available: bool,
    pub message: String,
    pub warnings: Vec<String>,
}

/// Back-end types known to this process, built once at startup
pub struct ModelRegistry {
    constructors: BTreeMap<String, ClassifierConstructor>,
}

impl ModelRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Registry with the built-in back-ends
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("remote", RemoteClassifier::boxed);
        registry.register("http", RemoteClassifier::boxed);
        registry.register("rules-only", RulesOnlyClassifier::boxed);
        registry.register("none", RulesOnlyClassifier::boxed);
        registry
    }

    pub fn register(&mut self, model_type: &str, constructor: ClassifierConstructor) {
        tracing::debug!("Registered model back-end: {}", model_type);
        self.constructors
            .insert(model_type.to_lowercase(), constructor);
    }

    pub fn available_types(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Build the back-end named by `model_type`
    pub fn create(
        &self,
        model_type: &str,
        settings: &ModelSettings,
    ) -> Result<Box<dyn TokenClassifier>> {
        let constructor = self
            .constructors
            .get(&model_type.to_lowercase())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown model back-end '{}'. Available: {}",
                    model_type,
                    self.available_types().join(", ")
                )
            })?;

        let classifier = constructor(settings)?;
        if !classifier.is_available() {
            anyhow::bail!(
                "Model back-end '{}' is not available (check model.endpoint)",
                model_type
            );
        }

        tracing::info!("Created model back-end: {}", model_type);
        Ok(classifier)
    }

    /// Check whether a configuration would produce a usable back-end
    pub fn validate(&self, model_type: &str, settings: &ModelSettings) -> ModelValidation {
        let mut result = ModelValidation::default();

        let Some(constructor) = self.constructors.get(&model_type.to_lowercase()) else {
            result.message = format!(
                "Unknown model type: {}. Available types: {}",
                model_type,
                self.available_types().join(", ")
            );
            return result;
        };
        result.valid = true;

        match constructor(settings) {
            Ok(classifier) if classifier.is_available() => {
                result.available = true;
                result.message = format!("Model back-end {} is valid and available", model_type);
            }
            Ok(_) => {
                result.message = format!(
                    "Model type '{}' is registered but not configured",
                    model_type
                );
                return result;
            }
            Err(e) => {
                result.message = format!("Could not create back-end: {}", e);
                return result;
            }
        }

        if settings.device == "cuda" {
            result
                .warnings
                .push("device=cuda is passed to the endpoint; this process never uses a GPU".to_string());
        }
        if !matches!(
            settings.aggregation_strategy.as_str(),
            "none" | "simple" | "first" | "average" | "max"
        ) {
            result.warnings.push(format!(
                "Unrecognized aggregation_strategy '{}'",
                settings.aggregation_strategy
            ));
        }

        result
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Runs a back-end and turns its output into an OR form
pub struct Extractor {
    classifier: Box<dyn TokenClassifier>,
}

impl Extractor {
    pub fn new(classifier: Box<dyn TokenClassifier>) -> Self {
        Self { classifier }
    }

    /// Build the configured back-end through `registry`
    pub fn from_settings(registry: &ModelRegistry, settings: &ModelSettings) -> Result<Self> {
        Ok(Self::new(registry.create(&settings.backend, settings)?))
    }

    pub async fn extract(&self, transcript: &str) -> Result<OrForm> {
        let predictions = self.classifier.predict(transcript).await?;
        tracing::debug!("Back-end returned {} predictions", predictions.len());
        Ok(extract(transcript, &predictions))
    }

    pub async fn predict(&self, transcript: &str) -> Result<Vec<RawPrediction>> {
        self.classifier.predict(transcript).await
    }

    pub fn is_available(&self) -> bool {
        self.classifier.is_available()
    }

    pub fn model_info(&self) -> ModelInfo {
        self.classifier.model_info()
    }
}
