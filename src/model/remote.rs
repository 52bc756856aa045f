use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::config::ModelSettings;
use crate::extraction::{decode_predictions, RawPrediction, WirePrediction};
use crate::model::client::{ModelInfo, TokenClassifier};

/// Token-classification served over HTTP, Hugging Face inference style:
/// `POST {"inputs": ..., "parameters": {...}}` answered with a JSON array of
/// `{entity_group|entity, word, start, end, score}`.
pub struct RemoteClassifier {
    http: Client,
    endpoint: String,
    api_key: String,
    settings: ModelSettings,
}

impl RemoteClassifier {
    pub fn from_settings(settings: &ModelSettings) -> Result<Self> {
        let endpoint = settings.endpoint.trim().trim_end_matches('/').to_string();

        Ok(Self {
            http: Client::builder()
                .timeout(std::time::Duration::from_secs(settings.timeout_secs))
                .build()
                .context("Failed to build inference HTTP client")?,
            endpoint,
            api_key: settings.api_key.trim().to_string(),
            settings: settings.clone(),
        })
    }

    pub(crate) fn boxed(settings: &ModelSettings) -> Result<Box<dyn TokenClassifier>> {
        Ok(Box::new(Self::from_settings(settings)?))
    }

    fn request_body<'a>(&'a self, transcript: &'a str) -> InferenceRequest<'a> {
        InferenceRequest {
            inputs: transcript,
            parameters: InferenceParameters {
                aggregation_strategy: &self.settings.aggregation_strategy,
            },
        }
    }
}

#[async_trait]
impl TokenClassifier for RemoteClassifier {
    async fn predict(&self, transcript: &str) -> Result<Vec<RawPrediction>> {
        if !self.is_available() {
            anyhow::bail!("Inference endpoint is not configured. Set model.endpoint in config.");
        }

        let mut request = self.http.post(&self.endpoint).json(&self.request_body(transcript));
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await.context("Inference request failed")?;

        let response = response
            .error_for_status()
            .context("Inference endpoint returned an error status")?;

        let payload: Vec<WirePrediction> = response
            .json()
            .await
            .context("Failed to parse inference response")?;

        Ok(decode_predictions(payload))
    }

    fn is_available(&self) -> bool {
        !self.endpoint.is_empty()
    }

    fn model_info(&self) -> ModelInfo {
        if !self.is_available() {
            return ModelInfo::from([("status".to_string(), "not_available".to_string())]);
        }

        let s = &self.settings;
        ModelInfo::from([
            ("status".to_string(), "available".to_string()),
            ("model_type".to_string(), "remote".to_string()),
            ("endpoint".to_string(), self.endpoint.clone()),
            ("model_dir".to_string(), s.model_dir.clone()),
            ("aggregation_strategy".to_string(), s.aggregation_strategy.clone()),
            ("device".to_string(), s.device.clone()),
            ("max_length".to_string(), s.max_length.to_string()),
            ("batch_size".to_string(), s.batch_size.to_string()),
        ])
    }
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters<'a>,
}

#[derive(Debug, Serialize)]
struct InferenceParameters<'a> {
    aggregation_strategy: &'a str,
}
