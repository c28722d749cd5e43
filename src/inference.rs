//! Inference invocation: record -> one-row table -> model -> translated result.

use crate::errors::{DashError, DashResult};
use crate::feature_spec::FeatureSpec;
use crate::labels::{OutcomePolicy, RawLabel, TierTranslation};
use crate::model::Classifier;
use crate::record::InputRecord;
use crate::tabular::TabularRecord;
use serde::Serialize;
use std::sync::Arc;

/// Translated model output, ready for presentation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub raw_label: RawLabel,
    pub display_label: String,
    pub is_positive_outcome: bool,
}

pub struct InferenceInvoker {
    spec: Arc<FeatureSpec>,
    model: Arc<dyn Classifier>,
    tiers: TierTranslation,
    outcomes: OutcomePolicy,
}

impl InferenceInvoker {
    pub fn new(
        spec: Arc<FeatureSpec>,
        model: Arc<dyn Classifier>,
        tiers: TierTranslation,
        outcomes: OutcomePolicy,
    ) -> Self {
        Self {
            spec,
            model,
            tiers,
            outcomes,
        }
    }

    /// Run the model once on `record`. No retries, nothing cached.
    pub fn infer(&self, record: &InputRecord) -> DashResult<PredictionResult> {
        let table = TabularRecord::single_row(&self.spec, record)?;

        let labels = self.model.predict(&table).map_err(|e| match e {
            DashError::Prediction { .. } => e,
            other => DashError::prediction(other.to_string()),
        })?;
        let raw_label = labels
            .into_iter()
            .next()
            .ok_or_else(|| DashError::prediction("model returned no labels"))?;

        let result = PredictionResult {
            display_label: self.tiers.translate(&raw_label),
            is_positive_outcome: self.outcomes.is_positive(&raw_label),
            raw_label,
        };
        tracing::info!(
            "Prediction: raw={} display={} positive={}",
            result.raw_label,
            result.display_label,
            result.is_positive_outcome
        );
        Ok(result)
    }
}
