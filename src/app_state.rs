use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    config_loader::DashConfig,
    errors::DashResult,
    feature_spec::FeatureSpec,
    form_builder::{FormBuilder, FormEdits},
    inference::{InferenceInvoker, PredictionResult},
    labels::{OutcomePolicy, TierTranslation},
    model::{load_model, Classifier, ModelInfo},
    numeric_range::RangeTable,
    request_cycle::PredictionCycle,
};

/// Process-wide, read-only state. Built once at startup and shared by `Arc`.
pub struct AppState {
    pub spec: Arc<FeatureSpec>,
    pub form: FormBuilder,
    pub invoker: InferenceInvoker,
    pub model_info: ModelInfo,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Load the feature spec and model named by `config`. Any failure here is fatal.
    pub fn initialize(config: &DashConfig) -> DashResult<Self> {
        let spec = FeatureSpec::load(Path::new(&config.feature_spec_path))?;
        let model = load_model(Path::new(&config.model_path))?;

        let state = Self::from_parts(
            spec,
            model,
            config.range_table()?,
            TierTranslation::from_config(&config.labels.tiers)?,
            OutcomePolicy::from_config(&config.labels.alert_labels),
        );

        let missing: Vec<_> = state
            .model_info
            .input_columns
            .iter()
            .filter(|column| !state.spec.contains(column))
            .cloned()
            .collect();
        if !missing.is_empty() {
            tracing::warn!(
                "Model expects columns the feature spec does not declare: {:?}",
                missing
            );
        }

        tracing::info!(
            "Dashboard state initialized: {} features, model '{}'",
            state.spec.len(),
            state.model_info.name
        );
        Ok(state)
    }

    pub fn from_parts(
        spec: FeatureSpec,
        model: Arc<dyn Classifier>,
        ranges: RangeTable,
        tiers: TierTranslation,
        outcomes: OutcomePolicy,
    ) -> Self {
        let spec = Arc::new(spec);
        let model_info = model.info();
        Self {
            form: FormBuilder::new(spec.clone(), ranges),
            invoker: InferenceInvoker::new(spec.clone(), model, tiers, outcomes),
            spec,
            model_info,
            started_at: Utc::now(),
        }
    }

    /// One full request cycle over the shared state
    pub fn predict(&self, edits: &FormEdits) -> (PredictionCycle, DashResult<PredictionResult>) {
        PredictionCycle::execute(&self.form, &self.invoker, edits)
    }
}
