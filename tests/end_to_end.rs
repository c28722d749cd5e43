//! End-to-end scenarios: feature spec -> default record -> stub model -> result.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;

use churn_dash::{
    app_state::AppState,
    config_loader::DashConfig,
    numeric_range::RangeTable,
    tabular::TabularRecord,
    Classifier, DashError, DashResult, FeatureSpec, FeatureValue, FormEdits, ModelInfo,
    OutcomePolicy, RawLabel, TierTranslation,
};

/// Always answers with the same labels and remembers what it was shown
struct StubModel {
    labels: Vec<RawLabel>,
    calls: AtomicUsize,
    last_columns: std::sync::Mutex<Vec<String>>,
}

impl StubModel {
    fn returning(labels: Vec<RawLabel>) -> Arc<Self> {
        Arc::new(Self {
            labels,
            calls: AtomicUsize::new(0),
            last_columns: std::sync::Mutex::new(Vec::new()),
        })
    }
}

impl Classifier for StubModel {
    fn predict(&self, table: &TabularRecord) -> DashResult<Vec<RawLabel>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_columns.lock().unwrap() = table.columns().to_vec();
        Ok(self.labels.clone())
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            name: "stub".to_string(),
            kind: "stub".to_string(),
            description: None,
            format_version: None,
            classes: self.labels.clone(),
            input_columns: Vec::new(),
            fingerprint: None,
        }
    }
}

/// Fails on anything but `M`, like a pipeline without an unknown-category policy
struct StrictModel;

impl Classifier for StrictModel {
    fn predict(&self, table: &TabularRecord) -> DashResult<Vec<RawLabel>> {
        match table.value(0, "GENDER").and_then(FeatureValue::as_text) {
            Some("M") => Ok(vec![RawLabel::Code(1)]),
            Some(other) => Err(DashError::prediction(format!("unseen category '{other}'"))),
            None => Err(DashError::prediction("schema mismatch")),
        }
    }

    fn info(&self) -> ModelInfo {
        StubModel::returning(Vec::new()).info()
    }
}

fn gender_age_spec() -> FeatureSpec {
    FeatureSpec::from_value(&json!({
        "CATEGORICAL": {"Column Name": ["GENDER"], "Members": [["M", "F"]]},
        "NUMERICAL": {"Column Name": ["AGE"]}
    }))
    .unwrap()
}

fn state_with(model: Arc<dyn Classifier>) -> AppState {
    AppState::from_parts(
        gender_age_spec(),
        model,
        RangeTable::standard(),
        TierTranslation::new().with(1, "Tier 1"),
        OutcomePolicy::standard(),
    )
}

#[test]
fn default_record_predicts_tier_one() {
    let model = StubModel::returning(vec![RawLabel::Code(1)]);
    let state = state_with(model.clone());

    let record = state.form.default_record();
    assert_eq!(serde_json::to_value(&record).unwrap(), json!({"GENDER": "M", "AGE": 20}));

    let result = state.invoker.infer(&record).unwrap();
    assert_eq!(result.display_label, "Tier 1");
    assert!(result.is_positive_outcome);
    assert_eq!(*model.last_columns.lock().unwrap(), vec!["GENDER", "AGE"]);
}

#[test]
fn unmapped_label_is_unknown() {
    let state = state_with(StubModel::returning(vec![RawLabel::Code(99)]));
    let result = state.invoker.infer(&state.form.default_record()).unwrap();
    assert_eq!(result.display_label, "Unknown");
}

#[test]
fn missing_categorical_partition_fails_before_controls_exist() {
    let err = FeatureSpec::from_value(&json!({
        "NUMERICAL": {"Column Name": ["AGE"]}
    }))
    .unwrap_err();
    assert!(matches!(err, DashError::Config { .. }));
}

#[test]
fn same_record_twice_gives_same_result() {
    let model = StubModel::returning(vec![RawLabel::Code(1)]);
    let state = state_with(model.clone());
    let record = state.form.default_record();

    let first = state.invoker.infer(&record).unwrap();
    let second = state.invoker.infer(&record).unwrap();
    assert_eq!(first, second);
    assert_eq!(model.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn failed_request_does_not_affect_the_next() {
    let state = state_with(Arc::new(StrictModel));

    let female: FormEdits = [("GENDER".to_string(), FeatureValue::from("F"))].into();
    let (_, outcome) = state.predict(&female);
    assert!(matches!(outcome, Err(DashError::Prediction { .. })));

    let (cycle, outcome) = state.predict(&FormEdits::new());
    assert_eq!(outcome.unwrap().display_label, "Tier 1");
    assert_eq!(
        cycle.record().and_then(|r| r.get("GENDER")),
        Some(&FeatureValue::from("M"))
    );
}

#[test]
fn initialize_loads_bundled_fixtures() {
    let root = env!("CARGO_MANIFEST_DIR");
    let config = DashConfig {
        model_path: format!("{root}/models/pipeline.json"),
        feature_spec_path: format!("{root}/models/feature_spec.json"),
        ..DashConfig::default()
    };

    let state = AppState::initialize(&config).unwrap();
    assert_eq!(state.spec.len(), 7);
    assert_eq!(state.model_info.name, "employee-payment-tier");

    let (_, outcome) = state.predict(&FormEdits::new());
    let result = outcome.unwrap();
    assert!(["Tier 1", "Tier 2", "Tier 3"].contains(&result.display_label.as_str()));
    assert!(result.is_positive_outcome);
}

#[test]
fn initialize_fails_fast_on_missing_model() {
    let root = env!("CARGO_MANIFEST_DIR");
    let config = DashConfig {
        model_path: format!("{root}/models/does_not_exist.json"),
        feature_spec_path: format!("{root}/models/feature_spec.json"),
        ..DashConfig::default()
    };

    let err = AppState::initialize(&config).err().unwrap();
    assert!(matches!(err, DashError::ModelLoad { .. }));
    assert!(err.is_fatal());
}
