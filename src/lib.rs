//! Library root for the `churn_dash` crate
//! Feature-driven prediction dashboard: form generation, inference, web adapter

// Core error handling
pub mod errors;
pub mod api_errors;

// Feature description and form generation
pub mod feature_spec;
pub mod numeric_range;
pub mod record;
pub mod form_builder;

// Inference
pub mod tabular;
pub mod model;
pub mod labels;
pub mod inference;
pub mod request_cycle;

// Runtime configuration & shared state
pub mod config_loader;
pub mod app_state;

// Web server interface
pub mod pages;
pub mod web;

// CLI
pub mod cli;

// Logging
pub mod log_sink;

pub use app_state::AppState;
pub use errors::{DashError, DashResult};
pub use feature_spec::FeatureSpec;
pub use form_builder::{FieldControl, FormBuilder, FormEdits};
pub use inference::{InferenceInvoker, PredictionResult};
pub use labels::{OutcomePolicy, RawLabel, TierTranslation};
pub use model::{Classifier, LinearPipeline, ModelInfo};
pub use record::{FeatureValue, InputRecord};
