//! Classification pipeline seam and the bundled linear pipeline.
//!
//! `LinearPipeline` is a persisted preprocessing + multinomial linear model:
//! categorical columns are one-hot encoded, numerical columns standardized,
//! and the class with the highest linear score wins.

use crate::errors::{DashError, DashResult};
use crate::labels::RawLabel;
use crate::record::FeatureValue;
use crate::tabular::TabularRecord;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Model file format version this build understands
pub const SUPPORTED_FORMAT_VERSION: u32 = 1;

/// A loaded classification pipeline
pub trait Classifier: Send + Sync {
    /// One label per input row
    fn predict(&self, table: &TabularRecord) -> DashResult<Vec<RawLabel>>;

    fn info(&self) -> ModelInfo;
}

/// Descriptive metadata for the Model Info page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    pub kind: String,
    pub description: Option<String>,
    pub format_version: Option<u32>,
    pub classes: Vec<RawLabel>,
    pub input_columns: Vec<String>,
    pub fingerprint: Option<String>,
}

/// What to do with a category the encoder never saw
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleUnknown {
    #[default]
    Error,
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotColumn {
    pub column: String,
    pub categories: Vec<String>,
    #[serde(default)]
    pub handle_unknown: HandleUnknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledColumn {
    pub column: String,
    #[serde(default)]
    pub mean: f64,
    #[serde(default = "unit_scale")]
    pub scale: f64,
}

fn unit_scale() -> f64 {
    1.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preprocessing {
    #[serde(default)]
    pub categorical: Vec<OneHotColumn>,
    #[serde(default)]
    pub numerical: Vec<ScaledColumn>,
}

/// Multinomial linear classifier: one weight row and intercept per class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub classes: Vec<RawLabel>,
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearPipeline {
    pub format_version: u32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub preprocessing: Preprocessing,
    pub classifier: LinearClassifier,
    #[serde(skip)]
    fingerprint: Option<String>,
}

impl LinearPipeline {
    /// Load and validate a pipeline document from disk
    pub fn load<P: AsRef<Path>>(path: P) -> DashResult<Self> {
        let path = path.as_ref();
        let source = path.display().to_string();
        let bytes = fs::read(path)
            .map_err(|e| DashError::model_load(&source, format!("cannot read model file: {e}")))?;
        let pipeline = Self::from_bytes(&bytes, &source)?;

        tracing::info!(
            "Loaded model '{}' from {} ({} classes, {} inputs)",
            pipeline.name,
            source,
            pipeline.classifier.classes.len(),
            pipeline.n_features()
        );
        Ok(pipeline)
    }

    /// Parse and validate a pipeline document; `source` names it in errors
    pub fn from_bytes(bytes: &[u8], source: &str) -> DashResult<Self> {
        let mut pipeline: Self = serde_json::from_slice(bytes)
            .map_err(|e| DashError::model_load(source, format!("corrupt model file: {e}")))?;
        pipeline
            .validate()
            .map_err(|message| DashError::model_load(source, message))?;
        pipeline.fingerprint = Some(format!("{:x}", Sha256::digest(bytes)));
        Ok(pipeline)
    }

    fn validate(&self) -> Result<(), String> {
        if self.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(format!(
                "unsupported format_version {} (expected {SUPPORTED_FORMAT_VERSION})",
                self.format_version
            ));
        }

        let mut columns = HashSet::new();
        for column in self.input_columns() {
            if !columns.insert(column) {
                return Err(format!("column '{column}' is preprocessed twice"));
            }
        }
        for encoder in &self.preprocessing.categorical {
            if encoder.categories.is_empty() {
                return Err(format!("encoder for '{}' has no categories", encoder.column));
            }
        }
        for scaler in &self.preprocessing.numerical {
            if !scaler.mean.is_finite() || !scaler.scale.is_finite() || scaler.scale == 0.0 {
                return Err(format!("scaler for '{}' is degenerate", scaler.column));
            }
        }

        let classifier = &self.classifier;
        let n_classes = classifier.classes.len();
        if n_classes == 0 {
            return Err("classifier has no classes".to_string());
        }
        if classifier.coefficients.len() != n_classes || classifier.intercepts.len() != n_classes {
            return Err(format!(
                "expected {n_classes} coefficient rows and intercepts, found {} and {}",
                classifier.coefficients.len(),
                classifier.intercepts.len()
            ));
        }
        let width = self.n_features();
        if let Some(row) = classifier.coefficients.iter().find(|row| row.len() != width) {
            return Err(format!(
                "coefficient row has {} weights, preprocessing produces {width}",
                row.len()
            ));
        }
        Ok(())
    }

    fn input_columns(&self) -> impl Iterator<Item = &str> {
        self.preprocessing
            .categorical
            .iter()
            .map(|c| c.column.as_str())
            .chain(self.preprocessing.numerical.iter().map(|c| c.column.as_str()))
    }

    /// Width of the encoded feature vector
    pub fn n_features(&self) -> usize {
        self.preprocessing
            .categorical
            .iter()
            .map(|c| c.categories.len())
            .sum::<usize>()
            + self.preprocessing.numerical.len()
    }

    fn encode_row(&self, table: &TabularRecord, row: usize) -> DashResult<Vec<f64>> {
        let mut encoded = Vec::with_capacity(self.n_features());

        for encoder in &self.preprocessing.categorical {
            let value = lookup(table, row, &encoder.column)?.to_string();
            match encoder.categories.iter().position(|c| *c == value) {
                Some(hot) => {
                    encoded.extend((0..encoder.categories.len()).map(|i| if i == hot { 1.0 } else { 0.0 }));
                }
                None if encoder.handle_unknown == HandleUnknown::Ignore => {
                    encoded.extend(std::iter::repeat(0.0).take(encoder.categories.len()));
                }
                None => {
                    return Err(DashError::prediction(format!(
                        "unseen category '{value}' for column '{}'",
                        encoder.column
                    )))
                }
            }
        }

        for scaler in &self.preprocessing.numerical {
            let x = match lookup(table, row, &scaler.column)? {
                FeatureValue::Number(n) => *n,
                FeatureValue::Text(s) => {
                    return Err(DashError::prediction(format!(
                        "column '{}' expects a number, got '{s}'",
                        scaler.column
                    )))
                }
            };
            encoded.push((x - scaler.mean) / scaler.scale);
        }

        Ok(encoded)
    }

    /// Per-class linear scores for an encoded row
    pub fn decision_scores(&self, encoded: &[f64]) -> Vec<f64> {
        self.classifier
            .coefficients
            .iter()
            .zip(&self.classifier.intercepts)
            .map(|(weights, intercept)| {
                intercept + weights.iter().zip(encoded).map(|(w, x)| w * x).sum::<f64>()
            })
            .collect()
    }
}

fn lookup<'a>(table: &'a TabularRecord, row: usize, column: &str) -> DashResult<&'a FeatureValue> {
    table.value(row, column).ok_or_else(|| {
        DashError::prediction(format!("schema mismatch: input has no column '{column}'"))
    })
}

impl Classifier for LinearPipeline {
    fn predict(&self, table: &TabularRecord) -> DashResult<Vec<RawLabel>> {
        (0..table.n_rows())
            .map(|row| {
                let encoded = self.encode_row(table, row)?;
                let scores = self.decision_scores(&encoded);
                // first maximum wins ties
                let best = scores
                    .iter()
                    .enumerate()
                    .fold(0, |best, (i, s)| if *s > scores[best] { i } else { best });
                Ok(self.classifier.classes[best].clone())
            })
            .collect()
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            name: self.name.clone(),
            kind: "linear_pipeline".to_string(),
            description: self.description.clone(),
            format_version: Some(self.format_version),
            classes: self.classifier.classes.clone(),
            input_columns: self.input_columns().map(str::to_string).collect(),
            fingerprint: self.fingerprint.clone(),
        }
    }
}

/// Load the model handle used for the lifetime of the process
pub fn load_model<P: AsRef<Path>>(path: P) -> DashResult<Arc<dyn Classifier>> {
    Ok(Arc::new(LinearPipeline::load(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_spec::FeatureSpec;
    use crate::record::InputRecord;
    use serde_json::json;

    fn pipeline_json() -> serde_json::Value {
        json!({
            "format_version": 1,
            "name": "tier-classifier",
            "preprocessing": {
                "categorical": [{"column": "GENDER", "categories": ["M", "F"]}],
                "numerical": [{"column": "AGE", "mean": 40.0, "scale": 10.0}]
            },
            "classifier": {
                "classes": [1, 2, 3],
                "coefficients": [[1.0, 0.0, -1.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
                "intercepts": [0.0, 0.0, 0.0]
            }
        })
    }

    fn table(gender: &str, age: f64) -> TabularRecord {
        let spec = FeatureSpec::from_value(&json!({
            "CATEGORICAL": {"Column Name": ["GENDER"], "Members": [["M", "F", "X"]]},
            "NUMERICAL": {"Column Name": ["AGE"]}
        }))
        .unwrap();
        let mut record = InputRecord::new();
        record.insert("GENDER", gender);
        record.insert("AGE", age);
        TabularRecord::single_row(&spec, &record).unwrap()
    }

    fn pipeline(value: serde_json::Value) -> DashResult<LinearPipeline> {
        LinearPipeline::from_bytes(value.to_string().as_bytes(), "test")
    }

    #[test]
    fn predicts_highest_scoring_class() {
        let model = pipeline(pipeline_json()).unwrap();
        // young male: score(1) = 1 + 2 = 3
        assert_eq!(model.predict(&table("M", 20.0)).unwrap(), vec![RawLabel::Code(1)]);
        // older female: score(3) = 2.0 beats score(2) = 1.0
        assert_eq!(model.predict(&table("F", 60.0)).unwrap(), vec![RawLabel::Code(3)]);
    }

    #[test]
    fn ties_go_to_first_class() {
        let mut value = pipeline_json();
        value["classifier"]["coefficients"] = json!([[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]]);
        let model = pipeline(value).unwrap();
        assert_eq!(model.predict(&table("F", 50.0)).unwrap(), vec![RawLabel::Code(1)]);
    }

    #[test]
    fn unseen_category_raises_prediction_error() {
        let model = pipeline(pipeline_json()).unwrap();
        let err = model.predict(&table("X", 30.0)).unwrap_err();
        assert!(matches!(err, DashError::Prediction { .. }));
    }

    #[test]
    fn ignored_unknown_category_encodes_as_zeros() {
        let mut value = pipeline_json();
        value["preprocessing"]["categorical"][0]["handle_unknown"] = json!("ignore");
        let model = pipeline(value).unwrap();
        // zeros for GENDER, AGE=40 -> all scores 0 -> first class
        assert_eq!(model.predict(&table("X", 40.0)).unwrap(), vec![RawLabel::Code(1)]);
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut value = pipeline_json();
        value["format_version"] = json!(7);
        let err = pipeline(value).unwrap_err();
        assert!(matches!(err, DashError::ModelLoad { .. }));
        assert!(err.to_string().contains("format_version"));
    }

    #[test]
    fn rejects_shape_mismatch() {
        let mut value = pipeline_json();
        value["classifier"]["coefficients"][1] = json!([1.0]);
        assert!(matches!(pipeline(value), Err(DashError::ModelLoad { .. })));

        let mut value = pipeline_json();
        value["classifier"]["intercepts"] = json!([0.0]);
        assert!(matches!(pipeline(value), Err(DashError::ModelLoad { .. })));
    }

    #[test]
    fn rejects_zero_scale() {
        let mut value = pipeline_json();
        value["preprocessing"]["numerical"][0]["scale"] = json!(0.0);
        assert!(matches!(pipeline(value), Err(DashError::ModelLoad { .. })));
    }

    #[test]
    fn corrupt_or_missing_file_is_model_load_error() {
        assert!(matches!(
            LinearPipeline::from_bytes(b"\x80\x04pickle", "pipeline.pkl"),
            Err(DashError::ModelLoad { .. })
        ));
        assert!(matches!(
            LinearPipeline::load("/nonexistent/pipeline.json"),
            Err(DashError::ModelLoad { .. })
        ));
    }

    #[test]
    fn info_carries_fingerprint_and_columns() {
        let model = pipeline(pipeline_json()).unwrap();
        let info = model.info();
        assert_eq!(info.input_columns, vec!["GENDER", "AGE"]);
        assert_eq!(info.fingerprint.as_ref().map(String::len), Some(64));
        assert_eq!(info.classes.len(), 3);
    }
}
