//! Feature-driven form generation
//!
//! The builder turns a `FeatureSpec` into one control per feature and merges
//! the user's current edits into an `InputRecord`. It holds no per-request
//! state: every call recomputes the record from defaults plus edits.

use crate::errors::{DashError, DashResult};
use crate::feature_spec::FeatureSpec;
use crate::numeric_range::RangeTable;
use crate::record::{FeatureValue, InputRecord};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Raw edits keyed by feature name, as delivered by an HTML form or JSON body
pub type FormEdits = BTreeMap<String, FeatureValue>;

/// A single input control, ready for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldControl {
    Select {
        name: String,
        label: String,
        help: String,
        options: Vec<String>,
        selected: String,
    },
    Slider {
        name: String,
        label: String,
        help: String,
        min: f64,
        max: f64,
        value: f64,
    },
}

impl FieldControl {
    pub fn name(&self) -> &str {
        match self {
            FieldControl::Select { name, .. } | FieldControl::Slider { name, .. } => name,
        }
    }
}

pub struct FormBuilder {
    spec: Arc<FeatureSpec>,
    ranges: RangeTable,
}

impl FormBuilder {
    pub fn new(spec: Arc<FeatureSpec>, ranges: RangeTable) -> Self {
        Self { spec, ranges }
    }

    /// Controls carrying their default values
    pub fn controls(&self) -> Vec<FieldControl> {
        self.controls_for(&self.default_record())
    }

    /// Controls reflecting the values of `record`, defaults where it is silent
    pub fn controls_for(&self, record: &InputRecord) -> Vec<FieldControl> {
        let selects = self.spec.categorical().iter().map(|feature| {
            let selected = record
                .get(&feature.name)
                .map(|v| v.to_string())
                .unwrap_or_else(|| feature.options[0].clone());
            FieldControl::Select {
                name: feature.name.clone(),
                label: feature.name.clone(),
                help: format!("Choose the most relevant option for {}", feature.name),
                options: feature.options.clone(),
                selected,
            }
        });

        let sliders = self.spec.numerical().iter().map(|name| {
            let range = self.ranges.lookup(name);
            let value = record
                .get(name)
                .and_then(FeatureValue::as_number)
                .unwrap_or(range.default);
            FieldControl::Slider {
                name: name.clone(),
                label: format!("Adjust {name}:"),
                help: format!("Slide to set the value for {name}"),
                min: range.min,
                max: range.max,
                value,
            }
        });

        selects.chain(sliders).collect()
    }

    /// Record with every control at its default: first option, range default
    pub fn default_record(&self) -> InputRecord {
        let mut record = InputRecord::new();
        for feature in self.spec.categorical() {
            record.insert(feature.name.clone(), feature.options[0].clone());
        }
        for name in self.spec.numerical() {
            record.insert(name.clone(), self.ranges.lookup(name).default);
        }
        record
    }

    /// Merge `edits` over the defaults, checking each value against its domain
    pub fn build_record(&self, edits: &FormEdits) -> DashResult<InputRecord> {
        if let Some(unknown) = edits.keys().find(|name| !self.spec.contains(name)) {
            return Err(DashError::validation(
                unknown.clone(),
                "not a declared feature",
            ));
        }

        let mut record = self.default_record();

        for feature in self.spec.categorical() {
            let Some(edit) = edits.get(&feature.name) else {
                continue;
            };
            let Some(choice) = matching_option(&feature.options, edit) else {
                return Err(DashError::validation(
                    feature.name.clone(),
                    format!("'{edit}' is not one of {:?}", feature.options),
                ));
            };
            record.insert(feature.name.clone(), choice.clone());
        }

        for name in self.spec.numerical() {
            let Some(edit) = edits.get(name) else {
                continue;
            };
            let value = parse_number(name, edit)?;
            let range = self.ranges.lookup(name);
            if !range.contains(value) {
                return Err(DashError::validation(
                    name.clone(),
                    format!("{value} outside [{}, {}]", range.min, range.max),
                ));
            }
            record.insert(name.clone(), value);
        }

        tracing::debug!("Built input record with {} fields", record.len());
        Ok(record)
    }

    /// Defaults overlaid with whatever `edits` can be displayed, unvalidated.
    ///
    /// Only used to re-render a rejected form; never handed to a model.
    pub fn echo_record(&self, edits: &FormEdits) -> InputRecord {
        let mut record = self.default_record();
        for feature in self.spec.categorical() {
            if let Some(edit) = edits.get(&feature.name) {
                let shown = matching_option(&feature.options, edit)
                    .cloned()
                    .unwrap_or_else(|| edit.to_string());
                record.insert(feature.name.clone(), shown);
            }
        }
        for name in self.spec.numerical() {
            if let Some(value) = edits.get(name).and_then(|edit| parse_number(name, edit).ok()) {
                record.insert(name.clone(), value);
            }
        }
        record
    }
}

/// Option equal to `edit`; numeric edits compare by value, so `1` matches "1.0"
fn matching_option<'a>(options: &'a [String], edit: &FeatureValue) -> Option<&'a String> {
    match edit {
        FeatureValue::Text(text) => options.iter().find(|option| *option == text),
        FeatureValue::Number(n) => options
            .iter()
            .find(|option| option.trim().parse::<f64>().is_ok_and(|v| v == *n)),
    }
}

fn parse_number(name: &str, edit: &FeatureValue) -> DashResult<f64> {
    let value = match edit {
        FeatureValue::Number(n) => *n,
        FeatureValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| DashError::validation(name, format!("'{s}' is not a number")))?,
    };
    if !value.is_finite() {
        return Err(DashError::validation(name, "value must be finite"));
    }
    Ok(value)
}
