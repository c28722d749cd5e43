//! Feature-description store
//!
//! A `FeatureSpec` is loaded once at startup from a JSON or TOML document
//! shaped like:
//!
//! ```text
//! { "CATEGORICAL": { "Column Name": ["GENDER"], "Members": [["M", "F"]] },
//!   "NUMERICAL":   { "Column Name": ["AGE"] } }
//! ```
//!
//! `Column Name` may also be an index-keyed mapping (`{"0": "GENDER"}`), which
//! is how tabular `to_dict()` exports write it. Any structural problem is a
//! configuration error.

use crate::errors::{DashError, DashResult};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub const CATEGORICAL: &str = "CATEGORICAL";
pub const NUMERICAL: &str = "NUMERICAL";
pub const COLUMN_NAME: &str = "Column Name";
pub const MEMBERS: &str = "Members";

/// A categorical feature and its allowed values, in display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoricalFeature {
    pub name: String,
    pub options: Vec<String>,
}

/// Immutable description of the expected input features
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureSpec {
    categorical: Vec<CategoricalFeature>,
    numerical: Vec<String>,
}

impl FeatureSpec {
    /// Build a spec from already-parsed partitions, enforcing the invariants
    pub fn new(categorical: Vec<CategoricalFeature>, numerical: Vec<String>) -> DashResult<Self> {
        let mut seen = HashSet::new();

        for feature in &categorical {
            check_name(&feature.name, &mut seen)?;
            if feature.options.is_empty() {
                return Err(DashError::config(format!(
                    "categorical feature '{}' has an empty option list",
                    feature.name
                )));
            }
        }
        for name in &numerical {
            check_name(name, &mut seen)?;
        }

        Ok(Self {
            categorical,
            numerical,
        })
    }

    /// Load the feature description from disk; `.toml` files are parsed as TOML, anything else as JSON
    pub fn load<P: AsRef<Path>>(path: P) -> DashResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            DashError::config(format!(
                "failed to read feature spec {}: {e}",
                path.display()
            ))
        })?;

        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let spec = if is_toml {
            Self::from_toml_str(&content)?
        } else {
            Self::from_json_str(&content)?
        };

        tracing::info!(
            "Loaded feature spec from {}: {} categorical, {} numerical",
            path.display(),
            spec.categorical.len(),
            spec.numerical.len()
        );
        Ok(spec)
    }

    pub fn from_json_str(content: &str) -> DashResult<Self> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| DashError::config(format!("invalid feature spec JSON: {e}")))?;
        Self::from_value(&value)
    }

    pub fn from_toml_str(content: &str) -> DashResult<Self> {
        let value: Value = toml::from_str(content)
            .map_err(|e| DashError::config(format!("invalid feature spec TOML: {e}")))?;
        Self::from_value(&value)
    }

    /// Interpret a parsed document as a two-partition feature spec
    pub fn from_value(value: &Value) -> DashResult<Self> {
        let root = value
            .as_object()
            .ok_or_else(|| DashError::config("feature spec must be a mapping"))?;

        let categorical_part = partition(root, CATEGORICAL)?;
        let numerical_part = partition(root, NUMERICAL)?;

        let names = column_names(CATEGORICAL, categorical_part.get(COLUMN_NAME))?;
        let members = members(categorical_part.get(MEMBERS))?;
        if names.len() != members.len() {
            return Err(DashError::config(format!(
                "{CATEGORICAL} has {} column names but {} member lists",
                names.len(),
                members.len()
            )));
        }

        let categorical = names
            .into_iter()
            .zip(members)
            .map(|(name, options)| CategoricalFeature { name, options })
            .collect();
        let numerical = column_names(NUMERICAL, numerical_part.get(COLUMN_NAME))?;

        Self::new(categorical, numerical)
    }

    pub fn categorical(&self) -> &[CategoricalFeature] {
        &self.categorical
    }

    pub fn numerical(&self) -> &[String] {
        &self.numerical
    }

    /// Column order expected by the model: categorical first, then numerical
    pub fn column_order(&self) -> Vec<&str> {
        self.categorical
            .iter()
            .map(|f| f.name.as_str())
            .chain(self.numerical.iter().map(String::as_str))
            .collect()
    }

    pub fn categorical_feature(&self, name: &str) -> Option<&CategoricalFeature> {
        self.categorical.iter().find(|f| f.name == name)
    }

    pub fn is_numerical(&self, name: &str) -> bool {
        self.numerical.iter().any(|n| n == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.categorical_feature(name).is_some() || self.is_numerical(name)
    }

    pub fn len(&self) -> usize {
        self.categorical.len() + self.numerical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_name(name: &str, seen: &mut HashSet<String>) -> DashResult<()> {
    if name.trim().is_empty() {
        return Err(DashError::config("feature names cannot be empty"));
    }
    if !seen.insert(name.to_string()) {
        return Err(DashError::config(format!("feature '{name}' is declared twice")));
    }
    Ok(())
}

fn partition<'a>(root: &'a Map<String, Value>, key: &str) -> DashResult<&'a Map<String, Value>> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(DashError::config(format!("{key} partition must be a mapping"))),
        None => Err(DashError::config(format!("missing {key} partition"))),
    }
}

fn column_names(partition: &str, value: Option<&Value>) -> DashResult<Vec<String>> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                scalar_to_string(item).ok_or_else(|| {
                    DashError::config(format!("{partition} column names must be scalars"))
                })
            })
            .collect(),
        Some(Value::Object(indexed)) => {
            let mut ordered = Vec::with_capacity(indexed.len());
            for (key, item) in indexed {
                let index: usize = key.parse().map_err(|_| {
                    DashError::config(format!(
                        "{partition} column index '{key}' is not a non-negative integer"
                    ))
                })?;
                let name = scalar_to_string(item).ok_or_else(|| {
                    DashError::config(format!("{partition} column names must be scalars"))
                })?;
                ordered.push((index, name));
            }
            ordered.sort_by_key(|(index, _)| *index);
            Ok(ordered.into_iter().map(|(_, name)| name).collect())
        }
        Some(_) => Err(DashError::config(format!(
            "{partition} '{COLUMN_NAME}' must be a list or an index mapping"
        ))),
        None => Err(DashError::config(format!(
            "{partition} partition is missing '{COLUMN_NAME}'"
        ))),
    }
}

fn members(value: Option<&Value>) -> DashResult<Vec<Vec<String>>> {
    let lists = match value {
        Some(Value::Array(lists)) => lists,
        Some(_) => {
            return Err(DashError::config(format!(
                "{CATEGORICAL} '{MEMBERS}' must be a list of lists"
            )))
        }
        None => {
            return Err(DashError::config(format!(
                "{CATEGORICAL} partition is missing '{MEMBERS}'"
            )))
        }
    };

    lists
        .iter()
        .map(|list| match list {
            Value::Array(options) => options
                .iter()
                .map(|option| {
                    scalar_to_string(option).ok_or_else(|| {
                        DashError::config(format!("{CATEGORICAL} members must be scalars"))
                    })
                })
                .collect(),
            _ => Err(DashError::config(format!(
                "{CATEGORICAL} '{MEMBERS}' must be a list of lists"
            ))),
        })
        .collect()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
