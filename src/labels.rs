//! Label handling after inference.
//!
//! Two independent mappings: `TierTranslation` turns a raw label into display
//! text, `OutcomePolicy` decides whether the outcome is framed as an alert.
//! Neither depends on the other.

use crate::errors::{DashError, DashResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Display text for labels missing from the tier table
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Raw class label as returned by a classifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawLabel {
    Code(i64),
    Text(String),
}

impl RawLabel {
    /// Integers become codes, everything else stays text
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(code) => RawLabel::Code(code),
            Err(_) => RawLabel::Text(trimmed.to_string()),
        }
    }
}

impl fmt::Display for RawLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawLabel::Code(code) => write!(f, "{code}"),
            RawLabel::Text(text) => write!(f, "{text}"),
        }
    }
}

impl From<i64> for RawLabel {
    fn from(code: i64) -> Self {
        RawLabel::Code(code)
    }
}

impl From<&str> for RawLabel {
    fn from(text: &str) -> Self {
        RawLabel::Text(text.to_string())
    }
}

/// Raw label -> tier display name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TierTranslation {
    table: HashMap<RawLabel, String>,
}

impl TierTranslation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        Self::new()
            .with(1, "Tier 1")
            .with(2, "Tier 2")
            .with(3, "Tier 3")
    }

    /// Build from configuration, where keys are always strings
    pub fn from_config(entries: &BTreeMap<String, String>) -> DashResult<Self> {
        let mut translation = Self::new();
        for (raw, display) in entries {
            if raw.trim().is_empty() {
                return Err(DashError::config("tier labels cannot have an empty key"));
            }
            translation.table.insert(RawLabel::parse(raw), display.clone());
        }
        Ok(translation)
    }

    pub fn with(mut self, raw: impl Into<RawLabel>, display: impl Into<String>) -> Self {
        self.table.insert(raw.into(), display.into());
        self
    }

    pub fn translate(&self, raw: &RawLabel) -> String {
        self.table
            .get(raw)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
    }
}

/// Labels that frame the outcome negatively; everything else is positive
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutcomePolicy {
    alert_labels: HashSet<RawLabel>,
}

impl OutcomePolicy {
    pub fn new<I, L>(alert_labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<RawLabel>,
    {
        Self {
            alert_labels: alert_labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn standard() -> Self {
        Self::new(["LEAVE"])
    }

    pub fn from_config(alert_labels: &[String]) -> Self {
        Self::new(alert_labels.iter().map(|raw| RawLabel::parse(raw)))
    }

    pub fn is_positive(&self, raw: &RawLabel) -> bool {
        !self.alert_labels.contains(raw)
    }
}
