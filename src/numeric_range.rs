use crate::errors::{DashError, DashResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Closed slider range for a numerical feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl NumericRange {
    /// Create a range, requiring finite bounds and `min <= default <= max`
    pub fn new(min: f64, max: f64, default: f64) -> DashResult<Self> {
        if !(min.is_finite() && max.is_finite() && default.is_finite()) {
            return Err(DashError::config("numeric range bounds must be finite"));
        }
        if min > max {
            return Err(DashError::config(format!(
                "numeric range min {min} exceeds max {max}"
            )));
        }
        if default < min || default > max {
            return Err(DashError::config(format!(
                "numeric range default {default} outside [{min}, {max}]"
            )));
        }
        Ok(Self { min, max, default })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Range override as written in configuration; `default` falls back to `min`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeOverride {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub default: Option<f64>,
}

impl RangeOverride {
    pub fn resolve(&self) -> DashResult<NumericRange> {
        NumericRange::new(self.min, self.max, self.default.unwrap_or(self.min))
    }
}

/// Feature name -> slider range, with a fallback for unrecognized names
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeTable {
    entries: BTreeMap<String, NumericRange>,
    fallback: NumericRange,
}

impl RangeTable {
    pub fn new(fallback: NumericRange) -> Self {
        Self {
            entries: BTreeMap::new(),
            fallback,
        }
    }

    /// The table the dashboard ships with.
    ///
    /// Unrecognized features are assumed to be calendar years (joining year),
    /// hence the 2010..=2030 fallback.
    pub fn standard() -> Self {
        let mut table = Self::new(NumericRange {
            min: 2010.0,
            max: 2030.0,
            default: 2010.0,
        });
        table.entries.insert(
            "AGE".to_string(),
            NumericRange {
                min: 20.0,
                max: 100.0,
                default: 20.0,
            },
        );
        table.entries.insert(
            "EXPERIENCEINCURRENTDOMAIN".to_string(),
            NumericRange {
                min: 0.0,
                max: 20.0,
                default: 0.0,
            },
        );
        table
    }

    /// Standard table with configured overrides applied on top
    pub fn with_overrides(overrides: &BTreeMap<String, RangeOverride>) -> DashResult<Self> {
        let mut table = Self::standard();
        for (name, entry) in overrides {
            let range = entry
                .resolve()
                .map_err(|e| DashError::config(format!("range for '{name}': {e}")))?;
            table.insert(name, range);
        }
        Ok(table)
    }

    pub fn insert(&mut self, name: impl Into<String>, range: NumericRange) {
        self.entries.insert(name.into(), range);
    }

    pub fn lookup(&self, name: &str) -> &NumericRange {
        self.entries.get(name).unwrap_or(&self.fallback)
    }
}

impl Default for RangeTable {
    fn default() -> Self {
        Self::standard()
    }
}
