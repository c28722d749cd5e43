use crate::errors::{DashError, DashResult};
use crate::feature_spec::FeatureSpec;
use crate::record::{FeatureValue, InputRecord};
use serde::Serialize;

/// Column-ordered table handed to a classifier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabularRecord {
    columns: Vec<String>,
    rows: Vec<Vec<FeatureValue>>,
}

impl TabularRecord {
    /// Wrap one record as a single row, columns in declared feature order.
    ///
    /// Every declared feature must be present and nothing undeclared may be.
    pub fn single_row(spec: &FeatureSpec, record: &InputRecord) -> DashResult<Self> {
        if let Some(extra) = record.names().find(|name| !spec.contains(name)) {
            return Err(DashError::validation(extra, "not a declared feature"));
        }

        let mut columns = Vec::with_capacity(spec.len());
        let mut row = Vec::with_capacity(spec.len());
        for name in spec.column_order() {
            let value = record
                .get(name)
                .ok_or_else(|| DashError::validation(name, "missing from input record"))?;
            columns.push(name.to_string());
            row.push(value.clone());
        }

        Ok(Self {
            columns,
            rows: vec![row],
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value of `column` in row `row`
    pub fn value(&self, row: usize, column: &str) -> Option<&FeatureValue> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(index))
    }
}
