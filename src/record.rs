use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Scalar value of a single feature
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Text(String),
    Number(f64),
}

impl FeatureValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FeatureValue::Text(s) => Some(s),
            FeatureValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(n) => Some(*n),
            FeatureValue::Text(_) => None,
        }
    }
}

/// Whole numbers print without a fractional part, matching integer sliders
pub fn format_number(n: f64) -> String {
    if is_whole(n) {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn is_whole(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Text(s) => write!(f, "{s}"),
            FeatureValue::Number(n) => write!(f, "{}", format_number(*n)),
        }
    }
}

impl Serialize for FeatureValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FeatureValue::Text(s) => serializer.serialize_str(s),
            FeatureValue::Number(n) if is_whole(*n) => serializer.serialize_i64(*n as i64),
            FeatureValue::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Text(value.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(value: String) -> Self {
        FeatureValue::Text(value)
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Number(value)
    }
}

/// One assembled row of feature values, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputRecord {
    fields: Vec<(String, FeatureValue)>,
}

impl InputRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field; an existing field keeps its position
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FeatureValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for InputRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_in_insertion_order_with_integral_numbers() {
        let mut record = InputRecord::new();
        record.insert("GENDER", "M");
        record.insert("AGE", 20.0);
        record.insert("SCORE", 0.5);

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"GENDER":"M","AGE":20,"SCORE":0.5}"#);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut record = InputRecord::new();
        record.insert("GENDER", "M");
        record.insert("AGE", 20.0);
        record.insert("GENDER", "F");

        assert_eq!(record.names().collect::<Vec<_>>(), vec!["GENDER", "AGE"]);
        assert_eq!(record.get("GENDER"), Some(&FeatureValue::from("F")));
    }

    #[test]
    fn display_formats_whole_numbers_without_fraction() {
        assert_eq!(FeatureValue::Number(2015.0).to_string(), "2015");
        assert_eq!(FeatureValue::Number(2.25).to_string(), "2.25");
        assert_eq!(format_number(-3.0), "-3");
    }

    #[test]
    fn deserializes_untagged_values() {
        let values: Vec<FeatureValue> = serde_json::from_str(r#"["Pune", 3, 1.5]"#).unwrap();
        assert_eq!(
            values,
            vec![
                FeatureValue::from("Pune"),
                FeatureValue::Number(3.0),
                FeatureValue::Number(1.5)
            ]
        );
    }
}
