//! The report record consumed by the renderer.
//!
//! A `ReportRecord` is produced by the prediction service and handed to the
//! renderer exactly once. Nothing in this crate mutates it. Every field other
//! than `reportId` may be absent; absent values are replaced with
//! [`PLACEHOLDER`] when drawn, never by the layout code.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Result;

/// Glyph drawn wherever a scalar field is missing.
pub const PLACEHOLDER: &str = "\u{2014}";

/// A fully populated (or partially populated) prediction report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    pub report_id: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub patient_age: Option<f64>,
    #[serde(default)]
    pub patient_gender: Option<String>,
    #[serde(default)]
    pub disease_type: Option<DiseaseType>,
    #[serde(default)]
    pub input_parameters: InputParameters,
    #[serde(default)]
    pub result: ResultSummary,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl ReportRecord {
    /// Decode a record from its JSON boundary representation.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn patient_name_display(&self) -> &str {
        non_blank(self.patient_name.as_deref())
    }

    pub fn patient_gender_display(&self) -> &str {
        non_blank(self.patient_gender.as_deref())
    }

    /// "58 yrs". Zero, negative and non-finite ages render the placeholder.
    pub fn patient_age_display(&self) -> String {
        match self.patient_age {
            Some(age) if age.is_finite() && age > 0.0 => format!("{} yrs", format_number(age)),
            _ => PLACEHOLDER.to_string(),
        }
    }

    /// "Heart Disease", or "— Disease" when the disease type is unknown.
    pub fn disease_display(&self) -> String {
        let name = self
            .disease_type
            .map(|d| d.as_str())
            .unwrap_or(PLACEHOLDER);
        format!("{} Disease", name)
    }

    pub fn report_id_display(&self) -> &str {
        non_blank(Some(self.report_id.as_str()))
    }
}

fn non_blank(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => PLACEHOLDER,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiseaseType {
    Heart,
    Liver,
    Parkinson,
}

impl DiseaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiseaseType::Heart => "Heart",
            DiseaseType::Liver => "Liver",
            DiseaseType::Parkinson => "Parkinson",
        }
    }
}

/// Binary model outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Positive,
    Negative,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Positive => "Positive",
            Outcome::Negative => "Negative",
        }
    }
}

/// Ordered risk classification.
///
/// Unknown labels are kept verbatim in `Other` so they can still be shown;
/// they resolve to the neutral palette color.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
    Other(String),
}

impl RiskLevel {
    /// The four known levels in ascending order.
    pub const ORDERED: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Moderate,
        RiskLevel::High,
        RiskLevel::VeryHigh,
    ];

    pub fn label(&self) -> &str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
            RiskLevel::VeryHigh => "Very High",
            RiskLevel::Other(s) => s.as_str(),
        }
    }

    /// Zero-based position on the gauge, `None` for unknown labels.
    pub fn index(&self) -> Option<usize> {
        match self {
            RiskLevel::Low => Some(0),
            RiskLevel::Moderate => Some(1),
            RiskLevel::High => Some(2),
            RiskLevel::VeryHigh => Some(3),
            RiskLevel::Other(_) => None,
        }
    }
}

impl From<&str> for RiskLevel {
    fn from(s: &str) -> Self {
        match s.trim() {
            "Low" => RiskLevel::Low,
            "Moderate" => RiskLevel::Moderate,
            "High" => RiskLevel::High,
            "Very High" | "VeryHigh" => RiskLevel::VeryHigh,
            other => RiskLevel::Other(other.to_string()),
        }
    }
}

impl From<String> for RiskLevel {
    fn from(s: String) -> Self {
        RiskLevel::from(s.as_str())
    }
}

impl From<RiskLevel> for String {
    fn from(level: RiskLevel) -> Self {
        level.label().to_string()
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The prediction block of a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    #[serde(default)]
    pub prediction: Option<Outcome>,
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
}

impl ResultSummary {
    pub fn is_positive(&self) -> bool {
        self.prediction == Some(Outcome::Positive)
    }

    pub fn outcome_label(&self) -> &'static str {
        self.prediction.map(|o| o.as_str()).unwrap_or(PLACEHOLDER)
    }

    pub fn risk_label(&self) -> &str {
        match &self.risk_level {
            Some(level) if !level.label().is_empty() => level.label(),
            _ => PLACEHOLDER,
        }
    }

    /// Probability as drawn: clamped to `[0, 100]`, with NaN and absent
    /// values drawn as `0`.
    pub fn display_probability(&self) -> f64 {
        match self.probability {
            Some(p) if p.is_nan() => 0.0,
            Some(p) => p.clamp(0.0, 100.0),
            None => 0.0,
        }
    }

    /// True when the raw probability had to be clamped for display.
    pub fn probability_out_of_range(&self) -> bool {
        matches!(self.probability, Some(p) if !(0.0..=100.0).contains(&p))
    }

    pub fn probability_label(&self) -> String {
        format!("{}% Confidence", format_number(self.display_probability()))
    }
}

/// Scalar value of a single input parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Null,
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Number(n) => f.write_str(&format_number(*n)),
            ParamValue::Text(s) if s.trim().is_empty() => f.write_str(PLACEHOLDER),
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Null => f.write_str(PLACEHOLDER),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(n: f64) -> Self {
        ParamValue::Number(n)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

/// Input parameters in the order the prediction service supplied them.
///
/// Decodes from a JSON object without reordering keys; a repeated key keeps
/// its first position and takes the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputParameters {
    entries: Vec<(String, ParamValue)>,
    positions: HashMap<String, usize>,
}

impl InputParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.positions.get(&key) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.positions.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.positions.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for InputParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = InputParameters::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl Serialize for InputParameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for InputParameters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = InputParameters;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of parameter names to scalar values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut params = InputParameters::new();
                while let Some((key, value)) = access.next_entry::<String, ParamValue>()? {
                    params.insert(key, value);
                }
                Ok(params)
            }

            fn visit_unit<E: serde::de::Error>(self) -> std::result::Result<Self::Value, E> {
                Ok(InputParameters::new())
            }
        }

        deserializer.deserialize_any(OrderedVisitor)
    }
}

/// Shortest round-trip rendering of a number: `63`, `82.5`, `0.125`.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        // avoid "-0"
        return "0".to_string();
    }
    format!("{}", n)
}

/// Turn a parameter key into a display label: a space goes before every
/// capital letter, underscores become spaces, and the result is trimmed.
pub fn humanize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push(' ');
            out.push(ch);
        } else if ch == '_' {
            out.push(' ');
        } else {
            out.push(ch);
        }
    }
    out.trim().to_string()
}
