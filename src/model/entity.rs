use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

pub const NAME: &str = "name";
pub const TOTAL_SCORE: &str = "total_score";
pub const OVERALL_RANK: &str = "overall_rank";
pub const PERCENTILE: &str = "percentile";
pub const COUNTRY: &str = "country";
pub const REGION: &str = "region";
pub const HOSPITAL_TYPE: &str = "hospital_type";

pub const UNKNOWN: &str = "Unknown";

/// A typed view of one stored field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<T> {
    Valid(T),
    Missing,
    /// Present but unusable; holds the raw JSON text.
    Malformed(String),
}

impl<T: Copy> FieldValue<T> {
    pub fn valid(&self) -> Option<T> {
        match self {
            FieldValue::Valid(v) => Some(*v),
            _ => None,
        }
    }
}

/// One organization as persisted in the database file. The whole JSON object
/// is kept as-is, so key order and fields this tool does not own survive a
/// rewrite; typed values are read through accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationRecord {
    fields: Map<String, Value>,
}

impl OrganizationRecord {
    pub fn new(name: impl Into<String>, score: f64) -> Self {
        let mut record = Self::default();
        record.set(NAME, Value::String(name.into()));
        if let Some(n) = Number::from_f64(score) {
            record.set(TOTAL_SCORE, Value::Number(n));
        }
        record
    }

    /// Sets `key`, keeping its position when it already exists.
    pub fn set(&mut self, key: &str, value: Value) {
        self.fields.insert(key.to_string(), value);
    }

    pub fn name(&self) -> &str {
        self.fields.get(NAME).and_then(Value::as_str).unwrap_or("")
    }

    pub fn score(&self) -> FieldValue<f64> {
        match self.fields.get(TOTAL_SCORE) {
            None | Some(Value::Null) => FieldValue::Missing,
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) => FieldValue::Valid(v),
                None => FieldValue::Malformed(n.to_string()),
            },
            Some(other) => FieldValue::Malformed(other.to_string()),
        }
    }

    /// Score usable for ranking, if the record carries a finite number.
    pub fn finite_score(&self) -> Option<f64> {
        self.score().valid().filter(|v| v.is_finite())
    }

    /// Stored rank: a positive integer that fits in `u32`.
    pub fn rank(&self) -> FieldValue<u32> {
        match self.fields.get(OVERALL_RANK) {
            None | Some(Value::Null) => FieldValue::Missing,
            Some(Value::Number(n)) => match n.as_u64().and_then(|v| u32::try_from(v).ok()) {
                Some(v) if v >= 1 => FieldValue::Valid(v),
                _ => FieldValue::Malformed(n.to_string()),
            },
            Some(other) => FieldValue::Malformed(other.to_string()),
        }
    }

    /// Stored percentile as a number; range is not checked here.
    pub fn percentile(&self) -> FieldValue<f64> {
        match self.fields.get(PERCENTILE) {
            None | Some(Value::Null) => FieldValue::Missing,
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) => FieldValue::Valid(v),
                None => FieldValue::Malformed(n.to_string()),
            },
            Some(other) => FieldValue::Malformed(other.to_string()),
        }
    }

    pub fn set_position(&mut self, pos: RankedPosition) {
        self.set(OVERALL_RANK, Value::from(pos.rank));
        let pct = Number::from_f64(pos.percentile).map_or(Value::Null, Value::Number);
        self.set(PERCENTILE, pct);
    }

    pub fn country(&self) -> Option<&str> {
        self.text(COUNTRY)
    }

    pub fn region(&self) -> Option<&str> {
        self.text(REGION)
    }

    pub fn hospital_type(&self) -> Option<&str> {
        self.text(HOSPITAL_TYPE)
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntity {
    pub name: String,
    pub score: f64,
    pub rank: Option<u32>,
    pub percentile: Option<f64>,
}

impl ScoredEntity {
    pub fn new(name: impl Into<String>, score: f64) -> Self {
        Self {
            name: name.into(),
            score,
            rank: None,
            percentile: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedPosition {
    pub rank: u32,
    pub percentile: f64,
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/entity.rs"]
mod tests;
