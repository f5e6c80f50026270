use std::path::PathBuf;

use serde_json::{Map, Value};
use thiserror::Error;

pub mod store;

use crate::model::entity::{FieldValue, OrganizationRecord, ScoredEntity};
use crate::pipeline::rank::{RankError, rank_positions, score_groups};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("organization record {index} is malformed: {source}")]
    Record {
        index: usize,
        source: serde_json::Error,
    },
    #[error("unsupported database shape: {0}")]
    UnsupportedShape(String),
    #[error("backup not found: {0}")]
    MissingBackup(PathBuf),
    #[error(transparent)]
    Rank(#[from] RankError),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> StoreError {
        let path = path.into();
        move |source| StoreError::Io { path, source }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseShape {
    /// A bare JSON array of records.
    Bare,
    /// An object holding an `organizations` array. The whole object is kept
    /// so sibling keys (`metadata` and anything else) keep their order.
    Wrapped { document: Map<String, Value> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    pub organizations: Vec<OrganizationRecord>,
    pub shape: DatabaseShape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingOutcome {
    pub population: usize,
    pub distinct_scores: usize,
}

impl Database {
    pub fn bare(organizations: Vec<OrganizationRecord>) -> Self {
        Self {
            organizations,
            shape: DatabaseShape::Bare,
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, StoreError> {
        match serde_json::from_str::<Value>(text)? {
            Value::Array(items) => Ok(Self::bare(parse_records(items)?)),
            Value::Object(mut document) => {
                let items = match document.get_mut("organizations").map(Value::take) {
                    Some(Value::Array(items)) => items,
                    Some(other) => {
                        return Err(StoreError::UnsupportedShape(format!(
                            "`organizations` is {}, expected an array",
                            kind_of(&other)
                        )));
                    }
                    None => {
                        return Err(StoreError::UnsupportedShape(
                            "object without an `organizations` array".to_string(),
                        ));
                    }
                };
                Ok(Self {
                    organizations: parse_records(items)?,
                    shape: DatabaseShape::Wrapped { document },
                })
            }
            other => Err(StoreError::UnsupportedShape(format!(
                "top-level {}",
                kind_of(&other)
            ))),
        }
    }

    pub fn to_value(&self) -> Result<Value, StoreError> {
        let organizations = serde_json::to_value(&self.organizations)?;
        Ok(match &self.shape {
            DatabaseShape::Bare => organizations,
            DatabaseShape::Wrapped { document } => {
                let mut document = document.clone();
                document.insert("organizations".to_string(), organizations);
                Value::Object(document)
            }
        })
    }

    pub fn to_json_string(&self) -> Result<String, StoreError> {
        let mut text = serde_json::to_string_pretty(&self.to_value()?)?;
        text.push('\n');
        Ok(text)
    }

    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        match &self.shape {
            DatabaseShape::Wrapped { document } => document.get("metadata")?.as_object(),
            DatabaseShape::Bare => None,
        }
    }

    /// Entities for ranking. A missing or non-numeric score rejects the
    /// whole batch.
    pub fn scored_entities(&self) -> Result<Vec<ScoredEntity>, RankError> {
        self.organizations
            .iter()
            .enumerate()
            .map(|(index, record)| scored_entity(index, record))
            .collect()
    }

    /// Ranks every record and stores `overall_rank` and `percentile` on it.
    /// Nothing is modified when the batch is rejected.
    pub fn apply_ranking(&mut self) -> Result<RankingOutcome, RankError> {
        let entities = self.scored_entities()?;
        let positions = rank_positions(&entities)?;
        for (record, pos) in self.organizations.iter_mut().zip(positions) {
            record.set_position(pos);
        }

        let population = self.organizations.len();
        if let DatabaseShape::Wrapped { document } = &mut self.shape {
            if let Some(Value::Object(meta)) = document.get_mut("metadata") {
                meta.insert("total_organizations".to_string(), Value::from(population));
            }
        }

        let distinct_scores = score_groups(&entities, |e| Some(e.score)).len();
        tracing::info!(population, distinct_scores, "ranking applied");
        Ok(RankingOutcome {
            population,
            distinct_scores,
        })
    }
}

/// The ranking view of one stored record; `index` locates it in error reports.
pub fn scored_entity(index: usize, record: &OrganizationRecord) -> Result<ScoredEntity, RankError> {
    let name = record.name().to_string();
    match record.score() {
        FieldValue::Valid(score) => Ok(ScoredEntity::new(name, score)),
        FieldValue::Missing => Err(RankError::MissingScore { index, name }),
        FieldValue::Malformed(value) => Err(RankError::NonNumericScore { index, name, value }),
    }
}

fn parse_records(items: Vec<Value>) -> Result<Vec<OrganizationRecord>, StoreError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|source| StoreError::Record { index, source })
        })
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
