//! Scenario records and tolerant loading of scenario collections.
//!
//! Upstream generation is noisy: a collection may arrive wrapped in a
//! `{"features": [...]}` envelope, as a bare array, or as a single object,
//! and any field may be missing or carry a non-string value. Loading never
//! drops an entry, so record identity stays positional.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::step::StepRole;
use crate::domain::errors::{DomainError, DomainResult};

/// One Given/When/Then behavior scenario as produced upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub then: Option<String>,
}

impl ScenarioRecord {
    pub fn new(
        given: impl Into<String>,
        when: impl Into<String>,
        then: impl Into<String>,
    ) -> Self {
        Self {
            given: Some(given.into()),
            when: Some(when.into()),
            then: Some(then.into()),
        }
    }

    /// Field text for a role, or `None` when absent, empty or whitespace-only.
    pub fn field(&self, role: StepRole) -> Option<&str> {
        let raw = match role {
            StepRole::Given => self.given.as_deref(),
            StepRole::When => self.when.as_deref(),
            StepRole::Then => self.then.as_deref(),
        };
        raw.map(str::trim).filter(|text| !text.is_empty())
    }

    /// Roles with usable text, in Given/When/Then order.
    pub fn present_roles(&self) -> Vec<StepRole> {
        StepRole::ALL
            .into_iter()
            .filter(|role| self.field(*role).is_some())
            .collect()
    }

    /// True when all three fields are unusable.
    pub fn is_blank(&self) -> bool {
        StepRole::ALL.iter().all(|role| self.field(*role).is_none())
    }

    /// Whole-scenario rendering used for scenario-level embeddings.
    pub fn render(&self) -> String {
        format!(
            "Given {} When {} Then {}",
            self.field(StepRole::Given).unwrap_or_default(),
            self.field(StepRole::When).unwrap_or_default(),
            self.field(StepRole::Then).unwrap_or_default(),
        )
    }

    /// The When and Then text joined, which is where outcome polarity lives.
    pub fn outcome_text(&self) -> String {
        format!(
            "{} {}",
            self.field(StepRole::When).unwrap_or_default(),
            self.field(StepRole::Then).unwrap_or_default(),
        )
    }

    /// Identity key for cross-result comparison.
    pub fn key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.given.as_deref().unwrap_or_default(),
            self.when.as_deref().unwrap_or_default(),
            self.then.as_deref().unwrap_or_default(),
        )
    }

    /// Build a record from an arbitrary JSON value.
    ///
    /// Non-object values yield an empty record. String fields are kept
    /// verbatim, `null` is treated as absent and any other value is kept
    /// as its JSON text.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };
        let read = |key: &str| match object.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => Some(other.to_string()),
        };
        Self {
            given: read("given"),
            when: read("when"),
            then: read("then"),
        }
    }
}

/// An ordered scenario collection; the index of each record is its identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSet {
    pub features: Vec<ScenarioRecord>,
}

impl ScenarioSet {
    pub fn new(features: Vec<ScenarioRecord>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn from_json_str(raw: &str) -> DomainResult<Self> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_json_value(&value)
    }

    /// Accepts a `{"features": [...]}` envelope, a bare array or a single
    /// scenario object.
    pub fn from_json_value(value: &Value) -> DomainResult<Self> {
        let features = match value {
            Value::Object(object) => match object.get("features") {
                Some(Value::Array(items)) => items.iter().map(ScenarioRecord::from_value).collect(),
                Some(other) => {
                    return Err(DomainError::InvalidInput(format!(
                        "`features` must be an array, found {}",
                        json_kind(other)
                    )))
                }
                None => vec![ScenarioRecord::from_value(value)],
            },
            Value::Array(items) => items.iter().map(ScenarioRecord::from_value).collect(),
            other => {
                return Err(DomainError::InvalidInput(format!(
                    "expected a scenario object or array, found {}",
                    json_kind(other)
                )))
            }
        };
        Ok(Self { features })
    }

    /// Indices of records that carry no usable field at all.
    pub fn blank_indices(&self) -> Vec<usize> {
        self.features
            .iter()
            .enumerate()
            .filter(|(_, record)| record.is_blank())
            .map(|(index, _)| index)
            .collect()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
