//! Operation spec: ordered stages of operations
//!
//! JSON object key order is execution order, so the spec is read with a
//! map visitor rather than into a hash map. The terminal stage always runs
//! last wherever it appears in the object.

use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::operations::Operation;

use super::errors::SpecError;

/// Default key of the terminal stage
pub const DEFAULT_TERMINAL_KEY: &str = "last";

/// One stage: a key and the operations run in it
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub key: String,
    pub operations: Vec<Operation>,
    /// Narration shown while the stage is presented
    pub caption: Option<String>,
}

impl Stage {
    pub fn new(key: impl Into<String>, operations: Vec<Operation>) -> Self {
        Self {
            key: key.into(),
            operations,
            caption: None,
        }
    }
}

/// Ordered stage list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationSpec {
    stages: Vec<Stage>,
}

impl OperationSpec {
    /// Build from stages in order, moving the default terminal stage last
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }.with_terminal_key(DEFAULT_TERMINAL_KEY)
    }

    /// Parse JSON text. `terminal_key` names the stage to run last.
    pub fn from_json_str(text: &str, terminal_key: &str) -> Result<Self, SpecError> {
        let raw: RawStages = serde_json::from_str(text)?;
        Self::from_raw(raw, terminal_key)
    }

    fn from_raw(raw: RawStages, terminal_key: &str) -> Result<Self, SpecError> {
        let mut stages: Vec<Stage> = Vec::with_capacity(raw.0.len());
        for (key, ops) in raw.0 {
            let list = match ops {
                Value::Array(items) => items,
                _ => return Err(SpecError::StageNotAList(key)),
            };
            let operations = list
                .into_iter()
                .map(Operation::from_value)
                .collect::<Result<Vec<_>, _>>()?;

            // a repeated key replaces the earlier list in place
            match stages.iter_mut().find(|s| s.key == key) {
                Some(stage) => stage.operations = operations,
                None => stages.push(Stage::new(key, operations)),
            }
        }

        Ok(Self { stages }.with_terminal_key(terminal_key))
    }

    /// Move the stage named `terminal_key` to the end
    pub fn with_terminal_key(mut self, terminal_key: &str) -> Self {
        if let Some(pos) = self.stages.iter().position(|s| s.key == terminal_key) {
            let terminal = self.stages.remove(pos);
            self.stages.push(terminal);
        }
        self
    }

    /// Attach captions by stage key. Unknown keys are ignored.
    pub fn with_captions<'a>(mut self, captions: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        for (key, caption) in captions {
            if let Some(stage) = self.stages.iter_mut().find(|s| s.key == key) {
                stage.caption = Some(caption.to_string());
            }
        }
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage keys in execution order
    pub fn keys(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.key.as_str()).collect()
    }

    /// Operations whose kind was not recognized, as `(stage, name)`
    pub fn unsupported(&self) -> Vec<(&str, &str)> {
        self.stages
            .iter()
            .flat_map(|s| {
                s.operations
                    .iter()
                    .filter(|op| !op.is_supported())
                    .map(move |op| (s.key.as_str(), op.name()))
            })
            .collect()
    }
}

/// Stage entries in source order, operations not yet decoded
struct RawStages(Vec<(String, Value)>);

struct RawStagesVisitor;

impl<'de> Visitor<'de> for RawStagesVisitor {
    type Value = RawStages;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object mapping stage keys to operation lists")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Self::Value, M::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry::<String, Value>()? {
            entries.push(entry);
        }
        Ok(RawStages(entries))
    }
}

impl<'de> Deserialize<'de> for RawStages {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RawStagesVisitor)
    }
}

impl<'de> Deserialize<'de> for OperationSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawStages::deserialize(deserializer)?;
        OperationSpec::from_raw(raw, DEFAULT_TERMINAL_KEY).map_err(de::Error::custom)
    }
}

impl Serialize for OperationSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.stages.len()))?;
        for stage in &self.stages {
            map.serialize_entry(&stage.key, &stage.operations)?;
        }
        map.end()
    }
}
