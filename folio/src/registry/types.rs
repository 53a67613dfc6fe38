use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Definition of a single block type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDefinition {
    pub label: String,
    #[serde(default)]
    pub category: BlockCategory,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,
    #[serde(default)]
    pub schema: Vec<FieldSchema>,
}

impl BlockDefinition {
    pub fn field(&self, key: &str) -> Option<&FieldSchema> {
        self.schema.iter().find(|f| f.key == key)
    }
}

/// Where a block shows up in the library listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlockCategory {
    #[default]
    Structural,
    Widgets,
}

impl BlockCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockCategory::Structural => "structural",
            BlockCategory::Widgets => "widgets",
        }
    }
}

/// One editable field of a block type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSchema {
    pub key: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: InputKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    #[default]
    Text,
    Textarea,
}
