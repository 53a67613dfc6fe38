mod types;

pub use types::{BlockCategory, BlockDefinition, FieldSchema, InputKind};

use crate::error::{FolioError, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// File name of an optional registry override inside a data directory.
pub const REGISTRY_FILE: &str = "blocks.yaml";

const BUILTIN_YAML: &str = r#"
hero:
  label: Hero
  category: structural
  icon: fa-heading
  defaults:
    subtitle: New block
    title: Main<br>Title
    desc: Block description...
    bgImage: https://images.unsplash.com/photo-1464822759023-fed622ff2c3b?q=80&w=3870&auto=format&fit=crop
  schema:
    - { key: subtitle, label: Subtitle, type: text }
    - { key: title, label: Title, type: textarea }
    - { key: desc, label: Description, type: textarea }
    - { key: bgImage, label: Background URL, type: text }

section:
  label: Section
  category: structural
  icon: fa-table-columns
  defaults:
    title: Section title
    subtitle: Section subtitle
    body: Section body...
  schema:
    - { key: title, label: Title, type: text }
    - { key: subtitle, label: Subtitle, type: text }
    - { key: body, label: Body, type: textarea }

cta:
  label: Call to action
  category: structural
  icon: fa-bullhorn
  defaults:
    title: Let's talk
    body: Get in touch with our team.
    buttonLabel: Contact
    buttonUrl: /contact.html
  schema:
    - { key: title, label: Title, type: text }
    - { key: body, label: Body, type: textarea }
    - { key: buttonLabel, label: Button label, type: text }
    - { key: buttonUrl, label: Button URL, type: text }

metric:
  label: Metric
  category: widgets
  icon: fa-chart-line
  defaults:
    value: "—"
    label: New metric
    icon: fa-bolt
    accent: gold
  schema:
    - { key: value, label: Value, type: text }
    - { key: label, label: Label, type: text }
    - { key: icon, label: Icon (FA), type: text }
    - { key: accent, label: Accent (gold/green/blue/purple/red), type: text }
"#;

/// Static catalog mapping block type to defaults and editable-field schema.
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    blocks: BTreeMap<String, BlockDefinition>,
}

impl BlockRegistry {
    /// The catalog shipped with the console.
    pub fn builtin() -> Self {
        // Embedded catalog, checked by test_builtin_parses.
        Self::from_yaml_str(BUILTIN_YAML).expect("built-in block registry must parse")
    }

    /// Parse a registry from YAML (`type -> definition` mapping).
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let blocks: BTreeMap<String, BlockDefinition> = serde_yaml::from_str(content)?;
        for (name, def) in &blocks {
            for key in def.defaults.keys() {
                if def.field(key).is_none() {
                    log::debug!("Block '{name}' has a default for undeclared field '{key}'");
                }
            }
            let mut seen = std::collections::HashSet::new();
            for field in &def.schema {
                if !seen.insert(field.key.as_str()) {
                    return Err(FolioError::Registry(format!(
                        "Block '{name}' declares field '{}' twice",
                        field.key
                    )));
                }
            }
        }
        Ok(BlockRegistry { blocks })
    }

    /// Load `blocks.yaml` from a data directory, falling back to the built-in catalog.
    pub fn load_or_builtin(dir: &Path) -> Result<Self> {
        let path = dir.join(REGISTRY_FILE);
        if !path.exists() {
            return Ok(Self::builtin());
        }
        let content = std::fs::read_to_string(&path)?;
        Self::from_yaml_str(&content)
    }

    pub fn get(&self, block_type: &str) -> Option<&BlockDefinition> {
        self.blocks.get(block_type)
    }

    pub fn contains(&self, block_type: &str) -> bool {
        self.blocks.contains_key(block_type)
    }

    /// Default props seeded into a freshly inserted block.
    pub fn defaults_for(&self, block_type: &str) -> Option<BTreeMap<String, String>> {
        self.blocks.get(block_type).map(|def| def.defaults.clone())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BlockDefinition)> {
        self.blocks.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Block types grouped by category, alphabetical within each group.
    pub fn by_category(&self) -> BTreeMap<BlockCategory, Vec<(&str, &BlockDefinition)>> {
        let mut grouped: BTreeMap<BlockCategory, Vec<(&str, &BlockDefinition)>> = BTreeMap::new();
        for (name, def) in self.iter() {
            grouped.entry(def.category).or_default().push((name, def));
        }
        grouped
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
