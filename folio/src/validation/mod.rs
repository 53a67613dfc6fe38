use crate::error::{FolioError, Result};
use crate::model::{Block, SiteState};
use crate::registry::BlockRegistry;
use std::collections::HashMap;

/// Result of validating a block or a whole site
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Validate a block against the registry.
/// Only a missing `id` or `type` is an error; everything else is a soft warning.
pub fn validate_block(registry: &BlockRegistry, block: &Block) -> ValidationResult {
    let mut result = ValidationResult::default();

    if block.id.trim().is_empty() {
        result.errors.push("Block is missing an 'id'".into());
    }
    if block.block_type.trim().is_empty() {
        result.errors.push("Block is missing a 'type'".into());
        return result;
    }

    match registry.get(&block.block_type) {
        None => result.warnings.push(format!(
            "Block '{}' has unknown type '{}' (rendered with the generic template)",
            block.id, block.block_type
        )),
        Some(_) if block.props.is_empty() => result.warnings.push(format!(
            "Block '{}' has no props",
            block.id
        )),
        Some(def) => {
            for key in block.props.keys() {
                if def.field(key).is_none() {
                    result.warnings.push(format!(
                        "Block '{}' has prop '{key}' not declared by type '{}'",
                        block.id, block.block_type
                    ));
                }
            }
        }
    }

    result
}

/// Warn about `imageId`/`docId` values that no longer resolve.
pub fn check_references(state: &SiteState, block: &Block, result: &mut ValidationResult) {
    if let Some(id) = &block.image_id {
        if state.media(id).is_none() {
            result
                .warnings
                .push(format!("Block '{}' references missing media '{id}'", block.id));
        }
    }
    if let Some(id) = &block.doc_id {
        if state.doc(id).is_none() {
            result
                .warnings
                .push(format!("Block '{}' references missing document '{id}'", block.id));
        }
    }
}

/// Validate the whole site: unique slugs, blocks owned by exactly one page,
/// per-block schema checks and reference resolution.
pub fn validate_site(registry: &BlockRegistry, state: &SiteState) -> ValidationResult {
    let mut result = ValidationResult::default();

    let mut slugs: HashMap<&str, &str> = HashMap::new();
    let mut owners: HashMap<&str, &str> = HashMap::new();

    for page in &state.pages {
        if let Some(other) = slugs.insert(page.slug.as_str(), page.id.as_str()) {
            result.errors.push(format!(
                "Slug '{}' is used by both '{other}' and '{}'",
                page.slug, page.id
            ));
        }

        for block in &page.layout {
            if let Some(other) = owners.insert(block.id.as_str(), page.id.as_str()) {
                result.errors.push(format!(
                    "Block '{}' appears in both '{other}' and '{}'",
                    block.id, page.id
                ));
            }

            let block_result = validate_block(registry, block);
            result.errors.extend(block_result.errors);
            result.warnings.extend(block_result.warnings);
            check_references(state, block, &mut result);
        }
    }

    result
}

/// Soft gate used before committing a draft: errors reject, warnings are returned.
pub fn validate_and_prepare(registry: &BlockRegistry, block: &Block) -> Result<Vec<String>> {
    let result = validate_block(registry, block);

    if !result.is_ok() {
        return Err(FolioError::Validation(format!(
            "Block validation failed:\n  - {}",
            result.errors.join("\n  - ")
        )));
    }

    for warning in &result.warnings {
        log::warn!("{warning}");
    }
    Ok(result.warnings)
}
