//! Read-only dataset tables
//!
//! Loaded once at process start and shared by every session through an `Arc`.
//! A table that cannot be loaded is replaced by an empty one so resolvers
//! answer "not found" instead of failing.

use crate::error::AssistantError;
use crate::models::{InventoryItem, RecipeRecord, SustainableAlternative};
use crate::Result;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{info, warn};

pub const INVENTORY_FILE: &str = "inventory.json";
pub const SUSTAINABLE_FILE: &str = "sustainable.json";
pub const RECIPES_FILE: &str = "recipes.json";

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub inventory: Vec<InventoryItem>,
    pub alternatives: Vec<SustainableAlternative>,
    pub recipes: Vec<RecipeRecord>,
}

impl Catalog {
    pub fn new(
        inventory: Vec<InventoryItem>,
        alternatives: Vec<SustainableAlternative>,
        recipes: Vec<RecipeRecord>,
    ) -> Self {
        Self {
            inventory,
            alternatives,
            recipes,
        }
    }

    /// Load every table from `dir`, degrading each missing table to empty.
    pub fn load_from_dir(dir: &Path) -> Self {
        let catalog = Self {
            inventory: load_or_empty(&dir.join(INVENTORY_FILE)),
            alternatives: load_or_empty(&dir.join(SUSTAINABLE_FILE)),
            recipes: load_or_empty(&dir.join(RECIPES_FILE)),
        };

        info!(
            inventory = catalog.inventory.len(),
            alternatives = catalog.alternatives.len(),
            recipes = catalog.recipes.len(),
            "Catalog loaded"
        );

        catalog
    }

    /// Distinct inventory categories in first-seen order, with item counts.
    pub fn categories(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for item in &self.inventory {
            let category = item.category.trim();
            if category.is_empty() {
                continue;
            }
            match counts.iter_mut().find(|(name, _)| name == category) {
                Some((_, count)) => *count += 1,
                None => counts.push((category.to_string(), 1)),
            }
        }
        counts
    }
}

fn load_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        AssistantError::DatasetUnavailable(format!("{}: {}", path.display(), e))
    })?;
    let rows = serde_json::from_str(&raw)?;
    Ok(rows)
}

fn load_or_empty<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    match load_table(path) {
        Ok(rows) => rows,
        Err(error) => {
            warn!("Dataset unavailable, continuing with an empty table: {}", error);
            Vec::new()
        }
    }
}
