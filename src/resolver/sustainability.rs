//! Sustainable alternative lookup

use crate::catalog::Catalog;
use crate::models::SustainableAlternative;
use std::sync::Arc;

pub struct SustainabilitySuggester {
    catalog: Arc<Catalog>,
}

impl SustainabilitySuggester {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// First mapping whose original product contains `product_name`.
    pub fn suggest_alternative(&self, product_name: &str) -> Option<&SustainableAlternative> {
        let needle = product_name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        self.catalog
            .alternatives
            .iter()
            .find(|alt| alt.original_product.to_lowercase().contains(&needle))
    }
}
