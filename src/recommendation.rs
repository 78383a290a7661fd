//! Themed product suggestions

use crate::catalog::Catalog;
use crate::models::InventoryItem;
use crate::nlu::ProductAdvisor;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

pub const SUGGESTION_LIMIT: usize = 5;

/// Ordered theme → search terms table.
#[derive(Debug, Clone)]
pub struct ThemeTable {
    entries: Vec<(String, Vec<String>)>,
}

impl ThemeTable {
    pub fn new(entries: Vec<(String, Vec<String>)>) -> Self {
        Self { entries }
    }

    pub fn builtin() -> Self {
        let raw: &[(&str, &[&str])] = &[
            ("party", &["chips", "soda", "snacks", "dip", "nuts"]),
            ("birthday", &["cake", "candles", "balloons", "gift wrap", "card"]),
            ("italian", &["pasta", "tomato sauce", "olive oil", "parmesan", "basil"]),
            ("baking", &["flour", "sugar", "eggs", "butter", "chocolate chips"]),
            ("healthy", &["salad greens", "quinoa", "avocado", "tofu", "oats"]),
            ("breakfast", &["cereal", "oats", "milk", "coffee", "bread", "eggs"]),
            ("diwali", &["diya", "sweets", "lights", "lantern"]),
            ("eco-friendly", &["bamboo", "reusable", "cloth bag", "metal bottle"]),
        ];

        Self::new(
            raw.iter()
                .map(|(theme, terms)| {
                    (theme.to_string(), terms.iter().map(|t| t.to_string()).collect())
                })
                .collect(),
        )
    }

    /// Themes whose name or any term occurs in `lower`, with their terms.
    /// The reported theme is the last match, as the table is scanned in order.
    pub fn detect(&self, lower: &str) -> Option<(String, Vec<String>)> {
        let mut theme = None;
        let mut terms = Vec::new();

        for (name, keywords) in &self.entries {
            if lower.contains(name.as_str()) || keywords.iter().any(|k| lower.contains(k.as_str())) {
                terms.extend(keywords.iter().cloned());
                theme = Some(name.clone());
            }
        }

        theme.map(|theme| (theme, terms))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    /// `None` when the terms came from the product advisor.
    pub theme: Option<String>,
    pub items: Vec<InventoryItem>,
}

impl Recommendation {
    pub fn describe(&self) -> String {
        let mut text = match &self.theme {
            Some(theme) => format!("For your '{}' theme, I recommend:", theme),
            None => "Here are some ideas from our store:".to_string(),
        };
        for item in &self.items {
            text.push_str(&format!("\n  - {} (in {})", item.name, item.location));
        }
        text
    }
}

pub struct Recommender {
    catalog: Arc<Catalog>,
    themes: ThemeTable,
    advisor: Arc<dyn ProductAdvisor>,
}

impl Recommender {
    pub fn new(catalog: Arc<Catalog>, themes: ThemeTable, advisor: Arc<dyn ProductAdvisor>) -> Self {
        Self {
            catalog,
            themes,
            advisor,
        }
    }

    /// `None` when nothing in stock matches.
    pub async fn recommend(&self, query: &str) -> Option<Recommendation> {
        let lower = query.trim().to_lowercase();

        let (theme, terms) = match self.themes.detect(&lower) {
            Some((theme, terms)) => (Some(theme), terms),
            None => {
                debug!(query = %query, "No theme detected, asking for product ideas");
                let ideas = match self.advisor.suggest_products(&lower).await {
                    Ok(ideas) => ideas,
                    Err(e) => {
                        warn!("Product advisor failed, no suggestions: {}", e);
                        Vec::new()
                    }
                };
                (None, ideas)
            }
        };

        let items = self.in_stock_matches(&terms);
        if items.is_empty() {
            return None;
        }
        Some(Recommendation { theme, items })
    }

    fn in_stock_matches(&self, terms: &[String]) -> Vec<InventoryItem> {
        let mut seen_terms = HashSet::new();
        let mut seen_names = HashSet::new();
        let mut items = Vec::new();

        for term in terms {
            let term = term.trim().to_lowercase();
            if term.is_empty() || !seen_terms.insert(term.clone()) {
                continue;
            }

            for item in &self.catalog.inventory {
                if items.len() >= SUGGESTION_LIMIT {
                    return items;
                }
                if item.is_available()
                    && item.name.to_lowercase().contains(&term)
                    && seen_names.insert(item.name.clone())
                {
                    items.push(item.clone());
                }
            }
        }

        items
    }
}
