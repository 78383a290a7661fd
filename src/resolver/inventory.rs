//! Inventory resolver
//!
//! exact name → name substring → fuzzy name → category suggestion → not found.
//! Each matching stage is a [`MatchStrategy`]; the first stage with any hit
//! decides the outcome.

use crate::catalog::Catalog;
use crate::category::{in_stock_items, CategoryClassifier};
use crate::models::{Availability, Candidate, CandidatePayload, InventoryItem};
use crate::responses;
use std::sync::Arc;
use tracing::debug;

pub const MAX_CANDIDATES: usize = 5;
pub const FUZZY_CUTOFF: f64 = 0.6;
/// Candidates the non-interactive search considers when auto-picking.
pub const QUICK_PICK_WINDOW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStage {
    Exact,
    Substring,
    Fuzzy,
}

/// One stage of the name-matching chain. Returns row indices, best first.
pub trait MatchStrategy: Send + Sync {
    fn stage(&self) -> MatchStage;
    fn find(&self, query: &str, items: &[InventoryItem]) -> Vec<usize>;
}

/// Case-insensitive name equality; first row only.
pub struct ExactName;

impl MatchStrategy for ExactName {
    fn stage(&self) -> MatchStage {
        MatchStage::Exact
    }

    fn find(&self, query: &str, items: &[InventoryItem]) -> Vec<usize> {
        items
            .iter()
            .position(|item| item.name.to_lowercase() == query)
            .into_iter()
            .collect()
    }
}

/// Query contained in the name, dataset order, capped.
pub struct NameContains;

impl MatchStrategy for NameContains {
    fn stage(&self) -> MatchStage {
        MatchStage::Substring
    }

    fn find(&self, query: &str, items: &[InventoryItem]) -> Vec<usize> {
        items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.name.to_lowercase().contains(query))
            .map(|(index, _)| index)
            .take(MAX_CANDIDATES)
            .collect()
    }
}

/// Normalized Levenshtein similarity at or above `cutoff`, best first.
pub struct FuzzyName {
    pub cutoff: f64,
}

impl Default for FuzzyName {
    fn default() -> Self {
        Self {
            cutoff: FUZZY_CUTOFF,
        }
    }
}

impl MatchStrategy for FuzzyName {
    fn stage(&self) -> MatchStage {
        MatchStage::Fuzzy
    }

    fn find(&self, query: &str, items: &[InventoryItem]) -> Vec<usize> {
        let mut scored: Vec<(usize, f64)> = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                (
                    index,
                    strsim::normalized_levenshtein(query, &item.name.to_lowercase()),
                )
            })
            .filter(|(_, score)| *score >= self.cutoff)
            .collect();

        // stable sort: equal scores stay in dataset order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        scored
            .into_iter()
            .take(MAX_CANDIDATES)
            .map(|(index, _)| index)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolverOutcome {
    Unique {
        index: usize,
        item: InventoryItem,
        availability: Availability,
        stage: MatchStage,
    },
    Ambiguous {
        stage: MatchStage,
        candidates: Vec<Candidate>,
    },
    CategoryFallback {
        category: String,
        items: Vec<InventoryItem>,
    },
    NotFound,
}

impl ResolverOutcome {
    /// User-facing line for every outcome that needs no follow-up question.
    pub fn summary_line(&self, query: &str) -> Option<String> {
        match self {
            ResolverOutcome::Unique {
                item,
                stage: MatchStage::Exact,
                ..
            } => Some(responses::exact_match(item)),
            ResolverOutcome::Unique { item, .. } => Some(responses::single_suggestion(item)),
            ResolverOutcome::CategoryFallback { category, items } => {
                Some(responses::category_fallback(query, category, items))
            }
            ResolverOutcome::NotFound => Some(responses::not_found(query)),
            ResolverOutcome::Ambiguous { .. } => None,
        }
    }
}

/// Result of the non-interactive search used for batch ingredient checks.
#[derive(Debug, Clone, PartialEq)]
pub enum QuickOutcome {
    Available(InventoryItem),
    OutOfStock(InventoryItem),
    AllOutOfStock,
    Suggestions {
        category: String,
        items: Vec<InventoryItem>,
    },
    NotFound,
}

impl QuickOutcome {
    pub fn is_available(&self) -> bool {
        matches!(self, QuickOutcome::Available(_))
    }

    pub fn describe(&self, query: &str) -> String {
        match self {
            QuickOutcome::Available(item) => format!(
                "available in aisle {} ({} units, {}g)",
                item.location, item.available_quantity, item.weight_grams
            ),
            QuickOutcome::OutOfStock(item) => format!("{} is out of stock", item.name),
            QuickOutcome::AllOutOfStock => responses::all_out_of_stock(query),
            QuickOutcome::Suggestions { category, items } => {
                responses::category_fallback(query, category, items)
            }
            QuickOutcome::NotFound => "not found in our store".to_string(),
        }
    }
}

pub struct InventoryResolver {
    catalog: Arc<Catalog>,
    categories: Arc<CategoryClassifier>,
    strategies: Vec<Box<dyn MatchStrategy>>,
}

impl InventoryResolver {
    pub fn new(catalog: Arc<Catalog>, categories: Arc<CategoryClassifier>) -> Self {
        Self::with_strategies(
            catalog,
            categories,
            vec![
                Box::new(ExactName),
                Box::new(NameContains),
                Box::new(FuzzyName::default()),
            ],
        )
    }

    pub fn with_strategies(
        catalog: Arc<Catalog>,
        categories: Arc<CategoryClassifier>,
        strategies: Vec<Box<dyn MatchStrategy>>,
    ) -> Self {
        Self {
            catalog,
            categories,
            strategies,
        }
    }

    pub fn item(&self, index: usize) -> Option<&InventoryItem> {
        self.catalog.inventory.get(index)
    }

    pub fn resolve_inventory(&self, query: &str) -> ResolverOutcome {
        let lower = query.trim().to_lowercase();
        if lower.is_empty() {
            return ResolverOutcome::NotFound;
        }

        let items = &self.catalog.inventory;

        for strategy in &self.strategies {
            let hits = strategy.find(&lower, items);
            if hits.is_empty() {
                continue;
            }

            let stage = strategy.stage();
            debug!(query = %query, ?stage, hits = hits.len(), "Inventory match");

            if hits.len() == 1 {
                let item = items[hits[0]].clone();
                return ResolverOutcome::Unique {
                    index: hits[0],
                    availability: item.availability(),
                    item,
                    stage,
                };
            }

            let candidates = hits
                .into_iter()
                .enumerate()
                .map(|(rank, index)| Candidate {
                    label: responses::inventory_candidate_label(&items[index]),
                    payload: CandidatePayload::Inventory(index),
                    rank,
                })
                .collect();

            return ResolverOutcome::Ambiguous { stage, candidates };
        }

        if let Some(category) = self.categories.classify_category(&lower) {
            let suggestions = in_stock_items(&self.catalog, category, MAX_CANDIDATES);
            if !suggestions.is_empty() {
                debug!(query = %query, category, "Inventory category fallback");
                return ResolverOutcome::CategoryFallback {
                    category: category.to_string(),
                    items: suggestions,
                };
            }
        }

        ResolverOutcome::NotFound
    }

    /// Same chain, but ambiguity is settled by taking the first available
    /// candidate among the top few instead of asking.
    pub fn search_inventory_quick(&self, query: &str) -> QuickOutcome {
        match self.resolve_inventory(query) {
            ResolverOutcome::Unique { item, availability, .. } => {
                if availability.is_available() {
                    QuickOutcome::Available(item)
                } else {
                    QuickOutcome::OutOfStock(item)
                }
            }
            ResolverOutcome::Ambiguous { candidates, .. } => candidates
                .iter()
                .take(QUICK_PICK_WINDOW)
                .filter_map(|candidate| match candidate.payload {
                    CandidatePayload::Inventory(index) => self.item(index),
                    _ => None,
                })
                .find(|item| item.is_available())
                .map(|item| QuickOutcome::Available(item.clone()))
                .unwrap_or(QuickOutcome::AllOutOfStock),
            ResolverOutcome::CategoryFallback { category, items } => {
                QuickOutcome::Suggestions { category, items }
            }
            ResolverOutcome::NotFound => QuickOutcome::NotFound,
        }
    }
}
