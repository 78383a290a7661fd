//! Resolvers: free text → dataset entries via fallback chains

pub mod ingredients;
pub mod inventory;
pub mod recipe;
pub mod sustainability;

pub use ingredients::{clean_ingredient_name, parse_ingredient_list};
pub use inventory::{InventoryResolver, MatchStage, QuickOutcome, ResolverOutcome};
pub use recipe::{RecipeMatches, RecipeResolver};
pub use sustainability::SustainabilitySuggester;
