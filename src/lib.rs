//! SAM AI shopping assistant
//!
//! A conversational resolution engine that:
//! - Answers small talk from fixed pattern tables before calling any model
//! - Resolves products through exact → substring → fuzzy → category fallback
//! - Finds recipes and dish ingredients locally first, then online
//! - Suspends a turn on ambiguous matches and resumes on the user's choice
//! - Keeps every session's pending question isolated from the others
//!
//! TURN LOOP:
//! EXIT? → PENDING QUESTION? → FAST PATH → CLASSIFY → RESOLVE → AGGREGATE

pub mod agent;
pub mod aggregator;
pub mod api;
pub mod catalog;
pub mod category;
pub mod config;
pub mod disambiguation;
pub mod error;
pub mod fast_path;
pub mod mealdb;
pub mod models;
pub mod nlu;
pub mod recommendation;
pub mod resolver;
pub mod responses;
pub mod state;

pub use error::{AssistantError, Result};

// Re-export common types
pub use agent::{Collaborators, Orchestrator, TurnOutcome};
pub use catalog::Catalog;
pub use config::AssistantConfig;
pub use models::*;
