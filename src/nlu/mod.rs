//! Natural-language collaborators
//!
//! Intent classification, response phrasing and product ideas are delegated
//! to an external language model. The traits below are the only thing the
//! rest of the crate sees.

pub mod openrouter;

pub use openrouter::OpenRouterClient;

use crate::models::{ParsedIntent, RecipeDetails};
use crate::Result;

/// Maps user text to an intent. Implementations never fail: anything that
/// goes wrong degrades to [`ParsedIntent::unknown`].
#[async_trait::async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> ParsedIntent;
}

/// What the summarizer is asked to phrase.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryRequest {
    /// Inventory search results, one line per product.
    Inventory { results: Vec<String> },
    /// Store availability of a dish's ingredients, one line per ingredient.
    DishAvailability { dish: String, results: Vec<String> },
    /// Full recipe to present step by step.
    Recipe { details: RecipeDetails },
}

impl SummaryRequest {
    /// The verbatim text used when the summarizer is unavailable.
    pub fn raw_text(&self) -> String {
        match self {
            SummaryRequest::Inventory { results } => results.join("\n"),
            SummaryRequest::DishAvailability { dish, results } => {
                format!("Ingredients needed for {}:\n{}", dish, results.join("\n"))
            }
            SummaryRequest::Recipe { details } => {
                let mut text = format!("{}\n\nIngredients:", details.name);
                for ingredient in &details.ingredients {
                    text.push_str(&format!("\n  - {}", ingredient));
                }
                if !details.instructions.is_empty() {
                    text.push_str(&format!("\n\nInstructions:\n{}", details.instructions));
                }
                text
            }
        }
    }
}

#[async_trait::async_trait]
pub trait ResponseSummarizer: Send + Sync {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String>;
}

/// Product ideas for open-ended requests ("planning a movie night").
#[async_trait::async_trait]
pub trait ProductAdvisor: Send + Sync {
    async fn suggest_products(&self, query: &str) -> Result<Vec<String>>;
}
