//! Core data models for the shopping assistant

use serde::{Deserialize, Serialize};
use std::fmt;

//
// ================= Datasets =================
//

/// One inventory row. Names are not unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryItem {
    pub name: String,
    #[serde(default)]
    pub category: String,
    /// Aisle code, e.g. `1-a`
    pub location: String,
    #[serde(rename = "availableQuantity")]
    pub available_quantity: u32,
    #[serde(rename = "weightInGms")]
    pub weight_grams: f64,
    #[serde(rename = "outOfStock")]
    pub out_of_stock: bool,
}

impl InventoryItem {
    pub fn availability(&self) -> Availability {
        if self.out_of_stock || self.available_quantity == 0 {
            Availability::OutOfStock
        } else {
            Availability::InStock {
                location: self.location.clone(),
                quantity: self.available_quantity,
                weight_grams: self.weight_grams,
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.availability().is_available()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Availability {
    InStock {
        location: String,
        quantity: u32,
        weight_grams: f64,
    },
    OutOfStock,
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::InStock { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SustainableAlternative {
    #[serde(rename = "Original Product")]
    pub original_product: String,
    #[serde(rename = "Sustainable Alternative")]
    pub alternative_name: String,
    #[serde(rename = "Aisle Number")]
    pub aisle: String,
}

/// A recipe row. `ingredient_parts` keeps the serialized encoding from the
/// source table; see [`crate::resolver::ingredients::parse_ingredient_list`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "RecipeIngredientParts")]
    pub ingredient_parts: String,
    #[serde(rename = "AggregatedRating", default)]
    pub rating: f64,
    #[serde(rename = "RecipeInstructions", default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Recipe details returned by the external lookup service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeDetails {
    pub name: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeSource {
    Local,
    Online,
}

/// Ingredient list resolved for a dish, local dataset first.
#[derive(Debug, Clone, PartialEq)]
pub struct DishIngredients {
    pub dish_name: String,
    pub ingredients: Vec<String>,
    pub source: RecipeSource,
}

//
// ================= Candidates =================
//

/// What a candidate points at once the user picks it.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidatePayload {
    /// Row index into the shared inventory table
    Inventory(usize),
    Recipe { name: String, source: RecipeSource },
}

/// One entry of a numbered list shown to the user. `rank` is 0-based;
/// the user answers with `rank + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub label: String,
    pub payload: CandidatePayload,
    pub rank: usize,
}

//
// ================= Intents =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ProductSearch,
    CategorySearch,
    CategoryList,
    Recipe,
    DishIngredients,
    Suggestion,
    Sustainability,
    Greeting,
    Farewell,
    ThankYou,
    Personal,
    Conversational,
    Inappropriate,
    #[serde(other)]
    Unknown,
}

/// Entities come back either as one string or as a list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Entities {
    One(String),
    Many(Vec<String>),
}

impl Default for Entities {
    fn default() -> Self {
        Entities::One(String::new())
    }
}

impl Entities {
    /// Trimmed, non-empty entity strings in order.
    pub fn items(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            Entities::One(value) => vec![value.as_str()],
            Entities::Many(values) => values.iter().map(String::as_str).collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedIntent {
    pub intent: Intent,
    #[serde(default, alias = "entities")]
    pub product: Entities,
    #[serde(default)]
    pub filter: String,
}

impl ParsedIntent {
    pub fn unknown() -> Self {
        Self {
            intent: Intent::Unknown,
            product: Entities::default(),
            filter: String::new(),
        }
    }

    pub fn products(&self) -> Vec<String> {
        self.product.items()
    }
}

//
// ================= Outbound =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutboundMessage {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<String>,
}

impl OutboundMessage {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            buttons: vec![],
        }
    }

    pub fn with_buttons(message: impl Into<String>, buttons: Vec<String>) -> Self {
        Self {
            message: message.into(),
            buttons,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Intent::ProductSearch => "product_search",
            Intent::CategorySearch => "category_search",
            Intent::CategoryList => "category_list",
            Intent::Recipe => "recipe",
            Intent::DishIngredients => "dish_ingredients",
            Intent::Suggestion => "suggestion",
            Intent::Sustainability => "sustainability",
            Intent::Greeting => "greeting",
            Intent::Farewell => "farewell",
            Intent::ThankYou => "thank_you",
            Intent::Personal => "personal",
            Intent::Conversational => "conversational",
            Intent::Inappropriate => "inappropriate",
            Intent::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: u32, out_of_stock: bool) -> InventoryItem {
        InventoryItem {
            name: "Onions".to_string(),
            category: "Fruits & Vegetables".to_string(),
            location: "1-a".to_string(),
            available_quantity: quantity,
            weight_grams: 500.0,
            out_of_stock,
        }
    }

    #[test]
    fn test_availability_rule() {
        assert!(item(12, false).is_available());
        assert!(!item(0, false).is_available());
        assert!(!item(12, true).is_available());
        assert_eq!(
            item(12, false).availability(),
            Availability::InStock {
                location: "1-a".to_string(),
                quantity: 12,
                weight_grams: 500.0
            }
        );
    }

    #[test]
    fn test_parsed_intent_accepts_string_or_list() {
        let single: ParsedIntent =
            serde_json::from_str(r#"{"intent":"product_search","product":" onions ","filter":""}"#)
                .unwrap();
        assert_eq!(single.intent, Intent::ProductSearch);
        assert_eq!(single.products(), vec!["onions"]);

        let many: ParsedIntent =
            serde_json::from_str(r#"{"intent":"recipe","product":["rice","", "chicken"]}"#).unwrap();
        assert_eq!(many.products(), vec!["rice", "chicken"]);
        assert_eq!(many.filter, "");
    }

    #[test]
    fn test_unrecognised_intent_maps_to_unknown() {
        let parsed: ParsedIntent =
            serde_json::from_str(r#"{"intent":"weather_report","entities":"rain"}"#).unwrap();
        assert_eq!(parsed.intent, Intent::Unknown);
        assert_eq!(parsed.products(), vec!["rain"]);
    }

    #[test]
    fn test_inventory_row_field_names() {
        let row: InventoryItem = serde_json::from_str(
            r#"{"name":"Onions","category":"Fruits & Vegetables","location":"1-a",
                "availableQuantity":12,"weightInGms":500,"outOfStock":false}"#,
        )
        .unwrap();
        assert_eq!(row, item(12, false));
    }
}
