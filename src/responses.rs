//! Canned responses and user-facing phrasing
//!
//! Pools are plain data handed to the components that answer from them, so
//! a deployment can swap wording without touching the classifiers.

use crate::models::{InventoryItem, SustainableAlternative};
use rand::seq::SliceRandom;

pub const WELCOME: &str = "Hello there! I'm SAM AI, your friendly shopping assistant! 🛒\n\n\
I can help you with:\n   • Finding products in our inventory\n   • Suggesting recipes and ingredients\n   \
• Recommending sustainable alternatives\n   • General shopping assistance\n\n\
Just ask me anything related to shopping, and I'll do my best to help!";
pub const EXIT: &str = "See you again!";
pub const CLARIFY: &str = "I'm not sure I understood that. Could you please rephrase or ask about product availability, recipes, or sustainability?";
pub const CATEGORY_CLARIFY: &str = "I couldn't identify the specific category you're looking for. Could you be more specific? For example, you can ask for 'household items', 'cleaning products', 'snacks', etc.";
pub const SELECTION_CANCELED: &str = "Selection canceled. Let me know if there is anything else I can help with!";
pub const RECIPE_SELECTION_CANCELED: &str = "Recipe selection canceled. Let me know if there's anything else I can help you with!";
pub const SELECTION_RETRIES_EXHAUSTED: &str = "Too many invalid choices, so I've canceled that selection. Feel free to ask again!";
pub const RECIPE_DETAILS_MISSING: &str = "I'm sorry, I couldn't retrieve the details for that recipe.";
pub const NEED_INGREDIENTS: &str = "Could not detect specific ingredients from your query. Please specify ingredients clearly.";
pub const CONFIRM_REMINDER: &str = "Please answer with 'yes' or 'no'.";
pub const CHECK_STORE_PROMPT: &str = "Would you like me to check which of these ingredients are available in our store?";
pub const CHECKING_STORE: &str = "🏪 Checking store availability...";
pub const DECLINED_STORE_CHECK: &str = "Got it! You have the complete ingredients list. Happy cooking! 👨‍🍳";
pub const NO_RECOMMENDATIONS: &str = "I couldn't find any specific recommendations for that. Would you like to try something else?";
pub const SUSTAINABLE_HEADER: &str = "By the way, here are some sustainable alternatives:";
pub const EMPTY_CATALOG: &str = "I couldn't find any product categories right now. Please try again later.";

#[derive(Debug, Clone)]
pub struct ResponsePools {
    pub greeting: Vec<String>,
    pub farewell: Vec<String>,
    pub thanks: Vec<String>,
    pub inappropriate: Vec<String>,
    pub personal: Vec<String>,
    pub off_topic: Vec<String>,
}

fn pool(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|line| line.to_string()).collect()
}

impl Default for ResponsePools {
    fn default() -> Self {
        Self {
            greeting: pool(&[
                "Hello! I'm SAM AI, your shopping assistant. I can help you find products, suggest recipes, and recommend sustainable alternatives. What can I help you with today?",
                "Hi there! Welcome to SAM AI. I'm here to help with all your shopping needs, from finding products to discovering recipes. How can I assist you?",
                "Hey! Great to see you. I'm SAM AI, and I help with shopping, recipes and eco-friendly alternatives. What are you looking for today?",
            ]),
            farewell: pool(&[
                "Goodbye! Thanks for shopping with SAM AI. Come back anytime you need help with products or recipes!",
                "Take care! It was great helping you today. See you next time you need shopping assistance!",
                "See you later! Thanks for using SAM AI for your shopping needs. Happy shopping!",
            ]),
            thanks: pool(&[
                "You're very welcome! I'm always happy to help with your shopping needs. Is there anything else you'd like to find?",
                "My pleasure! Do you need help with anything else today?",
                "Glad I could help! Feel free to ask me about any other products, recipes, or shopping questions.",
            ]),
            inappropriate: pool(&[
                "I appreciate your interest, but I'd prefer to keep our conversation respectful. How can I help you with your shopping needs today?",
                "Let's keep things friendly! I'm here to help you find products and recipes. What can I assist you with?",
                "I'd rather focus on helping you with shopping assistance. What products are you looking for today?",
            ]),
            personal: pool(&[
                "I'm SAM AI, your intelligent shopping assistant! I'm here to help you find products, discover recipes, and suggest sustainable alternatives. What can I help you shop for today?",
                "I'm SAM AI, think of me as your personal shopping companion. I can search our inventory, find recipe ideas, and recommend eco-friendly products. How can I assist you?",
            ]),
            off_topic: pool(&[
                "That's interesting, but I'm specifically designed to help with shopping assistance! I can help you find products, suggest recipes, or recommend sustainable alternatives. What would you like to shop for today?",
                "That's outside my expertise, but I'm great at helping with shopping! Whether you need specific products, recipe ideas, or sustainable alternatives, I'm your assistant. What can I help you find?",
            ]),
        }
    }
}

/// Pick one line from a pool. An empty pool yields the generic clarification.
pub fn pick(lines: &[String]) -> String {
    lines
        .choose(&mut rand::thread_rng())
        .cloned()
        .unwrap_or_else(|| CLARIFY.to_string())
}

//
// ================= Inventory phrasing =================
//

pub fn out_of_stock(item: &InventoryItem) -> String {
    format!("I'm sorry, but {} is currently out of stock.", item.name)
}

pub fn exact_match(item: &InventoryItem) -> String {
    if !item.is_available() {
        return out_of_stock(item);
    }
    format!(
        "Great news! We have {} in stock. You'll find it in {}, with {} units available ({}g total).",
        item.name, item.location, item.available_quantity, item.weight_grams
    )
}

pub fn single_suggestion(item: &InventoryItem) -> String {
    if !item.is_available() {
        return out_of_stock(item);
    }
    format!(
        "I found '{}', and it's available! Check aisle {}: we have {} units ({}g total).",
        item.name, item.location, item.available_quantity, item.weight_grams
    )
}

pub fn selected_item(item: &InventoryItem) -> String {
    if !item.is_available() {
        return out_of_stock(item);
    }
    format!(
        "Great choice! {} is in aisle {} with {} units ({}g total) ready for you.",
        item.name, item.location, item.available_quantity, item.weight_grams
    )
}

pub fn not_found(query: &str) -> String {
    format!("I'm sorry, I couldn't find '{}' in our inventory.", query)
}

pub fn category_fallback(query: &str, category: &str, items: &[InventoryItem]) -> String {
    let mut text = format!(
        "I couldn't find '{}' exactly, but here are some {} items you might like:",
        query, category
    );
    for item in items {
        text.push_str(&format!("\n  - {} (aisle {})", item.name, item.location));
    }
    text
}

pub fn all_out_of_stock(query: &str) -> String {
    format!(
        "I'm sorry, all the products matching '{}' are currently out of stock.",
        query
    )
}

pub fn inventory_candidate_label(item: &InventoryItem) -> String {
    format!(
        "{} ({} units, {})",
        item.name, item.available_quantity, item.location
    )
}

pub fn sustainable_suggestion(alternative: &SustainableAlternative) -> String {
    format!(
        "For a sustainable option, consider '{}' from aisle {} as an alternative to '{}'.",
        alternative.alternative_name, alternative.aisle, alternative.original_product
    )
}

pub fn no_sustainable_alternative(product: &str) -> String {
    format!(
        "I couldn't find a specific sustainable alternative for '{}', but you can check out our eco-friendly section for more options!",
        product
    )
}
