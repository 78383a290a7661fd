//! Category classifier
//!
//! Scores free text against an ordered keyword table. The table order is the
//! tie-break: among categories sharing the top score, the first one defined
//! wins, on every run.

use crate::catalog::Catalog;
use crate::models::InventoryItem;

/// How many items a category browse lists.
pub const CATEGORY_BROWSE_LIMIT: usize = 10;

/// Ordered category → keywords association list.
#[derive(Debug, Clone)]
pub struct CategoryKeywordTable {
    entries: Vec<(String, Vec<String>)>,
}

impl CategoryKeywordTable {
    pub fn new(entries: Vec<(String, Vec<String>)>) -> Self {
        Self { entries }
    }

    pub fn builtin() -> Self {
        let table: &[(&str, &[&str])] = &[
            (
                "Fruits & Vegetables",
                &[
                    "fruit", "vegetable", "produce", "veggies", "onion", "potato", "tomato",
                    "apple", "banana", "carrot", "spinach", "lettuce", "cabbage", "garlic",
                ],
            ),
            (
                "Dairy & Bakery",
                &["dairy", "milk", "cheese", "butter", "yogurt", "curd", "paneer", "bread", "bakery", "eggs"],
            ),
            (
                "Cooking Essentials",
                &["cooking", "essentials", "spices", "masala", "oil", "flour", "atta", "rice", "dal", "sugar", "salt"],
            ),
            (
                "Munchies",
                &["munchies", "snacks", "chips", "namkeen", "popcorn", "nuts", "crisps"],
            ),
            (
                "Beverages",
                &["beverages", "drinks", "juice", "soda", "coffee", "tea", "water"],
            ),
            (
                "Packaged Food",
                &["packaged", "noodles", "pasta", "sauce", "ready to eat", "cereal", "jam"],
            ),
            (
                "Chocolates & Candies",
                &["chocolate", "candies", "candy", "desserts", "sweets", "biscuits", "cookies"],
            ),
            (
                "Household",
                &["household", "cleaning", "cleaner", "detergent", "dishwash", "floor", "toilet", "home"],
            ),
            (
                "Personal Care",
                &["personal care", "hygiene", "health", "shampoo", "soap", "toothpaste", "skin", "hair"],
            ),
            (
                "Meat & Seafood",
                &["meat", "chicken", "pork", "beef", "mutton", "fish", "seafood", "prawn"],
            ),
            (
                "Party Supplies",
                &["party", "balloon", "candle", "decoration", "streamer", "confetti"],
            ),
        ];

        Self::new(
            table
                .iter()
                .map(|(name, keywords)| {
                    (
                        name.to_string(),
                        keywords.iter().map(|k| k.to_string()).collect(),
                    )
                })
                .collect(),
        )
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

pub struct CategoryClassifier {
    table: CategoryKeywordTable,
}

impl CategoryClassifier {
    pub fn new(table: CategoryKeywordTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &CategoryKeywordTable {
        &self.table
    }

    /// Category with the strictly highest keyword count, `None` if all score zero.
    pub fn classify_category(&self, text: &str) -> Option<&str> {
        let lower = text.to_lowercase();
        let mut best: Option<(&str, usize)> = None;

        for (name, keywords) in &self.table.entries {
            let score = keywords
                .iter()
                .filter(|kw| lower.contains(kw.as_str()))
                .count();

            // strict `>` keeps the earlier category on ties
            if score > 0 && best.map_or(true, |(_, top)| score > top) {
                best = Some((name.as_str(), score));
            }
        }

        best.map(|(name, _)| name)
    }
}

/// In-stock items of `category` in dataset order, at most `limit`.
pub fn in_stock_items(catalog: &Catalog, category: &str, limit: usize) -> Vec<InventoryItem> {
    catalog
        .inventory
        .iter()
        .filter(|item| item.category.eq_ignore_ascii_case(category.trim()) && item.is_available())
        .take(limit)
        .cloned()
        .collect()
}

/// Listing for a category browse.
pub fn search_by_category(catalog: &Catalog, category: &str) -> String {
    let items = in_stock_items(catalog, category, CATEGORY_BROWSE_LIMIT);
    if items.is_empty() {
        return format!(
            "I'm sorry, I couldn't find any in-stock items in the {} category right now.",
            category
        );
    }

    let mut text = format!("Here are some items from our {} section:", category);
    for item in &items {
        text.push_str(&format!(
            "\n  - {} (aisle {}, {} units)",
            item.name, item.location, item.available_quantity
        ));
    }
    text
}

/// Listing of every category present in the inventory.
pub fn list_all_categories(catalog: &Catalog) -> Option<String> {
    let categories = catalog.categories();
    if categories.is_empty() {
        return None;
    }

    let mut text = String::from("Here are all the categories we carry:");
    for (name, count) in categories {
        text.push_str(&format!("\n  • {} ({} items)", name, count));
    }
    Some(text)
}
