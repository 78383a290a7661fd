//! Fast-path classifier
//!
//! Answers greetings, farewells, thanks and abusive messages from fixed
//! pattern tables without calling the NLU service. Shopping vocabulary is
//! checked first: a message like "bye, do you have onions?" must reach the
//! intent pipeline.

use crate::responses::{pick, ResponsePools};
use crate::Result;
use regex::Regex;
use tracing::debug;

/// Shopping vocabulary that sends a message to the intent pipeline.
const SHOPPING_KEYWORDS: &[&str] = &[
    // Shopping actions
    "buy", "purchase", "shop", "product", "item", "store", "inventory", "price", "cost",
    "available", "stock", "order", "delivery", "aisle", "section", "department",
    "grocery", "groceries", "supermarket", "walmart",
    // Recipes
    "recipe", "ingredients", "cook", "food", "eat", "meal", "dish",
    // Requests
    "need", "want", "looking for", "suggest", "recommend",
    // Sustainability
    "eco-friendly", "sustainable", "organic",
    // Occasions
    "party", "birthday", "celebration", "festival", "diwali", "christmas",
    // Categories
    "produce", "dairy", "meat", "bread", "snacks", "beverages", "household", "home",
    "cleaning", "personal care", "fruits", "vegetables", "spices", "munchies", "packaged",
    "desserts", "chocolates", "candies", "biscuits", "hygiene", "health",
    // Common products
    "milk", "eggs", "butter", "cheese", "yogurt", "chicken", "beef", "fish", "rice", "pasta",
    "flour", "sugar", "salt", "pepper", "oil", "onion", "tomato", "potato", "apple", "banana",
    "orange", "carrot", "lettuce", "spinach", "garlic", "ginger", "lemon", "lime", "beans",
    "corn", "peas", "cabbage", "broccoli",
];

const SHOPPING_PATTERNS: &[&str] = &[
    r"do you have",
    r"where is",
    r"where can i find",
    r"need some",
    r"want some",
    r"find.*for me",
    r"got any",
    r"sell.*\?",
];

const INAPPROPRIATE_PATTERNS: &[&str] = &[
    r"\b(fuck|shit|damn|bitch|ass|hell|stupid|idiot|moron|dumb)\b",
    r"\b(hate|kill|die|murder|attack)\b",
    r"\b(sex|porn|nude|naked)\b",
    r"\b(shut up|screw you|go to hell)\b",
];

const EXACT_GREETINGS: &[&str] = &["hello", "hi", "hey", "greetings", "howdy", "sup", "yo"];

const GREETING_PATTERNS: &[&str] = &[
    r"^(hello|hi|hey|greetings|good morning|good afternoon|good evening|howdy|sup|yo)(\s|$|!|\?|,|\.)",
    r"what's up",
    r"how are you",
    r"how do you do",
    r"nice to meet you",
];

const FAREWELLS: &[&str] = &[
    "bye", "goodbye", "see you", "farewell", "take care", "catch you later", "see ya", "later",
    "talk to you later", "have a good day", "good night",
];

const THANKS: &[&str] = &[
    "thank you", "thanks", "thank u", "thx", "appreciate it", "much appreciated", "grateful",
    "cheers",
];

const PERSONAL_PATTERNS: &[&str] = &[
    r"\b(who are you|what are you|tell me about yourself|your name)\b",
    r"\b(how old are you|where are you from|what do you do)\b",
    r"\b(are you real|are you human|are you a robot|are you ai)\b",
    r"\b(what can you do|your capabilities|your features)\b",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastPathKind {
    Inappropriate,
    Greeting,
    Farewell,
    Thanks,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FastPathResponse {
    pub kind: FastPathKind,
    pub text: String,
}

/// Compiled pattern tables, built once at startup.
#[derive(Debug, Clone)]
pub struct FastPathRules {
    pub shopping_keywords: Vec<String>,
    pub shopping_patterns: Vec<Regex>,
    pub inappropriate: Vec<Regex>,
    pub exact_greetings: Vec<String>,
    pub greeting_patterns: Vec<Regex>,
    pub farewells: Vec<String>,
    pub thanks: Vec<String>,
    pub personal: Vec<Regex>,
}

fn compile(patterns: &[&str]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).map_err(Into::into))
        .collect()
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

impl FastPathRules {
    pub fn builtin() -> Result<Self> {
        Ok(Self {
            shopping_keywords: words(SHOPPING_KEYWORDS),
            shopping_patterns: compile(SHOPPING_PATTERNS)?,
            inappropriate: compile(INAPPROPRIATE_PATTERNS)?,
            exact_greetings: words(EXACT_GREETINGS),
            greeting_patterns: compile(GREETING_PATTERNS)?,
            farewells: words(FAREWELLS),
            thanks: words(THANKS),
            personal: compile(PERSONAL_PATTERNS)?,
        })
    }

    pub fn is_shopping_related(&self, lower: &str) -> bool {
        self.shopping_keywords.iter().any(|kw| lower.contains(kw.as_str()))
            || self.shopping_patterns.iter().any(|re| re.is_match(lower))
    }

    pub fn is_inappropriate(&self, lower: &str) -> bool {
        self.inappropriate.iter().any(|re| re.is_match(lower))
    }

    pub fn is_greeting(&self, lower: &str) -> bool {
        let trimmed = lower.trim();
        self.exact_greetings.iter().any(|g| g == trimmed)
            || self.greeting_patterns.iter().any(|re| re.is_match(trimmed))
    }

    pub fn is_farewell(&self, lower: &str) -> bool {
        self.farewells.iter().any(|f| lower.contains(f.as_str()))
    }

    pub fn is_thanks(&self, lower: &str) -> bool {
        self.thanks.iter().any(|t| lower.contains(t.as_str()))
    }

    /// Splits `conversational` intents into personal questions and off-topic chatter.
    pub fn is_personal_question(&self, lower: &str) -> bool {
        self.personal.iter().any(|re| re.is_match(lower))
    }
}

pub struct FastPathClassifier {
    rules: FastPathRules,
    pools: ResponsePools,
}

impl FastPathClassifier {
    pub fn new(rules: FastPathRules, pools: ResponsePools) -> Self {
        Self { rules, pools }
    }

    pub fn rules(&self) -> &FastPathRules {
        &self.rules
    }

    pub fn kind(&self, text: &str) -> Option<FastPathKind> {
        let lower = text.to_lowercase();

        if self.rules.is_shopping_related(&lower) {
            None
        } else if self.rules.is_inappropriate(&lower) {
            Some(FastPathKind::Inappropriate)
        } else if self.rules.is_greeting(&lower) {
            Some(FastPathKind::Greeting)
        } else if self.rules.is_farewell(&lower) {
            Some(FastPathKind::Farewell)
        } else if self.rules.is_thanks(&lower) {
            Some(FastPathKind::Thanks)
        } else {
            None
        }
    }

    /// First matching rule wins; `None` defers to the intent pipeline.
    pub fn classify_fast_path(&self, text: &str) -> Option<FastPathResponse> {
        let kind = self.kind(text)?;
        debug!(?kind, "Fast path matched");

        let pool = match kind {
            FastPathKind::Inappropriate => &self.pools.inappropriate,
            FastPathKind::Greeting => &self.pools.greeting,
            FastPathKind::Farewell => &self.pools.farewell,
            FastPathKind::Thanks => &self.pools.thanks,
        };

        Some(FastPathResponse {
            kind,
            text: pick(pool),
        })
    }
}
