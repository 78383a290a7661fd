//! Ingredient list decoding and ingredient-name cleanup
//!
//! Recipe rows store their ingredients in one of two encodings:
//! a list literal (`["salt", "1 cup flour"]`, single or double quotes) or the
//! wrapped form `c("salt", "1 cup flour")`. Both decode to the same list.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LEADING_QUANTITY: Regex = Regex::new(
        r"(?i)^\d[\d\s/.½¼¾-]*(?:(?:cups|cup|tablespoons|tablespoon|tbsp|teaspoons|teaspoon|tsp|pounds|pound|lbs|lb|ounces|ounce|oz|kilograms|kilogram|kg|grams|g|ml|liters|liter)\b\.?)?\s*"
    )
    .expect("quantity pattern compiles");
    static ref DESCRIPTORS: Regex = Regex::new(
        r"(?i)\b(fresh|dried|chopped|diced|sliced|minced|ground|whole|large|small|medium|organic|extra|virgin|all-purpose|unsalted|boneless|skinless)\b"
    )
    .expect("descriptor pattern compiles");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("whitespace pattern compiles");
}

const WRAPPED_PREFIX: &str = "c(";
const WRAPPED_SUFFIX: char = ')';

/// Decode a stored ingredient list. `None` when the text is in neither encoding.
pub fn parse_ingredient_list(raw: &str) -> Option<Vec<String>> {
    let trimmed = raw.trim();

    if let Some(inner) = trimmed
        .strip_prefix(WRAPPED_PREFIX)
        .and_then(|rest| rest.strip_suffix(WRAPPED_SUFFIX))
    {
        return parse_quoted_entries(inner);
    }

    let inner = trimmed.strip_prefix('[')?.strip_suffix(']')?;
    if let Ok(list) = serde_json::from_str::<Vec<String>>(trimmed) {
        return Some(list);
    }
    parse_quoted_entries(inner)
}

/// Comma-separated entries, each single- or double-quoted. Bare `NA` entries
/// (missing values) are skipped; other bare tokens are kept as written.
fn parse_quoted_entries(inner: &str) -> Option<Vec<String>> {
    let mut entries = Vec::new();
    let mut chars = inner.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == ',') {
            chars.next();
        }

        let Some(&first) = chars.peek() else {
            break;
        };

        if first == '"' || first == '\'' {
            chars.next();
            let mut entry = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            entry.push(escaped);
                        }
                    }
                    c if c == first => {
                        closed = true;
                        break;
                    }
                    c => entry.push(c),
                }
            }
            if !closed {
                return None;
            }
            entries.push(entry);
        } else {
            let mut token = String::new();
            while let Some(&c) = chars.peek() {
                if c == ',' {
                    break;
                }
                token.push(c);
                chars.next();
            }
            let token = token.trim();
            if !token.is_empty() && token != "NA" {
                entries.push(token.to_string());
            }
        }
    }

    Some(entries)
}

/// Reduce an ingredient line to a short inventory query:
/// `"2 cups chopped fresh spinach leaves"` → `"spinach leaves"`.
pub fn clean_ingredient_name(ingredient: &str) -> String {
    let without_quantity = LEADING_QUANTITY.replace(ingredient.trim(), "");
    let without_descriptors = DESCRIPTORS.replace_all(&without_quantity, " ");
    let punctuation_free = without_descriptors.replace([',', ';', '(', ')'], " ");
    let collapsed = WHITESPACE.replace_all(&punctuation_free, " ");

    collapsed
        .trim()
        .split(' ')
        .filter(|word| !word.is_empty())
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
}
