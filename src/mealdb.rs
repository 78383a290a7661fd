//! Recipe lookup service
//!
//! The contract the recipe resolver falls back to, plus a TheMealDB client.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::error::AssistantError;
use crate::models::RecipeDetails;
use crate::Result;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, error};

pub const INGREDIENT_SEARCH_LIMIT: usize = 3;
/// TheMealDB numbers ingredient/measure fields 1..=20.
pub const MAX_INGREDIENT_FIELDS: usize = 20;

/// External recipe lookup. Treated as unreliable by every caller.
#[async_trait::async_trait]
pub trait RecipeLookup: Send + Sync {
    /// Up to three dish names using `term` as the main ingredient.
    async fn search_by_ingredient(&self, term: &str) -> Result<Vec<String>>;
    async fn search_by_name(&self, name: &str) -> Result<Option<RecipeDetails>>;
}

pub struct MealDbClient {
    client: Client,
    base_url: String,
}

impl MealDbClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_meals(&self, path: &str, key: &str, value: &str) -> Result<Vec<Map<String, Value>>> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(&[(key, value)])
            .send()
            .await
            .map_err(|e| {
                error!("Recipe lookup request failed: {}", e);
                AssistantError::ExternalLookupFailure(format!("{}: {}", path, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::ExternalLookupFailure(format!(
                "Recipe lookup returned {} for {}",
                status, path
            )));
        }

        let body: MealsResponse = response.json().await.map_err(|e| {
            AssistantError::ExternalLookupFailure(format!("Invalid JSON from {}: {}", path, e))
        })?;

        Ok(body.meals.unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl RecipeLookup for MealDbClient {
    async fn search_by_ingredient(&self, term: &str) -> Result<Vec<String>> {
        let meals = self.get_meals("/filter.php", "i", term).await?;
        debug!(term, results = meals.len(), "Recipe lookup by ingredient");

        Ok(meals
            .iter()
            .filter_map(|meal| field(meal, "strMeal"))
            .take(INGREDIENT_SEARCH_LIMIT)
            .collect())
    }

    async fn search_by_name(&self, name: &str) -> Result<Option<RecipeDetails>> {
        let meals = self.get_meals("/search.php", "s", name).await?;
        Ok(meals.first().and_then(meal_details))
    }
}

#[derive(Debug, Deserialize)]
struct MealsResponse {
    meals: Option<Vec<Map<String, Value>>>,
}

fn field(meal: &Map<String, Value>, key: &str) -> Option<String> {
    meal.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Rebuild the ingredient list from the numbered ingredient/measure pairs,
/// prefixing the measure when one is given.
fn meal_details(meal: &Map<String, Value>) -> Option<RecipeDetails> {
    let name = field(meal, "strMeal")?;

    let ingredients = (1..=MAX_INGREDIENT_FIELDS)
        .filter_map(|i| {
            let ingredient = field(meal, &format!("strIngredient{}", i))?;
            Some(match field(meal, &format!("strMeasure{}", i)) {
                Some(measure) => format!("{} {}", measure, ingredient),
                None => ingredient,
            })
        })
        .collect();

    Some(RecipeDetails {
        name,
        ingredients,
        instructions: field(meal, "strInstructions").unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_search_by_ingredient_keeps_top_three() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/filter.php")
            .match_query(Matcher::UrlEncoded("i".into(), "chicken breast".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"meals":[
                    {"strMeal":"Chicken Handi","idMeal":"1"},
                    {"strMeal":"Chicken Congee","idMeal":"2"},
                    {"strMeal":"Chicken Karaage","idMeal":"3"},
                    {"strMeal":"Chicken Marengo","idMeal":"4"}
                ]}"#,
            )
            .create_async()
            .await;

        let client = MealDbClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        let names = client.search_by_ingredient("chicken breast").await.unwrap();
        assert_eq!(names, vec!["Chicken Handi", "Chicken Congee", "Chicken Karaage"]);
    }

    #[tokio::test]
    async fn test_search_by_name_rebuilds_ingredients() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search.php")
            .match_query(Matcher::UrlEncoded("s".into(), "Shakshuka".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"meals":[{
                    "strMeal":"Shakshuka",
                    "strInstructions":"Simmer and serve.",
                    "strIngredient1":"Olive Oil","strMeasure1":"1 tbs",
                    "strIngredient2":"Eggs","strMeasure2":" ",
                    "strIngredient3":"","strMeasure3":"",
                    "strIngredient4":null,"strMeasure4":null
                }]}"#,
            )
            .create_async()
            .await;

        let client = MealDbClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        let details = client.search_by_name("Shakshuka").await.unwrap().unwrap();
        assert_eq!(details.name, "Shakshuka");
        assert_eq!(details.ingredients, vec!["1 tbs Olive Oil", "Eggs"]);
        assert_eq!(details.instructions, "Simmer and serve.");
    }

    #[tokio::test]
    async fn test_null_meals_is_empty() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search.php")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"meals":null}"#)
            .create_async()
            .await;

        let client = MealDbClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        assert_eq!(client.search_by_name("nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_server_error_is_lookup_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/filter.php")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let client = MealDbClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        let err = client.search_by_ingredient("rice").await.unwrap_err();
        assert!(matches!(err, AssistantError::ExternalLookupFailure(_)));
    }
}
