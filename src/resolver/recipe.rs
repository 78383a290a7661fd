//! Recipe and dish-ingredient resolution
//!
//! Both lookups walk an ordered list of sources, local dataset first, and
//! stop at the first source with a non-empty answer. Online failures count
//! as empty answers.

use crate::catalog::Catalog;
use crate::mealdb::{RecipeLookup, INGREDIENT_SEARCH_LIMIT};
use crate::models::{DishIngredients, RecipeDetails, RecipeRecord, RecipeSource};
use crate::resolver::ingredients::parse_ingredient_list;
use std::sync::Arc;
use tracing::{debug, warn};

pub const LOCAL_RECIPE_LIMIT: usize = 5;

/// Dish names found for a set of ingredients, tagged with where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeMatches {
    pub source: RecipeSource,
    pub names: Vec<String>,
}

#[async_trait::async_trait]
pub trait RecipeNameSource: Send + Sync {
    fn source(&self) -> RecipeSource;
    async fn find_by_ingredients(&self, ingredients: &[String]) -> Vec<String>;
}

#[async_trait::async_trait]
pub trait DishSource: Send + Sync {
    async fn ingredients_for(&self, dish: &str) -> Option<DishIngredients>;
}

//
// ================= Local dataset =================
//

pub struct LocalRecipes {
    catalog: Arc<Catalog>,
}

impl LocalRecipes {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Rows containing every ingredient, best rated first.
    pub fn matching(&self, ingredients: &[String]) -> Vec<&RecipeRecord> {
        let needles: Vec<String> = ingredients.iter().map(|i| i.to_lowercase()).collect();

        let mut rows: Vec<&RecipeRecord> = self
            .catalog
            .recipes
            .iter()
            .filter(|recipe| {
                let parts = recipe.ingredient_parts.to_lowercase();
                needles.iter().all(|needle| parts.contains(needle.as_str()))
            })
            .collect();

        rows.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        rows
    }

    /// Highest-rated row whose name contains `dish`.
    pub fn best_named(&self, dish: &str) -> Option<&RecipeRecord> {
        let needle = dish.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        self.catalog
            .recipes
            .iter()
            .filter(|recipe| recipe.name.to_lowercase().contains(&needle))
            .fold(None, |best: Option<&RecipeRecord>, recipe| match best {
                Some(top) if top.rating >= recipe.rating => Some(top),
                _ => Some(recipe),
            })
    }

    pub fn details(&self, name: &str) -> Option<RecipeDetails> {
        let recipe = self
            .catalog
            .recipes
            .iter()
            .find(|recipe| recipe.name.eq_ignore_ascii_case(name))?;

        Some(RecipeDetails {
            name: recipe.name.clone(),
            ingredients: parse_ingredient_list(&recipe.ingredient_parts).unwrap_or_default(),
            instructions: recipe.instructions.clone().unwrap_or_default(),
        })
    }
}

#[async_trait::async_trait]
impl RecipeNameSource for LocalRecipes {
    fn source(&self) -> RecipeSource {
        RecipeSource::Local
    }

    async fn find_by_ingredients(&self, ingredients: &[String]) -> Vec<String> {
        self.matching(ingredients)
            .into_iter()
            .take(LOCAL_RECIPE_LIMIT)
            .map(|recipe| recipe.name.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl DishSource for LocalRecipes {
    async fn ingredients_for(&self, dish: &str) -> Option<DishIngredients> {
        let recipe = self.best_named(dish)?;

        match parse_ingredient_list(&recipe.ingredient_parts) {
            Some(ingredients) if !ingredients.is_empty() => Some(DishIngredients {
                dish_name: recipe.name.clone(),
                ingredients,
                source: RecipeSource::Local,
            }),
            _ => {
                warn!(dish = %recipe.name, "Could not decode stored ingredient list");
                None
            }
        }
    }
}

//
// ================= Online lookup =================
//

pub struct OnlineRecipes {
    lookup: Arc<dyn RecipeLookup>,
}

impl OnlineRecipes {
    pub fn new(lookup: Arc<dyn RecipeLookup>) -> Self {
        Self { lookup }
    }

    pub async fn details(&self, name: &str) -> Option<RecipeDetails> {
        match self.lookup.search_by_name(name).await {
            Ok(details) => details,
            Err(error) => {
                warn!("Recipe lookup by name failed, treating as not found: {}", error);
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl RecipeNameSource for OnlineRecipes {
    fn source(&self) -> RecipeSource {
        RecipeSource::Online
    }

    /// The first ingredient is the query term.
    async fn find_by_ingredients(&self, ingredients: &[String]) -> Vec<String> {
        let Some(term) = ingredients.first() else {
            return Vec::new();
        };

        match self.lookup.search_by_ingredient(term).await {
            Ok(names) => names.into_iter().take(INGREDIENT_SEARCH_LIMIT).collect(),
            Err(error) => {
                warn!("Recipe lookup by ingredient failed, treating as empty: {}", error);
                Vec::new()
            }
        }
    }
}

#[async_trait::async_trait]
impl DishSource for OnlineRecipes {
    async fn ingredients_for(&self, dish: &str) -> Option<DishIngredients> {
        let details = self.details(dish).await?;
        if details.ingredients.is_empty() {
            return None;
        }

        Some(DishIngredients {
            dish_name: details.name,
            ingredients: details.ingredients,
            source: RecipeSource::Online,
        })
    }
}

//
// ================= Resolver =================
//

pub struct RecipeResolver {
    local: Arc<LocalRecipes>,
    online: Arc<OnlineRecipes>,
    name_sources: Vec<Arc<dyn RecipeNameSource>>,
    dish_sources: Vec<Arc<dyn DishSource>>,
}

impl RecipeResolver {
    pub fn new(catalog: Arc<Catalog>, lookup: Arc<dyn RecipeLookup>) -> Self {
        let local = Arc::new(LocalRecipes::new(catalog));
        let online = Arc::new(OnlineRecipes::new(lookup));

        Self {
            name_sources: vec![local.clone(), online.clone()],
            dish_sources: vec![local.clone(), online.clone()],
            local,
            online,
        }
    }

    pub async fn find_recipes(&self, ingredients: &[String]) -> Option<RecipeMatches> {
        for source in &self.name_sources {
            let names = source.find_by_ingredients(ingredients).await;
            if !names.is_empty() {
                debug!(source = ?source.source(), results = names.len(), "Recipes found");
                return Some(RecipeMatches {
                    source: source.source(),
                    names,
                });
            }
        }
        None
    }

    pub async fn dish_ingredients(&self, dish: &str) -> Option<DishIngredients> {
        for source in &self.dish_sources {
            if let Some(found) = source.ingredients_for(dish).await {
                return Some(found);
            }
        }
        None
    }

    pub async fn recipe_details(&self, name: &str, source: RecipeSource) -> Option<RecipeDetails> {
        match source {
            RecipeSource::Local => self.local.details(name),
            RecipeSource::Online => self.online.details(name).await,
        }
    }
}
