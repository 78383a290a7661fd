//! Conversation orchestrator - one turn at a time, per session
//!
//! EXIT? → PENDING QUESTION? → FAST PATH → CLASSIFY → DISPATCH → AGGREGATE

use crate::aggregator::ResponseAggregator;
use crate::catalog::Catalog;
use crate::category::{list_all_categories, search_by_category, CategoryClassifier, CategoryKeywordTable};
use crate::config::AssistantConfig;
use crate::disambiguation::{
    ConfirmationContinuation, ConfirmationStep, Disambiguator, PendingConfirmation,
    PendingSelection, ProductSearchJob, SelectionContinuation, SelectionStep, SessionState,
};
use crate::fast_path::{FastPathClassifier, FastPathRules};
use crate::mealdb::{MealDbClient, RecipeLookup};
use crate::models::{
    Candidate, CandidatePayload, Intent, OutboundMessage, ParsedIntent, RecipeSource,
};
use crate::nlu::{IntentClassifier, OpenRouterClient, ProductAdvisor, ResponseSummarizer};
use crate::recommendation::{Recommender, ThemeTable};
use crate::resolver::{
    clean_ingredient_name, InventoryResolver, RecipeResolver, ResolverOutcome,
    SustainabilitySuggester,
};
use crate::responses::{self, pick, ResponsePools};
use crate::state::SessionStore;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const EXIT_COMMAND: &str = "exit";

/// Scanned in the raw text when the classifier returns no usable ingredients.
const COMMON_INGREDIENTS: &[&str] = &[
    "rice", "chicken", "beef", "pork", "fish", "eggs", "milk", "cheese", "butter", "flour",
    "sugar", "salt", "pepper", "onion", "garlic", "tomato", "potato", "carrot", "celery",
    "bell pepper", "mushroom", "spinach", "lettuce", "pasta", "bread", "oil", "vinegar", "lemon",
    "lime", "herbs", "spices",
];

/// Everything a turn produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub messages: Vec<OutboundMessage>,
    /// The session was terminated by this turn.
    pub ended: bool,
}

/// External services the orchestrator talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub classifier: Arc<dyn IntentClassifier>,
    pub summarizer: Arc<dyn ResponseSummarizer>,
    pub advisor: Arc<dyn ProductAdvisor>,
    pub recipes: Arc<dyn RecipeLookup>,
}

impl Collaborators {
    /// One OpenRouter client backs all NLU contracts; TheMealDB serves recipes.
    pub fn from_config(config: &AssistantConfig) -> Result<Self> {
        if config.openrouter_api_key.is_empty() {
            warn!("OPENROUTER_API_KEY not set, NLU calls will degrade");
        }

        let nlu = Arc::new(OpenRouterClient::new(
            config.openrouter_api_key.clone(),
            &config.openrouter_base_url,
            config.openrouter_model.clone(),
            config.http_timeout,
        )?);
        let recipes = Arc::new(MealDbClient::new(&config.mealdb_base_url, config.http_timeout)?);

        Ok(Self {
            classifier: nlu.clone(),
            summarizer: nlu.clone(),
            advisor: nlu,
            recipes,
        })
    }
}

/// Main orchestrator that routes each message through the pipeline
pub struct Orchestrator {
    catalog: Arc<Catalog>,
    fast_path: FastPathClassifier,
    categories: Arc<CategoryClassifier>,
    inventory: InventoryResolver,
    recipes: RecipeResolver,
    sustainability: SustainabilitySuggester,
    recommender: Recommender,
    aggregator: ResponseAggregator,
    classifier: Arc<dyn IntentClassifier>,
    disambiguator: Disambiguator,
    pools: ResponsePools,
    sessions: Arc<dyn SessionStore>,
}

impl Orchestrator {
    pub fn new(
        catalog: Arc<Catalog>,
        collaborators: Collaborators,
        sessions: Arc<dyn SessionStore>,
        max_selection_retries: Option<u32>,
    ) -> Result<Self> {
        let pools = ResponsePools::default();
        let categories = Arc::new(CategoryClassifier::new(CategoryKeywordTable::builtin()));

        Ok(Self {
            fast_path: FastPathClassifier::new(FastPathRules::builtin()?, pools.clone()),
            inventory: InventoryResolver::new(catalog.clone(), categories.clone()),
            recipes: RecipeResolver::new(catalog.clone(), collaborators.recipes),
            sustainability: SustainabilitySuggester::new(catalog.clone()),
            recommender: Recommender::new(catalog.clone(), ThemeTable::builtin(), collaborators.advisor),
            aggregator: ResponseAggregator::new(collaborators.summarizer),
            classifier: collaborators.classifier,
            disambiguator: Disambiguator::new(max_selection_retries),
            categories,
            catalog,
            pools,
            sessions,
        })
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Starts a fresh session and returns the welcome message.
    pub async fn open_session(&self, session_id: &str) -> Vec<OutboundMessage> {
        if let Err(e) = self.sessions.open(session_id).await {
            warn!(session_id, "Could not open session: {}", e);
        } else {
            info!(session_id, "Session opened");
        }
        vec![OutboundMessage::text(responses::WELCOME)]
    }

    pub async fn close_session(&self, session_id: &str) -> bool {
        match self.sessions.close(session_id).await {
            Ok(closed) => {
                if closed {
                    info!(session_id, "Session closed");
                }
                closed
            }
            Err(e) => {
                warn!(session_id, "Could not close session: {}", e);
                false
            }
        }
    }

    pub async fn evict_idle(&self, max_idle: Duration) -> Vec<String> {
        self.sessions.evict_idle(max_idle).await.unwrap_or_else(|e| {
            warn!("Idle session sweep failed: {}", e);
            Vec::new()
        })
    }

    /// Handle one inbound message. Never fails: every problem becomes a reply.
    pub async fn on_message(&self, session_id: &str, text: &str) -> TurnOutcome {
        let text = text.trim();

        if text.eq_ignore_ascii_case(EXIT_COMMAND) {
            self.close_session(session_id).await;
            return TurnOutcome {
                messages: vec![OutboundMessage::text(responses::EXIT)],
                ended: true,
            };
        }

        // Held for the whole turn: turns within a session never overlap.
        let mut session = match self.sessions.acquire(session_id).await {
            Ok(session) => session,
            Err(e) => {
                warn!(session_id, "Session store unavailable: {}", e);
                return TurnOutcome {
                    messages: vec![OutboundMessage::text(responses::CLARIFY)],
                    ended: false,
                };
            }
        };

        info!(session_id, state = session.state.name(), "Turn started");

        let mut messages = Vec::new();
        let next = match std::mem::take(&mut session.state) {
            SessionState::Idle => self.handle_query(text, &mut messages).await,
            SessionState::AwaitingSelection(pending) => {
                self.resume_selection(pending, text, &mut messages).await
            }
            SessionState::AwaitingConfirmation(pending) => {
                self.resume_confirmation(pending, text, &mut messages).await
            }
        };

        debug!(session_id, state = next.name(), "Turn finished");
        session.state = next;

        TurnOutcome {
            messages,
            ended: false,
        }
    }

    //
    // ================= Fresh queries =================
    //

    async fn handle_query(&self, text: &str, out: &mut Vec<OutboundMessage>) -> SessionState {
        if let Some(response) = self.fast_path.classify_fast_path(text) {
            info!(kind = ?response.kind, "Answered by fast path");
            out.push(OutboundMessage::text(response.text));
            return SessionState::Idle;
        }

        let parsed = self.classifier.classify(text).await;
        info!(intent = %parsed.intent, filter = %parsed.filter, "Dispatching intent");
        self.dispatch(text, parsed, out).await
    }

    async fn dispatch(
        &self,
        text: &str,
        parsed: ParsedIntent,
        out: &mut Vec<OutboundMessage>,
    ) -> SessionState {
        let products = parsed.products();

        match parsed.intent {
            Intent::ProductSearch => {
                if products.is_empty() {
                    out.push(OutboundMessage::text(responses::CLARIFY));
                    return SessionState::Idle;
                }
                self.run_product_search(ProductSearchJob::new(products, parsed.filter), out)
                    .await
            }
            Intent::CategorySearch => self.category_search(text, products, out).await,
            Intent::CategoryList => {
                let listing = list_all_categories(&self.catalog)
                    .unwrap_or_else(|| responses::EMPTY_CATALOG.to_string());
                out.push(OutboundMessage::text(listing));
                SessionState::Idle
            }
            Intent::Recipe => self.recipe_search(text, &products, out).await,
            Intent::DishIngredients => {
                let dish = products.first().map(String::as_str).unwrap_or(text);
                self.dish_ingredients(dish, out).await
            }
            Intent::Sustainability => {
                self.sustainable_alternatives(&products, out);
                SessionState::Idle
            }
            Intent::Suggestion => {
                let query = if !products.is_empty() {
                    products.join(" ")
                } else if !parsed.filter.trim().is_empty() {
                    parsed.filter.clone()
                } else {
                    text.to_string()
                };
                let reply = match self.recommender.recommend(&query).await {
                    Some(recommendation) => recommendation.describe(),
                    None => responses::NO_RECOMMENDATIONS.to_string(),
                };
                out.push(OutboundMessage::text(reply));
                SessionState::Idle
            }
            Intent::Greeting => self.canned(&self.pools.greeting, out),
            Intent::Farewell => self.canned(&self.pools.farewell, out),
            Intent::ThankYou => self.canned(&self.pools.thanks, out),
            Intent::Inappropriate => self.canned(&self.pools.inappropriate, out),
            Intent::Personal => self.canned(&self.pools.personal, out),
            Intent::Conversational => {
                if self.fast_path.rules().is_personal_question(&text.to_lowercase()) {
                    self.canned(&self.pools.personal, out)
                } else {
                    self.canned(&self.pools.off_topic, out)
                }
            }
            Intent::Unknown => {
                out.push(OutboundMessage::text(responses::CLARIFY));
                SessionState::Idle
            }
        }
    }

    fn canned(&self, pool: &[String], out: &mut Vec<OutboundMessage>) -> SessionState {
        out.push(OutboundMessage::text(pick(pool)));
        SessionState::Idle
    }

    //
    // ================= Products =================
    //

    /// Resolves the job's products in order. An ambiguous product suspends
    /// the job inside the selection prompt; otherwise the results are
    /// summarized once every product is done.
    async fn run_product_search(
        &self,
        mut job: ProductSearchJob,
        out: &mut Vec<OutboundMessage>,
    ) -> SessionState {
        while let Some(product) = job.pending.pop_front() {
            match self.inventory.resolve_inventory(&product) {
                ResolverOutcome::Ambiguous { candidates, .. } => {
                    let header = format!(
                        "I found several matches for '{}'. Which one would you like?",
                        product
                    );
                    job.current = product;
                    return self.await_selection(
                        header,
                        candidates,
                        SelectionContinuation::ProductSearch(job),
                        out,
                    );
                }
                outcome => {
                    if let Some(line) = outcome.summary_line(&product) {
                        job.results.push(line);
                    }
                }
            }
            self.collect_alternative(&mut job, &product);
        }

        out.extend(
            self.aggregator
                .inventory_summary(job.results, job.alternatives)
                .await,
        );
        SessionState::Idle
    }

    fn collect_alternative(&self, job: &mut ProductSearchJob, product: &str) {
        if !job.wants_alternatives() {
            return;
        }
        if let Some(alternative) = self.sustainability.suggest_alternative(product) {
            job.alternatives.push(responses::sustainable_suggestion(alternative));
        }
    }

    async fn category_search(
        &self,
        text: &str,
        products: Vec<String>,
        out: &mut Vec<OutboundMessage>,
    ) -> SessionState {
        let query = if products.is_empty() {
            text.to_string()
        } else {
            products.join(" ")
        };

        if let Some(category) = self.categories.classify_category(&query) {
            debug!(category, "Category detected");
            out.push(OutboundMessage::text(search_by_category(&self.catalog, category)));
            return SessionState::Idle;
        }

        if products.is_empty() {
            out.push(OutboundMessage::text(responses::CATEGORY_CLARIFY));
            return SessionState::Idle;
        }

        self.run_product_search(ProductSearchJob::lookup_only(products), out)
            .await
    }

    fn sustainable_alternatives(&self, products: &[String], out: &mut Vec<OutboundMessage>) {
        if products.is_empty() {
            out.push(OutboundMessage::text(responses::CLARIFY));
            return;
        }

        for product in products {
            let reply = match self.sustainability.suggest_alternative(product) {
                Some(alternative) => {
                    format!("Absolutely! {}", responses::sustainable_suggestion(alternative))
                }
                None => responses::no_sustainable_alternative(product),
            };
            out.push(OutboundMessage::text(reply));
        }
    }

    //
    // ================= Recipes =================
    //

    async fn recipe_search(
        &self,
        text: &str,
        products: &[String],
        out: &mut Vec<OutboundMessage>,
    ) -> SessionState {
        let mut ingredients = split_ingredients(products);

        if ingredients.is_empty() {
            ingredients = scan_common_ingredients(text);
            if ingredients.is_empty() {
                out.push(OutboundMessage::text(responses::NEED_INGREDIENTS));
                return SessionState::Idle;
            }
            out.push(OutboundMessage::text(format!(
                "Detected ingredients: {}",
                ingredients.join(", ")
            )));
        }

        let label = ingredients.join(", ");
        out.push(OutboundMessage::text(format!(
            "Searching for recipes with: {}",
            label
        )));

        let Some(found) = self.recipes.find_recipes(&ingredients).await else {
            out.push(OutboundMessage::text(format!(
                "Sorry, I couldn't find any recipes for '{}'. Try different ingredients?",
                label
            )));
            return SessionState::Idle;
        };

        let header = match found.source {
            RecipeSource::Local => format!(
                "Found {} recipes! Here are your top choices based on reviews:",
                found.names.len()
            ),
            RecipeSource::Online => format!(
                "I couldn't find any recipes for '{}' in our cookbook, but here are some online recipes:",
                label
            ),
        };

        let candidates = found
            .names
            .into_iter()
            .enumerate()
            .map(|(rank, name)| Candidate {
                label: name.clone(),
                payload: CandidatePayload::Recipe {
                    name,
                    source: found.source,
                },
                rank,
            })
            .collect();

        self.await_selection(header, candidates, SelectionContinuation::RecipeDetail, out)
    }

    async fn dish_ingredients(&self, dish: &str, out: &mut Vec<OutboundMessage>) -> SessionState {
        let Some(found) = self.recipes.dish_ingredients(dish).await else {
            out.push(OutboundMessage::text(format!(
                "Sorry, I couldn't find ingredients for {}. Please try a different dish name.",
                dish
            )));
            return SessionState::Idle;
        };

        let mut listing = match found.source {
            RecipeSource::Local => format!("Found {} in our recipe database!", found.dish_name),
            RecipeSource::Online => format!("Found {} online!", found.dish_name),
        };
        listing.push_str(&format!("\n\nIngredients needed for {}:", found.dish_name));
        for (i, ingredient) in found.ingredients.iter().enumerate() {
            listing.push_str(&format!("\n{:2}. {}", i + 1, ingredient));
        }
        out.push(OutboundMessage::text(listing));

        let pending = PendingConfirmation {
            question: responses::CHECK_STORE_PROMPT.to_string(),
            continuation: ConfirmationContinuation::CheckDishAvailability {
                dish_name: found.dish_name,
                ingredients: found.ingredients,
            },
        };
        out.push(pending.prompt());
        SessionState::AwaitingConfirmation(pending)
    }

    //
    // ================= Pending questions =================
    //

    fn await_selection(
        &self,
        header: String,
        candidates: Vec<Candidate>,
        continuation: SelectionContinuation,
        out: &mut Vec<OutboundMessage>,
    ) -> SessionState {
        match PendingSelection::new(header, candidates, continuation) {
            Some(pending) => {
                debug!(candidates = pending.candidates.len(), "Awaiting selection");
                out.push(pending.prompt());
                SessionState::AwaitingSelection(pending)
            }
            None => {
                out.push(OutboundMessage::text(responses::CLARIFY));
                SessionState::Idle
            }
        }
    }

    async fn resume_selection(
        &self,
        pending: PendingSelection,
        text: &str,
        out: &mut Vec<OutboundMessage>,
    ) -> SessionState {
        match self.disambiguator.on_selection(pending, text) {
            SelectionStep::Reprompt(pending) => {
                out.push(pending.prompt());
                SessionState::AwaitingSelection(pending)
            }
            SelectionStep::Canceled(continuation) => {
                info!("Selection canceled");
                out.push(OutboundMessage::text(continuation.cancel_message()));
                SessionState::Idle
            }
            SelectionStep::Exhausted(_) => {
                info!("Selection retries exhausted");
                out.push(OutboundMessage::text(responses::SELECTION_RETRIES_EXHAUSTED));
                SessionState::Idle
            }
            SelectionStep::Chosen {
                candidate,
                continuation,
            } => self.complete_selection(candidate, continuation, out).await,
        }
    }

    async fn complete_selection(
        &self,
        candidate: Candidate,
        continuation: SelectionContinuation,
        out: &mut Vec<OutboundMessage>,
    ) -> SessionState {
        match (continuation, candidate.payload) {
            (SelectionContinuation::ProductSearch(mut job), CandidatePayload::Inventory(index)) => {
                let product = std::mem::take(&mut job.current);
                let line = match self.inventory.item(index) {
                    Some(item) => responses::selected_item(item),
                    None => responses::not_found(&product),
                };
                job.results.push(line);
                self.collect_alternative(&mut job, &product);
                self.run_product_search(job, out).await
            }
            (SelectionContinuation::RecipeDetail, CandidatePayload::Recipe { name, source }) => {
                out.push(OutboundMessage::text(format!(
                    "Great choice! Fetching the recipe for {}...",
                    name
                )));
                match self.recipes.recipe_details(&name, source).await {
                    Some(details) => out.push(self.aggregator.recipe(details).await),
                    None => out.push(OutboundMessage::text(responses::RECIPE_DETAILS_MISSING)),
                }
                SessionState::Idle
            }
            (_, payload) => {
                warn!(?payload, "Selected candidate does not fit the pending operation");
                out.push(OutboundMessage::text(responses::CLARIFY));
                SessionState::Idle
            }
        }
    }

    async fn resume_confirmation(
        &self,
        pending: PendingConfirmation,
        text: &str,
        out: &mut Vec<OutboundMessage>,
    ) -> SessionState {
        match self.disambiguator.on_confirmation(pending, text) {
            ConfirmationStep::Reprompt(pending) => {
                out.push(pending.reminder());
                SessionState::AwaitingConfirmation(pending)
            }
            ConfirmationStep::Declined(_) => {
                out.push(OutboundMessage::text(responses::DECLINED_STORE_CHECK));
                SessionState::Idle
            }
            ConfirmationStep::Confirmed(ConfirmationContinuation::CheckDishAvailability {
                dish_name,
                ingredients,
            }) => {
                out.push(OutboundMessage::text(responses::CHECKING_STORE));

                let results = ingredients
                    .iter()
                    .map(|ingredient| {
                        let cleaned = clean_ingredient_name(ingredient);
                        let outcome = self.inventory.search_inventory_quick(&cleaned);
                        format!(" {}: {}", ingredient, outcome.describe(&cleaned))
                    })
                    .collect();

                out.push(self.aggregator.dish_availability(&dish_name, results).await);
                SessionState::Idle
            }
        }
    }
}

/// Entities split on commas, trimmed, single characters dropped.
pub fn split_ingredients(products: &[String]) -> Vec<String> {
    products
        .iter()
        .flat_map(|product| product.split(','))
        .map(str::trim)
        .filter(|ingredient| ingredient.chars().count() > 1)
        .map(str::to_string)
        .collect()
}

pub fn scan_common_ingredients(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    COMMON_INGREDIENTS
        .iter()
        .filter(|ingredient| lower.contains(*ingredient))
        .map(|ingredient| ingredient.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::tests::FakeSummarizer;
    use crate::models::{InventoryItem, RecipeDetails, RecipeRecord, SustainableAlternative};
    use crate::resolver::recipe::tests::{recipe, FakeLookup};
    use crate::state::InMemorySessionStore;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Classifier fake: canned intents per message, unknown otherwise.
    #[derive(Default)]
    struct FakeClassifier {
        intents: HashMap<String, ParsedIntent>,
        calls: AtomicUsize,
    }

    impl FakeClassifier {
        fn with(mut self, text: &str, intent: Intent, products: &[&str], filter: &str) -> Self {
            let json = serde_json::json!({
                "intent": intent,
                "product": products,
                "filter": filter,
            });
            self.intents
                .insert(text.to_string(), serde_json::from_value(json).unwrap());
            self
        }
    }

    #[async_trait::async_trait]
    impl IntentClassifier for FakeClassifier {
        async fn classify(&self, text: &str) -> ParsedIntent {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.intents
                .get(text)
                .cloned()
                .unwrap_or_else(ParsedIntent::unknown)
        }
    }

    struct NoAdvice;

    #[async_trait::async_trait]
    impl ProductAdvisor for NoAdvice {
        async fn suggest_products(&self, _query: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    struct Harness {
        orchestrator: Orchestrator,
        classifier: Arc<FakeClassifier>,
        summarizer: Arc<FakeSummarizer>,
    }

    fn row(name: &str, location: &str, quantity: u32) -> InventoryItem {
        InventoryItem {
            name: name.to_string(),
            category: "Fruits & Vegetables".to_string(),
            location: location.to_string(),
            available_quantity: quantity,
            weight_grams: 500.0,
            out_of_stock: false,
        }
    }

    fn stocked(name: &str, category: &str) -> InventoryItem {
        InventoryItem {
            category: category.to_string(),
            ..row(name, "6-a", 10)
        }
    }

    fn harness(
        inventory: Vec<InventoryItem>,
        alternatives: Vec<SustainableAlternative>,
        recipes: Vec<RecipeRecord>,
        classifier: FakeClassifier,
        lookup: FakeLookup,
    ) -> Harness {
        let classifier = Arc::new(classifier);
        // A failing summarizer passes raw lines through, which keeps assertions exact.
        let summarizer = Arc::new(FakeSummarizer {
            fail: true,
            ..FakeSummarizer::default()
        });
        let orchestrator = Orchestrator::new(
            Arc::new(Catalog::new(inventory, alternatives, recipes)),
            Collaborators {
                classifier: classifier.clone(),
                summarizer: summarizer.clone(),
                advisor: Arc::new(NoAdvice),
                recipes: Arc::new(lookup),
            },
            Arc::new(InMemorySessionStore::new()),
            None,
        )
        .unwrap();

        Harness {
            orchestrator,
            classifier,
            summarizer,
        }
    }

    fn onion_shelf() -> Vec<InventoryItem> {
        vec![
            row("Red Onions", "1-a", 12),
            row("White Onions", "1-b", 8),
            row("Spring Onions", "1-c", 5),
            row("Garlic", "1-d", 20),
        ]
    }

    async fn state_of(h: &Harness, session_id: &str) -> SessionState {
        let handle = h.orchestrator.sessions().get(session_id).await.unwrap().unwrap();
        let session = handle.lock().await;
        session.state.clone()
    }

    #[tokio::test]
    async fn test_exact_product_reports_location_quantity_weight() {
        let h = harness(
            vec![row("Onions", "1-a", 12)],
            vec![],
            vec![],
            FakeClassifier::default().with("Do you have onions?", Intent::ProductSearch, &["onions"], ""),
            FakeLookup::default(),
        );

        let turn = h.orchestrator.on_message("s1", "Do you have onions?").await;
        assert!(!turn.ended);
        assert_eq!(turn.messages.len(), 1);
        let text = &turn.messages[0].message;
        assert!(text.contains("1-a"));
        assert!(text.contains("12 units"));
        assert!(text.contains("500g"));
    }

    #[tokio::test]
    async fn test_farewell_skips_intent_classifier() {
        let h = harness(vec![], vec![], vec![], FakeClassifier::default(), FakeLookup::default());

        let turn = h.orchestrator.on_message("s1", "bye").await;
        assert_eq!(h.classifier.calls.load(Ordering::SeqCst), 0);
        assert!(ResponsePools::default()
            .farewell
            .contains(&turn.messages[0].message));
        assert!(!turn.ended);
    }

    #[tokio::test]
    async fn test_recipe_search_with_failing_lookup_reports_nothing_found() {
        let h = harness(
            vec![],
            vec![],
            vec![],
            FakeClassifier::default().with(
                "What can I make with nonexistentitem123?",
                Intent::Recipe,
                &["nonexistentitem123"],
                "",
            ),
            FakeLookup::failing(),
        );

        let turn = h
            .orchestrator
            .on_message("s1", "What can I make with nonexistentitem123?")
            .await;
        let last = turn.messages.last().unwrap();
        assert!(last.message.contains("couldn't find any recipes"));
        assert!(state_of(&h, "s1").await.is_idle());
    }

    #[tokio::test]
    async fn test_disambiguation_reprompts_then_resolves() {
        let h = harness(
            onion_shelf(),
            vec![],
            vec![],
            FakeClassifier::default().with("Do you have onions?", Intent::ProductSearch, &["onions"], ""),
            FakeLookup::default(),
        );

        let first = h.orchestrator.on_message("s1", "Do you have onions?").await;
        let prompt = first.messages[0].clone();
        assert!(prompt.message.contains("1. Red Onions"));
        assert!(prompt.message.contains("3. Spring Onions"));
        assert_eq!(prompt.buttons, vec!["1", "2", "3", "Cancel"]);

        for invalid in ["7", "foo"] {
            let turn = h.orchestrator.on_message("s1", invalid).await;
            assert_eq!(turn.messages, vec![prompt.clone()]);
        }

        let chosen = h.orchestrator.on_message("s1", "2").await;
        assert_eq!(chosen.messages.len(), 1);
        assert!(chosen.messages[0].message.contains("White Onions"));
        assert!(chosen.messages[0].message.contains("1-b"));
        assert!(state_of(&h, "s1").await.is_idle());
        assert_eq!(h.classifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_ends_search_without_summary() {
        let h = harness(
            onion_shelf(),
            vec![],
            vec![],
            FakeClassifier::default().with("onions please", Intent::ProductSearch, &["onions"], ""),
            FakeLookup::default(),
        );

        for cancel in ["0", "CANCEL"] {
            h.orchestrator.on_message("s1", "onions please").await;
            let turn = h.orchestrator.on_message("s1", cancel).await;
            assert_eq!(
                turn.messages,
                vec![OutboundMessage::text(responses::SELECTION_CANCELED)]
            );
            assert!(state_of(&h, "s1").await.is_idle());
        }
        assert_eq!(h.summarizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_multi_product_search_resumes_after_selection() {
        let h = harness(
            onion_shelf(),
            vec![SustainableAlternative {
                original_product: "Garlic".to_string(),
                alternative_name: "Organic Garlic".to_string(),
                aisle: "9-a".to_string(),
            }],
            vec![],
            FakeClassifier::default().with(
                "onions and garlic",
                Intent::ProductSearch,
                &["onions", "garlic"],
                "",
            ),
            FakeLookup::default(),
        );

        let first = h.orchestrator.on_message("s1", "onions and garlic").await;
        assert_eq!(first.messages.len(), 1);

        let done = h.orchestrator.on_message("s1", "1").await;
        assert_eq!(done.messages.len(), 2);
        let summary = &done.messages[0].message;
        assert!(summary.contains("Red Onions"));
        assert!(summary.contains("Garlic"));
        assert!(done.messages[1].message.contains("Organic Garlic"));
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_pending_state() {
        let h = harness(
            onion_shelf(),
            vec![],
            vec![],
            FakeClassifier::default().with("onions", Intent::ProductSearch, &["onions"], ""),
            FakeLookup::default(),
        );

        h.orchestrator.on_message("a", "onions").await;
        h.orchestrator.on_message("b", "onions").await;

        let canceled = h.orchestrator.on_message("b", "cancel").await;
        assert_eq!(canceled.messages[0].message, responses::SELECTION_CANCELED);
        assert!(matches!(
            state_of(&h, "a").await,
            SessionState::AwaitingSelection(_)
        ));

        let chosen = h.orchestrator.on_message("a", "3").await;
        assert!(chosen.messages[0].message.contains("Spring Onions"));
    }

    #[tokio::test]
    async fn test_dish_ingredients_confirmation_flow() {
        let h = harness(
            vec![row("Noodles", "3-b", 30)],
            vec![],
            vec![recipe("Tonkotsu Ramen", r#"c("2 cups noodles", "pork bones")"#, 4.7)],
            FakeClassifier::default().with(
                "What do I need for ramen?",
                Intent::DishIngredients,
                &["ramen"],
                "",
            ),
            FakeLookup::default(),
        );

        let first = h.orchestrator.on_message("s1", "What do I need for ramen?").await;
        assert!(first.messages[0].message.contains("Tonkotsu Ramen"));
        assert!(first.messages[0].message.contains(" 1. 2 cups noodles"));
        assert_eq!(first.messages[1].buttons, vec!["Yes", "No"]);

        let unclear = h.orchestrator.on_message("s1", "maybe").await;
        assert_eq!(unclear.messages[0].message, responses::CONFIRM_REMINDER);

        let checked = h.orchestrator.on_message("s1", "yes").await;
        assert_eq!(checked.messages[0].message, responses::CHECKING_STORE);
        let report = &checked.messages[1].message;
        assert!(report.contains("Tonkotsu Ramen"));
        assert!(report.contains("2 cups noodles: available in aisle 3-b"));
        assert!(state_of(&h, "s1").await.is_idle());
    }

    #[tokio::test]
    async fn test_declining_store_check() {
        let h = harness(
            vec![],
            vec![],
            vec![recipe("Pancakes", r#"["flour", "milk"]"#, 4.0)],
            FakeClassifier::default().with("pancakes?", Intent::DishIngredients, &["pancakes"], ""),
            FakeLookup::default(),
        );

        h.orchestrator.on_message("s1", "pancakes?").await;
        let turn = h.orchestrator.on_message("s1", "No").await;
        assert_eq!(
            turn.messages,
            vec![OutboundMessage::text(responses::DECLINED_STORE_CHECK)]
        );
    }

    #[tokio::test]
    async fn test_recipe_selection_fetches_details() {
        let mut pancakes = recipe("Pancakes", r#"c("flour", "milk", "eggs")"#, 4.5);
        pancakes.instructions = Some("Whisk and fry.".to_string());

        let h = harness(
            vec![],
            vec![],
            vec![pancakes],
            FakeClassifier::default().with("flour and milk ideas", Intent::Recipe, &["flour, milk"], ""),
            FakeLookup::default(),
        );

        let first = h.orchestrator.on_message("s1", "flour and milk ideas").await;
        let prompt = first.messages.last().unwrap();
        assert!(prompt.message.contains("1. Pancakes"));

        let details = h.orchestrator.on_message("s1", "1").await;
        assert!(details.messages[0].message.contains("Fetching the recipe for Pancakes"));
        assert!(details.messages[1].message.contains("Whisk and fry."));
    }

    #[tokio::test]
    async fn test_online_recipe_selection_fetches_details_by_name() {
        let h = harness(
            vec![],
            vec![],
            vec![],
            FakeClassifier::default().with("haddock dinner ideas", Intent::Recipe, &["haddock"], ""),
            FakeLookup {
                by_ingredient: vec!["Kedgeree".to_string()],
                by_name: Some(RecipeDetails {
                    name: "Kedgeree".to_string(),
                    ingredients: vec!["smoked haddock".to_string(), "rice".to_string()],
                    instructions: "Poach the fish and fold into the rice.".to_string(),
                }),
                ..FakeLookup::default()
            },
        );

        let first = h.orchestrator.on_message("s1", "haddock dinner ideas").await;
        let prompt = first.messages.last().unwrap();
        assert!(prompt.message.contains("online recipes"));
        assert!(prompt.message.contains("1. Kedgeree"));

        let details = h.orchestrator.on_message("s1", "1").await;
        assert!(details.messages[0].message.contains("Fetching the recipe for Kedgeree"));
        assert!(details.messages[1].message.contains("smoked haddock"));
        assert!(details.messages[1].message.contains("Poach the fish"));
        assert!(state_of(&h, "s1").await.is_idle());
    }

    #[tokio::test]
    async fn test_category_search_lists_detected_category() {
        let h = harness(
            vec![
                stocked("Tortilla Chips", "Munchies"),
                stocked("Salted Peanuts", "Munchies"),
                row("Onions", "1-a", 12),
            ],
            vec![],
            vec![],
            FakeClassifier::default().with("show me your snacks", Intent::CategorySearch, &["snacks"], ""),
            FakeLookup::default(),
        );

        let turn = h.orchestrator.on_message("s1", "show me your snacks").await;
        assert_eq!(turn.messages.len(), 1);
        let text = &turn.messages[0].message;
        assert!(text.contains("Munchies section"));
        assert!(text.contains("Tortilla Chips"));
        assert!(text.contains("Salted Peanuts"));
        assert!(!text.contains("Onions"));
    }

    #[tokio::test]
    async fn test_category_search_without_category_looks_up_products() {
        let h = harness(
            vec![stocked("Saffron Threads", "Spices")],
            vec![SustainableAlternative {
                original_product: "Saffron Threads".to_string(),
                alternative_name: "Fair Trade Saffron".to_string(),
                aisle: "8-c".to_string(),
            }],
            vec![],
            FakeClassifier::default()
                .with("saffron section?", Intent::CategorySearch, &["saffron"], "")
                .with("browse a section", Intent::CategorySearch, &[], ""),
            FakeLookup::default(),
        );

        let turn = h.orchestrator.on_message("s1", "saffron section?").await;
        assert_eq!(turn.messages.len(), 1);
        assert!(turn.messages[0].message.contains("Saffron Threads"));
        assert!(!turn.messages[0].message.contains("Fair Trade"));

        let vague = h.orchestrator.on_message("s1", "browse a section").await;
        assert_eq!(
            vague.messages,
            vec![OutboundMessage::text(responses::CATEGORY_CLARIFY)]
        );
    }

    #[tokio::test]
    async fn test_category_list_counts_items() {
        let h = harness(
            vec![
                row("Onions", "1-a", 12),
                stocked("Tortilla Chips", "Munchies"),
                row("Garlic", "1-d", 20),
            ],
            vec![],
            vec![],
            FakeClassifier::default().with("what sections do you have?", Intent::CategoryList, &[], ""),
            FakeLookup::default(),
        );

        let turn = h.orchestrator.on_message("s1", "what sections do you have?").await;
        let text = &turn.messages[0].message;
        assert!(text.contains("Fruits & Vegetables (2 items)"));
        assert!(text.contains("Munchies (1 items)"));

        let empty = harness(
            vec![],
            vec![],
            vec![],
            FakeClassifier::default().with("what sections do you have?", Intent::CategoryList, &[], ""),
            FakeLookup::default(),
        );
        let turn = empty.orchestrator.on_message("s1", "what sections do you have?").await;
        assert_eq!(turn.messages, vec![OutboundMessage::text(responses::EMPTY_CATALOG)]);
    }

    #[tokio::test]
    async fn test_sustainability_answers_each_product() {
        let straws = SustainableAlternative {
            original_product: "Plastic Straws".to_string(),
            alternative_name: "Bamboo Straws".to_string(),
            aisle: "5-d".to_string(),
        };
        let h = harness(
            vec![],
            vec![straws.clone()],
            vec![],
            FakeClassifier::default().with(
                "eco-friendly straws and napkins?",
                Intent::Sustainability,
                &["straws", "napkins"],
                "eco",
            ),
            FakeLookup::default(),
        );

        let turn = h
            .orchestrator
            .on_message("s1", "eco-friendly straws and napkins?")
            .await;
        assert_eq!(
            turn.messages,
            vec![
                OutboundMessage::text(format!(
                    "Absolutely! {}",
                    responses::sustainable_suggestion(&straws)
                )),
                OutboundMessage::text(responses::no_sustainable_alternative("napkins")),
            ]
        );
    }

    #[tokio::test]
    async fn test_suggestion_uses_theme_terms() {
        let h = harness(
            vec![
                row("Tortilla Chips", "6-a", 22),
                row("Club Soda", "6-b", 10),
                row("Onions", "1-a", 12),
            ],
            vec![],
            vec![],
            FakeClassifier::default()
                .with("planning a party", Intent::Suggestion, &[], "party")
                .with("ideas for a picnic", Intent::Suggestion, &[], ""),
            FakeLookup::default(),
        );

        let turn = h.orchestrator.on_message("s1", "planning a party").await;
        let text = &turn.messages[0].message;
        assert!(text.starts_with("For your 'party' theme"));
        assert!(text.contains("Tortilla Chips (in 6-a)"));
        assert!(text.contains("Club Soda (in 6-b)"));
        assert!(!text.contains("Onions"));

        let nothing = h.orchestrator.on_message("s1", "ideas for a picnic").await;
        assert_eq!(
            nothing.messages,
            vec![OutboundMessage::text(responses::NO_RECOMMENDATIONS)]
        );
    }

    #[tokio::test]
    async fn test_conversational_splits_personal_from_off_topic() {
        let h = harness(
            vec![],
            vec![],
            vec![],
            FakeClassifier::default()
                .with("who are you", Intent::Conversational, &[], "")
                .with("tell me a joke", Intent::Conversational, &[], ""),
            FakeLookup::default(),
        );
        let pools = ResponsePools::default();

        let personal = h.orchestrator.on_message("s1", "who are you").await;
        assert!(pools.personal.contains(&personal.messages[0].message));

        let chatter = h.orchestrator.on_message("s1", "tell me a joke").await;
        assert!(pools.off_topic.contains(&chatter.messages[0].message));
        assert_eq!(h.classifier.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exit_ends_and_removes_session() {
        let h = harness(onion_shelf(), vec![], vec![], FakeClassifier::default(), FakeLookup::default());

        h.orchestrator.open_session("s1").await;
        let turn = h.orchestrator.on_message("s1", "Exit").await;
        assert!(turn.ended);
        assert_eq!(turn.messages[0].message, responses::EXIT);
        assert_eq!(h.orchestrator.sessions().len().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_intent_asks_for_clarification() {
        let h = harness(vec![], vec![], vec![], FakeClassifier::default(), FakeLookup::default());
        let turn = h.orchestrator.on_message("s1", "purple monkey dishwasher").await;
        assert_eq!(turn.messages, vec![OutboundMessage::text(responses::CLARIFY)]);
    }

    #[test]
    fn test_recipe_entity_cleanup() {
        let products = vec!["rice, chicken".to_string(), "x".to_string(), " ".to_string()];
        assert_eq!(split_ingredients(&products), vec!["rice", "chicken"]);
        assert_eq!(
            scan_common_ingredients("Got any ideas with Garlic and pasta?"),
            vec!["garlic", "pasta"]
        );
        assert!(scan_common_ingredients("surprise me").is_empty());
    }

    #[test]
    fn test_open_session_welcomes() {
        let h = harness(vec![], vec![], vec![], FakeClassifier::default(), FakeLookup::default());
        let welcome = tokio_test::block_on(h.orchestrator.open_session("s1"));
        assert_eq!(welcome, vec![OutboundMessage::text(responses::WELCOME)]);
    }
}
