//! OpenRouter chat-completions client
//!
//! Backs all three NLU contracts with one pooled reqwest::Client.

use crate::error::AssistantError;
use crate::models::ParsedIntent;
use crate::nlu::{IntentClassifier, ProductAdvisor, ResponseSummarizer, SummaryRequest};
use crate::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const REFERER: &str = "http://localhost";
const APP_TITLE: &str = "SAM-AI";

pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(api_key: String, base_url: &str, model: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    /// Send one user prompt, return the first choice's text.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(AssistantError::LlmError(
                "OPENROUTER_API_KEY not configured".to_string(),
            ));
        }

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!(model = %self.model, "Calling chat completions");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", APP_TITLE)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Chat completion request failed: {}", e);
                AssistantError::LlmError(format!("request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Chat completion error response: {} {}", status, error_text);
            return Err(AssistantError::LlmError(format!("{}: {}", status, error_text)));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::LlmError(format!("parse error: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AssistantError::LlmError("empty choices".to_string()))
    }

    async fn try_classify(&self, text: &str) -> Result<ParsedIntent> {
        let content = self.complete(&intent_prompt(text)).await?;
        let json = extract_json(&content, '{', '}').ok_or_else(|| {
            AssistantError::ClassificationFailure(format!("no JSON object in: {}", content))
        })?;
        Ok(serde_json::from_str(json)?)
    }
}

#[async_trait::async_trait]
impl IntentClassifier for OpenRouterClient {
    async fn classify(&self, text: &str) -> ParsedIntent {
        match self.try_classify(text).await {
            Ok(parsed) => {
                info!(intent = %parsed.intent, "Intent classified");
                parsed
            }
            Err(e) => {
                warn!("Intent classification failed, using unknown intent: {}", e);
                ParsedIntent::unknown()
            }
        }
    }
}

#[async_trait::async_trait]
impl ResponseSummarizer for OpenRouterClient {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String> {
        let content = self.complete(&summary_prompt(request)).await?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(AssistantError::SummarizerFailure("empty summary".to_string()));
        }
        Ok(trimmed.to_string())
    }
}

#[async_trait::async_trait]
impl ProductAdvisor for OpenRouterClient {
    async fn suggest_products(&self, query: &str) -> Result<Vec<String>> {
        let content = self.complete(&advice_prompt(query)).await?;
        let json = extract_json(&content, '[', ']').ok_or_else(|| {
            AssistantError::LlmError(format!("no JSON array in: {}", content))
        })?;
        Ok(serde_json::from_str(json)?)
    }
}

/// Models sometimes wrap the payload in prose or a ```json fence; take the
/// outermost `open`..`close` span.
fn extract_json(content: &str, open: char, close: char) -> Option<&str> {
    let start = content.find(open)?;
    let end = content.rfind(close)?;
    (end > start).then(|| &content[start..=end])
}

fn intent_prompt(query: &str) -> String {
    format!(
        r#"You are a smart shopping assistant. Analyze the user's query and return a minified JSON object with:
- "intent": one of product_search, category_search, category_list, recipe, dish_ingredients, suggestion, sustainability, greeting, farewell, thank_you, personal, conversational, inappropriate
- "product": the product name, or a list of names when several are mentioned. For recipe queries list each ingredient separately.
- "filter": extra context such as an event ("diwali"), a theme ("healthy") or a quality ("eco-friendly"), else "".

Examples:
"Do you have onions?" -> {{"intent":"product_search","product":"onions","filter":""}}
"Show me snacks" -> {{"intent":"category_search","product":"snacks","filter":""}}
"What categories do you have?" -> {{"intent":"category_list","product":"","filter":""}}
"What can I make with rice and chicken?" -> {{"intent":"recipe","product":["rice","chicken"],"filter":""}}
"What do I need for ramen?" -> {{"intent":"dish_ingredients","product":"ramen","filter":""}}
"Suggest something for a birthday" -> {{"intent":"suggestion","product":"","filter":"birthday"}}
"Any eco-friendly plates?" -> {{"intent":"sustainability","product":"plates","filter":"eco-friendly"}}
"Who are you?" -> {{"intent":"personal","product":"","filter":""}}

User query: "{}"

Return only the JSON object, no markdown."#,
        query
    )
}

fn summary_prompt(request: &SummaryRequest) -> String {
    match request {
        SummaryRequest::Inventory { results } => format!(
            r#"You are a friendly shopping assistant. Summarize these inventory search results into one short conversational reply, mentioning every item and where to find it. If something was not found, say so. End with a relevant follow-up question.

Search results:
{}"#,
            results.join("\n")
        ),
        SummaryRequest::DishAvailability { dish, results } => format!(
            r#"You are a helpful shopping assistant. The user asked about ingredients for "{}".
Give a SHORT summary in 3-4 bullet points: how many ingredients are available in store, where the available ones are, and alternatives only for critical missing items.

Inventory results:
{}"#,
            dish,
            results.join("\n")
        ),
        SummaryRequest::Recipe { details } => format!(
            r#"You are a helpful cooking assistant. Format this recipe clearly so the user can start cooking right away, with the ingredients and the instructions. Return only the formatted recipe.

Recipe (JSON):
{}"#,
            serde_json::to_string_pretty(details).unwrap_or_else(|_| request.raw_text())
        ),
    }
}

fn advice_prompt(query: &str) -> String {
    format!(
        r#"You are a shopping assistant. Suggest 3-5 relevant grocery products for the user's request.
Return ONLY a minified JSON array of strings, e.g. ["popcorn","soda","candy"].

User query: "{}""#,
        query
    )
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Intent;

    fn completion(content: &str) -> String {
        serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })
        .to_string()
    }

    fn client(base_url: &str, key: &str) -> OpenRouterClient {
        OpenRouterClient::new(
            key.to_string(),
            base_url,
            "test-model".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "test-model",
            messages: vec![ChatMessage {
                role: "user",
                content: "Do you have onions?",
            }],
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("Do you have onions?"));
        assert!(json.contains("\"role\":\"user\""));
    }

    #[test]
    fn test_extract_json_handles_fences_and_prose() {
        let fenced = "```json\n{\"intent\":\"recipe\"}\n```";
        assert_eq!(extract_json(fenced, '{', '}'), Some("{\"intent\":\"recipe\"}"));
        assert_eq!(
            extract_json("Sure! [\"chips\",\"soda\"] enjoy", '[', ']'),
            Some("[\"chips\",\"soda\"]")
        );
        assert_eq!(extract_json("no payload", '{', '}'), None);
    }

    #[tokio::test]
    async fn test_classify_parses_model_output() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion(
                "```json\n{\"intent\":\"recipe\",\"product\":[\"rice\",\"chicken\"],\"filter\":\"\"}\n```",
            ))
            .create_async()
            .await;

        let parsed = client(&server.url(), "secret").classify("rice and chicken ideas").await;
        assert_eq!(parsed.intent, Intent::Recipe);
        assert_eq!(parsed.products(), vec!["rice", "chicken"]);
    }

    #[tokio::test]
    async fn test_classify_degrades_on_malformed_payload() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(completion("I think they want onions"))
            .create_async()
            .await;

        let parsed = client(&server.url(), "secret").classify("onions").await;
        assert_eq!(parsed, ParsedIntent::unknown());
    }

    #[tokio::test]
    async fn test_classify_degrades_when_unreachable_or_unconfigured() {
        let unreachable = client("http://127.0.0.1:1", "secret");
        assert_eq!(unreachable.classify("onions").await, ParsedIntent::unknown());

        let unconfigured = client("http://127.0.0.1:1", "");
        assert_eq!(unconfigured.classify("onions").await, ParsedIntent::unknown());
    }

    #[tokio::test]
    async fn test_summarize_and_suggest() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(completion("  [\"popcorn\", \"soda\"]  "))
            .create_async()
            .await;

        let client = client(&server.url(), "secret");
        let ideas = client.suggest_products("movie night").await.unwrap();
        assert_eq!(ideas, vec!["popcorn", "soda"]);

        let summary = client
            .summarize(&SummaryRequest::Inventory {
                results: vec!["Onions in 1-a".to_string()],
            })
            .await
            .unwrap();
        assert_eq!(summary, "[\"popcorn\", \"soda\"]");
    }

    #[tokio::test]
    async fn test_server_error_is_llm_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let err = client(&server.url(), "secret")
            .summarize(&SummaryRequest::Inventory { results: vec![] })
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::LlmError(_)));
    }
}
