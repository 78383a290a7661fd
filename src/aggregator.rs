//! Response aggregation
//!
//! Collects raw resolver lines into outbound messages. Phrasing is delegated
//! to the summarizer; when it fails the raw lines go out verbatim.

use crate::models::{OutboundMessage, RecipeDetails};
use crate::nlu::{ResponseSummarizer, SummaryRequest};
use crate::responses;
use std::sync::Arc;
use tracing::warn;

pub struct ResponseAggregator {
    summarizer: Arc<dyn ResponseSummarizer>,
}

impl ResponseAggregator {
    pub fn new(summarizer: Arc<dyn ResponseSummarizer>) -> Self {
        Self { summarizer }
    }

    pub async fn phrase(&self, request: &SummaryRequest) -> String {
        match self.summarizer.summarize(request).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Summarizer failed, sending raw results: {}", e);
                request.raw_text()
            }
        }
    }

    /// Summary of a product search, followed by a separate message for any
    /// sustainable alternatives gathered along the way.
    pub async fn inventory_summary(
        &self,
        results: Vec<String>,
        alternatives: Vec<String>,
    ) -> Vec<OutboundMessage> {
        let mut messages = Vec::new();

        if !results.is_empty() {
            let text = self.phrase(&SummaryRequest::Inventory { results }).await;
            messages.push(OutboundMessage::text(text));
        }

        if !alternatives.is_empty() {
            messages.push(OutboundMessage::text(format!(
                "{}\n{}",
                responses::SUSTAINABLE_HEADER,
                alternatives.join("\n")
            )));
        }

        messages
    }

    pub async fn dish_availability(&self, dish: &str, results: Vec<String>) -> OutboundMessage {
        let request = SummaryRequest::DishAvailability {
            dish: dish.to_string(),
            results,
        };
        OutboundMessage::text(format!("💬 {}", self.phrase(&request).await))
    }

    pub async fn recipe(&self, details: RecipeDetails) -> OutboundMessage {
        OutboundMessage::text(self.phrase(&SummaryRequest::Recipe { details }).await)
    }
}
