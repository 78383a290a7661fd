//! Disambiguation state machine
//!
//! A session is either idle or waiting on one follow-up answer. The pending
//! variants own everything needed to finish the interrupted operation, so a
//! later turn resumes it with plain pattern matching.

use crate::models::{Candidate, OutboundMessage};
use crate::responses;
use std::collections::VecDeque;
use tracing::debug;

pub const CANCEL_BUTTON: &str = "Cancel";
pub const YES_VARIANTS: &[&str] = &["yes", "y", "yeah", "yep", "sure"];
pub const NO_VARIANTS: &[&str] = &["no", "n", "nope", "nah"];

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingSelection(PendingSelection),
    AwaitingConfirmation(PendingConfirmation),
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingSelection(_) => "awaiting_selection",
            SessionState::AwaitingConfirmation(_) => "awaiting_confirmation",
        }
    }
}

/// A product search interrupted by an ambiguous product. `current` is the
/// product whose candidates are on screen; `pending` still has to be searched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductSearchJob {
    pub current: String,
    pub pending: VecDeque<String>,
    pub results: Vec<String>,
    pub alternatives: Vec<String>,
    pub filter: String,
    /// Gather sustainable alternatives for each product as it resolves.
    pub proactive: bool,
}

impl ProductSearchJob {
    pub fn new(products: Vec<String>, filter: impl Into<String>) -> Self {
        Self {
            pending: products.into(),
            filter: filter.into(),
            proactive: true,
            ..Self::default()
        }
    }

    /// Plain lookups with no alternatives, used when browsing falls back to
    /// a product search.
    pub fn lookup_only(products: Vec<String>) -> Self {
        Self {
            pending: products.into(),
            ..Self::default()
        }
    }

    /// Proactive suggestions are skipped when the user already asked for
    /// sustainable products.
    pub fn wants_alternatives(&self) -> bool {
        let filter = self.filter.to_lowercase();
        self.proactive && !filter.contains("eco") && !filter.contains("sustain")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionContinuation {
    ProductSearch(ProductSearchJob),
    /// Fetch and present the chosen recipe.
    RecipeDetail,
}

impl SelectionContinuation {
    pub fn cancel_message(&self) -> &'static str {
        match self {
            SelectionContinuation::ProductSearch(_) => responses::SELECTION_CANCELED,
            SelectionContinuation::RecipeDetail => responses::RECIPE_SELECTION_CANCELED,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmationContinuation {
    CheckDishAvailability {
        dish_name: String,
        ingredients: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingSelection {
    pub header: String,
    pub candidates: Vec<Candidate>,
    pub continuation: SelectionContinuation,
    pub attempts: u32,
}

impl PendingSelection {
    /// `None` for an empty list: nothing to choose from is never shown.
    pub fn new(
        header: impl Into<String>,
        candidates: Vec<Candidate>,
        continuation: SelectionContinuation,
    ) -> Option<Self> {
        if candidates.is_empty() {
            return None;
        }
        Some(Self {
            header: header.into(),
            candidates,
            continuation,
            attempts: 0,
        })
    }

    pub fn prompt(&self) -> OutboundMessage {
        selection_prompt(&self.header, &self.candidates)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingConfirmation {
    pub question: String,
    pub continuation: ConfirmationContinuation,
}

impl PendingConfirmation {
    pub fn prompt(&self) -> OutboundMessage {
        OutboundMessage::with_buttons(self.question.clone(), yes_no_buttons())
    }

    pub fn reminder(&self) -> OutboundMessage {
        OutboundMessage::with_buttons(responses::CONFIRM_REMINDER, yes_no_buttons())
    }
}

fn yes_no_buttons() -> Vec<String> {
    vec!["Yes".to_string(), "No".to_string()]
}

//
// ================= Reply parsing =================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionReply {
    Cancel,
    /// 0-based index into the candidate list
    Choose(usize),
    Invalid,
}

pub fn parse_selection(input: &str, len: usize) -> SelectionReply {
    let input = input.trim();
    if input.eq_ignore_ascii_case("cancel") {
        return SelectionReply::Cancel;
    }

    match input.parse::<usize>() {
        Ok(0) => SelectionReply::Cancel,
        Ok(k) if k <= len => SelectionReply::Choose(k - 1),
        _ => SelectionReply::Invalid,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationReply {
    Yes,
    No,
    Invalid,
}

pub fn parse_confirmation(input: &str) -> ConfirmationReply {
    let answer = input.trim().to_lowercase();
    if YES_VARIANTS.contains(&answer.as_str()) {
        ConfirmationReply::Yes
    } else if NO_VARIANTS.contains(&answer.as_str()) {
        ConfirmationReply::No
    } else {
        ConfirmationReply::Invalid
    }
}

/// Numbered list in candidate order, with matching quick-reply buttons.
pub fn selection_prompt(header: &str, candidates: &[Candidate]) -> OutboundMessage {
    let mut text = format!("{}\n", header);
    for (i, candidate) in candidates.iter().enumerate() {
        text.push_str(&format!("\n{}. {}", i + 1, candidate.label));
    }
    text.push_str("\n\nReply with a number to choose, or 0 to cancel.");

    let mut buttons: Vec<String> = (1..=candidates.len()).map(|i| i.to_string()).collect();
    buttons.push(CANCEL_BUTTON.to_string());

    OutboundMessage::with_buttons(text, buttons)
}

//
// ================= Transitions =================
//

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionStep {
    Canceled(SelectionContinuation),
    Chosen {
        candidate: Candidate,
        continuation: SelectionContinuation,
    },
    /// Same list again; the session keeps waiting.
    Reprompt(PendingSelection),
    /// Retry cap reached; treated like a cancellation.
    Exhausted(SelectionContinuation),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmationStep {
    Confirmed(ConfirmationContinuation),
    Declined(ConfirmationContinuation),
    Reprompt(PendingConfirmation),
}

#[derive(Debug, Clone, Default)]
pub struct Disambiguator {
    max_retries: Option<u32>,
}

impl Disambiguator {
    /// `None` keeps re-prompting forever.
    pub fn new(max_retries: Option<u32>) -> Self {
        Self { max_retries }
    }

    pub fn on_selection(&self, mut pending: PendingSelection, input: &str) -> SelectionStep {
        match parse_selection(input, pending.candidates.len()) {
            SelectionReply::Cancel => SelectionStep::Canceled(pending.continuation),
            SelectionReply::Choose(index) => {
                let candidate = pending.candidates.swap_remove(index);
                SelectionStep::Chosen {
                    candidate,
                    continuation: pending.continuation,
                }
            }
            SelectionReply::Invalid => {
                pending.attempts += 1;
                debug!(attempts = pending.attempts, "Invalid selection");
                match self.max_retries {
                    Some(max) if pending.attempts >= max => {
                        SelectionStep::Exhausted(pending.continuation)
                    }
                    _ => SelectionStep::Reprompt(pending),
                }
            }
        }
    }

    pub fn on_confirmation(&self, pending: PendingConfirmation, input: &str) -> ConfirmationStep {
        match parse_confirmation(input) {
            ConfirmationReply::Yes => ConfirmationStep::Confirmed(pending.continuation),
            ConfirmationReply::No => ConfirmationStep::Declined(pending.continuation),
            ConfirmationReply::Invalid => ConfirmationStep::Reprompt(pending),
        }
    }
}
