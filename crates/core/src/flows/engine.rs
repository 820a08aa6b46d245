use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::session::SessionState;
use crate::domain::slot::{SlotKey, SlotValue};
use crate::flows::schema::{next_applicable_slot, parse_count, SlotRejection};
use crate::flows::states::{ConversationPhase, Turn, TurnOutcome};
use crate::pricing::{format_currency, PricePredictor, PredictorError};

pub const ONBOARDING_MESSAGE: &str = "Hi! I will help you predict your house price based on \
     square area, number of bedrooms, and number of bathrooms. Let's get started! \
     How many people are in your family?";
pub const INTEREST_QUESTION: &str = "Are you interested? (Yes/No)";
pub const INTEREST_REPROMPT: &str =
    "Please answer 'Yes' if you are interested, or 'No' to adjust your preferences.";
pub const REVISION_PROMPT: &str = "Let's adjust your preferences. How many bedrooms do you need?";
pub const REVISION_ERROR: &str = "Please enter a valid number for bedrooms.";
pub const DEFAULT_PURCHASE_URL: &str = "https://example.com/purchase";

const GREETING_KEYWORDS: [&str; 3] = ["hi", "hello", "start"];

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DialogueError {
    #[error("no applicable slot remains but no estimate has been recorded")]
    NoApplicableSlot,
    #[error("prediction attempted with incomplete features, missing {missing:?}")]
    Consistency { missing: Vec<SlotKey> },
    #[error(transparent)]
    Predictor(#[from] PredictorError),
}

impl DialogueError {
    /// Schema faults, as opposed to failures of the external predictor.
    pub fn is_internal_fault(&self) -> bool {
        matches!(self, Self::NoApplicableSlot | Self::Consistency { .. })
    }
}

/// Drives one conversation turn at a time.
///
/// The engine owns no session state: every call receives the prior state and
/// returns the next one, leaving persistence and per-session ordering to the
/// caller. Failed turns return an error and the caller keeps the prior state.
pub struct DialogueEngine<P> {
    predictor: P,
    purchase_url: String,
}

impl<P> DialogueEngine<P>
where
    P: PricePredictor,
{
    pub fn new(predictor: P) -> Self {
        Self { predictor, purchase_url: DEFAULT_PURCHASE_URL.to_string() }
    }

    pub fn with_purchase_url(mut self, purchase_url: impl Into<String>) -> Self {
        self.purchase_url = purchase_url.into();
        self
    }

    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    pub fn handle(&self, state: &SessionState, utterance: &str) -> Result<Turn, DialogueError> {
        let normalized = utterance.trim().to_lowercase();

        if is_greeting(&normalized) {
            return Ok(Turn {
                state: SessionState::new(),
                reply: ONBOARDING_MESSAGE.to_string(),
                outcome: TurnOutcome::GreetingReset,
            });
        }

        match ConversationPhase::of(state) {
            ConversationPhase::Greeting | ConversationPhase::Collecting(_) => {
                self.collect(state, &normalized)
            }
            ConversationPhase::AwaitingInterest => Ok(self.resolve_interest(state, &normalized)),
            ConversationPhase::Revising => self.revise(state, &normalized),
            ConversationPhase::Inconsistent => Err(DialogueError::NoApplicableSlot),
        }
    }

    pub fn handle_with_audit<S>(
        &self,
        state: &SessionState,
        utterance: &str,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<Turn, DialogueError>
    where
        S: AuditSink + ?Sized,
    {
        let phase = ConversationPhase::of(state);
        let result = self.handle(state, utterance);
        match &result {
            Ok(turn) => {
                let (category, outcome) = match &turn.outcome {
                    TurnOutcome::EstimateProduced { .. } => {
                        (AuditCategory::Prediction, AuditOutcome::Success)
                    }
                    other if other.is_rejection() => {
                        (AuditCategory::Dialogue, AuditOutcome::Rejected)
                    }
                    _ => (AuditCategory::Dialogue, AuditOutcome::Success),
                };
                let mut event =
                    AuditEvent::new(audit, turn.outcome.event_name(), category, outcome)
                        .with_metadata("from_phase", phase.as_str())
                        .with_metadata("to_phase", turn.phase().as_str());
                match &turn.outcome {
                    TurnOutcome::SlotAccepted { slot }
                    | TurnOutcome::SlotRejected { slot }
                    | TurnOutcome::AdvisoryRejected { slot, .. } => {
                        event = event.with_metadata("slot", slot.as_str());
                    }
                    TurnOutcome::EstimateProduced { price, revision, .. } => {
                        event = event
                            .with_metadata("price", price.to_string())
                            .with_metadata("revision", revision.to_string());
                    }
                    _ => {}
                }
                sink.emit(event);
            }
            Err(error) => {
                let category = if error.is_internal_fault() {
                    AuditCategory::System
                } else {
                    AuditCategory::Prediction
                };
                sink.emit(
                    AuditEvent::new(audit, "dialogue.turn_failed", category, AuditOutcome::Failed)
                        .with_metadata("from_phase", phase.as_str())
                        .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }

    fn collect(&self, state: &SessionState, utterance: &str) -> Result<Turn, DialogueError> {
        let slot = next_applicable_slot(state).ok_or(DialogueError::NoApplicableSlot)?;

        let value = match slot.validate(state, utterance) {
            Ok(value) => value,
            Err(rejection) => return Ok(rejected(state, rejection)),
        };

        let mut next = state.clone();
        slot.accept(&mut next, value);

        match next_applicable_slot(&next) {
            Some(following) => Ok(Turn {
                reply: following.prompt_for(&next).to_string(),
                outcome: TurnOutcome::SlotAccepted { slot: slot.key },
                state: next,
            }),
            None => self.estimate(next, false),
        }
    }

    fn resolve_interest(&self, state: &SessionState, utterance: &str) -> Turn {
        if utterance.contains("yes") {
            return Turn {
                state: state.clone(),
                reply: format!(
                    "Great! Let's proceed with the next steps for purchasing. \
                     Click here to continue: [Proceed to Purchase]({})",
                    self.purchase_url
                ),
                outcome: TurnOutcome::PurchaseContinued,
            };
        }

        if utterance.contains("no") {
            let mut next = state.clone();
            next.awaiting_revision = true;
            return Turn {
                state: next,
                reply: REVISION_PROMPT.to_string(),
                outcome: TurnOutcome::RevisionRequested,
            };
        }

        Turn {
            state: state.clone(),
            reply: INTEREST_REPROMPT.to_string(),
            outcome: TurnOutcome::InterestUnclear,
        }
    }

    fn revise(&self, state: &SessionState, utterance: &str) -> Result<Turn, DialogueError> {
        let Some(bedrooms) = parse_count(utterance) else {
            return Ok(Turn {
                state: state.clone(),
                reply: REVISION_ERROR.to_string(),
                outcome: TurnOutcome::RevisionRejected,
            });
        };

        let mut next = state.clone();
        next.insert(SlotKey::BedroomAbvGr, SlotValue::Count(bedrooms));
        self.estimate(next, true)
    }

    fn estimate(&self, mut next: SessionState, revision: bool) -> Result<Turn, DialogueError> {
        let features = next
            .prediction_input()
            .map_err(|missing| DialogueError::Consistency { missing })?;
        let price = self.predictor.predict(&features)?;

        next.predicted_price = Some(price);
        next.awaiting_revision = false;

        let lead =
            if revision { "The new estimated house price is" } else { "The estimated house price is" };
        Ok(Turn {
            reply: format!("{lead} {}. {INTEREST_QUESTION}", format_currency(price)),
            outcome: TurnOutcome::EstimateProduced { price, features, revision },
            state: next,
        })
    }
}

pub fn is_greeting(normalized: &str) -> bool {
    GREETING_KEYWORDS.iter().any(|keyword| normalized.contains(keyword))
}

fn rejected(state: &SessionState, rejection: SlotRejection) -> Turn {
    let outcome = match rejection {
        SlotRejection::Parse { slot, .. } => TurnOutcome::SlotRejected { slot },
        SlotRejection::Advisory { slot, minimum, .. } => {
            TurnOutcome::AdvisoryRejected { slot, minimum }
        }
    };
    Turn { state: state.clone(), reply: rejection.message().to_string(), outcome }
}
