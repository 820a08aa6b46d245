use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::session::SessionState;
use crate::domain::slot::SlotKey;
use crate::flows::schema::next_applicable_slot;
use crate::pricing::PredictionInput;

/// Where a conversation stands, reconstructed from its state alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "slot", rename_all = "snake_case")]
pub enum ConversationPhase {
    /// Nothing answered yet.
    Greeting,
    Collecting(SlotKey),
    /// An estimate was shown and the user has not declined it.
    AwaitingInterest,
    /// The user declined the estimate; the next number revises the bedroom count.
    Revising,
    /// Every slot is filled but no estimate is recorded.
    Inconsistent,
}

impl ConversationPhase {
    pub fn of(state: &SessionState) -> Self {
        if state.is_empty() {
            return Self::Greeting;
        }

        if state.predicted_price.is_some() {
            return if state.awaiting_revision { Self::Revising } else { Self::AwaitingInterest };
        }

        match next_applicable_slot(state) {
            Some(slot) => Self::Collecting(slot.key),
            None => Self::Inconsistent,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Collecting(_) => "collecting",
            Self::AwaitingInterest => "awaiting_interest",
            Self::Revising => "revising",
            Self::Inconsistent => "inconsistent",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnOutcome {
    GreetingReset,
    SlotAccepted { slot: SlotKey },
    SlotRejected { slot: SlotKey },
    AdvisoryRejected { slot: SlotKey, minimum: u32 },
    EstimateProduced { price: Decimal, features: PredictionInput, revision: bool },
    PurchaseContinued,
    RevisionRequested,
    InterestUnclear,
    RevisionRejected,
}

impl TurnOutcome {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::GreetingReset => "dialogue.greeting_reset",
            Self::SlotAccepted { .. } => "dialogue.slot_accepted",
            Self::SlotRejected { .. } | Self::RevisionRejected => "dialogue.slot_rejected",
            Self::AdvisoryRejected { .. } => "dialogue.advisory_rejected",
            Self::EstimateProduced { .. } => "dialogue.estimate_produced",
            Self::PurchaseContinued => "dialogue.purchase_continued",
            Self::RevisionRequested => "dialogue.revision_requested",
            Self::InterestUnclear => "dialogue.interest_unclear",
        }
    }

    /// True when the turn left the state exactly as it found it.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::SlotRejected { .. }
                | Self::AdvisoryRejected { .. }
                | Self::RevisionRejected
                | Self::InterestUnclear
        )
    }
}

/// Result of one `handle` call: the state to persist and the text to show.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub state: SessionState,
    pub reply: String,
    pub outcome: TurnOutcome,
}

impl Turn {
    pub fn phase(&self) -> ConversationPhase {
        ConversationPhase::of(&self.state)
    }
}
