pub mod engine;
pub mod schema;
pub mod states;

pub use engine::{DialogueEngine, DialogueError, ONBOARDING_MESSAGE};
pub use schema::{
    descriptor, next_applicable_slot, parse_area, parse_count, SlotDescriptor, SlotRejection,
    SlotRule, SLOTS,
};
pub use states::{ConversationPhase, Turn, TurnOutcome};
