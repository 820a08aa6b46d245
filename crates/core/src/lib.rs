pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod pricing;

pub use audit::{AuditContext, AuditEvent, AuditSink, InMemoryAuditSink, NoopAuditSink};
pub use domain::session::{SessionId, SessionState};
pub use domain::slot::{GuestFrequency, SlotKey, SlotValue, YesNo};
pub use errors::{ApplicationError, InterfaceError};
pub use flows::{ConversationPhase, DialogueEngine, DialogueError, Turn, TurnOutcome};
pub use pricing::{
    format_currency, LinearPriceModel, ModelLoadError, PredictionInput, PricePredictor,
    PredictorError,
};
