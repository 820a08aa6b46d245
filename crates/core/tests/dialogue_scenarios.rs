use std::sync::Mutex;

use homeworth_core::flows::engine::{INTEREST_QUESTION, REVISION_PROMPT};
use homeworth_core::flows::{descriptor, ConversationPhase, DialogueEngine, ONBOARDING_MESSAGE};
use homeworth_core::{
    PredictionInput, PricePredictor, PredictorError, SessionState, SlotKey, SlotValue, Turn,
    TurnOutcome,
};
use rust_decimal::Decimal;

/// Records every feature tuple it is asked about and prices by area.
#[derive(Default)]
struct RecordingPredictor {
    calls: Mutex<Vec<PredictionInput>>,
}

impl RecordingPredictor {
    fn calls(&self) -> Vec<PredictionInput> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl PricePredictor for RecordingPredictor {
    fn predict(&self, input: &PredictionInput) -> Result<Decimal, PredictorError> {
        self.calls.lock().expect("calls lock").push(*input);
        Ok(Decimal::from(input.gr_liv_area) * Decimal::new(120, 0)
            + Decimal::from(input.bedroom_abv_gr) * Decimal::new(5_000, 0)
            + Decimal::new(4_950, 2))
    }
}

struct UnavailablePredictor;

impl PricePredictor for UnavailablePredictor {
    fn predict(&self, _input: &PredictionInput) -> Result<Decimal, PredictorError> {
        Err(PredictorError::Unavailable("model host unreachable".to_owned()))
    }
}

const SCENARIO: [&str; 10] = ["4", "rarely", "no", "yes", "1", "0", "30x50", "3", "2", "1"];

fn drive<P: PricePredictor>(
    engine: &DialogueEngine<P>,
    state: SessionState,
    utterances: &[&str],
) -> (SessionState, Option<Turn>) {
    let mut state = state;
    let mut last = None;
    for utterance in utterances {
        let turn = engine.handle(&state, utterance).expect("turn should succeed");
        state = turn.state.clone();
        last = Some(turn);
    }
    (state, last)
}

#[test]
fn full_interview_produces_one_estimate_with_ordered_features() {
    let engine = DialogueEngine::new(RecordingPredictor::default());

    let (state, last) = drive(&engine, SessionState::new(), &SCENARIO);
    let turn = last.expect("final turn");

    let calls = engine.predictor().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].as_tuple(), (1500, 3, 2, 1, 0, 1));
    assert_eq!(state.predicted_price, Some(Decimal::new(19_504_950, 2)));
    assert_eq!(
        turn.reply,
        format!("The estimated house price is $195,049.50. {INTEREST_QUESTION}")
    );
    assert_eq!(turn.phase(), ConversationPhase::AwaitingInterest);
}

#[test]
fn revision_round_trip_overwrites_bedrooms_and_reprices() {
    let engine = DialogueEngine::new(RecordingPredictor::default());
    let (state, _) = drive(&engine, SessionState::new(), &SCENARIO);

    let declined = engine.handle(&state, "No").expect("decline");
    assert_eq!(declined.reply, REVISION_PROMPT);
    assert_eq!(declined.phase(), ConversationPhase::Revising);

    let revised = engine.handle(&declined.state, "4").expect("revise");
    assert_eq!(revised.state.count(SlotKey::BedroomAbvGr), Some(4));
    assert!(revised.reply.starts_with("The new estimated house price is $"));
    assert!(revised.reply.ends_with(INTEREST_QUESTION));
    assert_eq!(revised.phase(), ConversationPhase::AwaitingInterest);

    let calls = engine.predictor().calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].as_tuple(), (1500, 4, 2, 1, 0, 1));

    let again = engine.handle(&revised.state, "no").expect("second decline");
    assert_eq!(again.phase(), ConversationPhase::Revising);
}

#[test]
fn revision_rejects_non_numeric_bedrooms() {
    let engine = DialogueEngine::new(RecordingPredictor::default());
    let (state, _) = drive(&engine, SessionState::new(), &SCENARIO);
    let declined = engine.handle(&state, "no").expect("decline");

    let turn = engine.handle(&declined.state, "a few").expect("rejection");

    assert_eq!(turn.state, declined.state);
    assert_eq!(turn.reply, "Please enter a valid number for bedrooms.");
    assert_eq!(turn.outcome, TurnOutcome::RevisionRejected);
    assert_eq!(engine.predictor().calls().len(), 1);
}

#[test]
fn accepting_the_estimate_links_to_purchase() {
    let engine = DialogueEngine::new(RecordingPredictor::default())
        .with_purchase_url("https://homes.test/buy");
    let (state, _) = drive(&engine, SessionState::new(), &SCENARIO);

    let turn = engine.handle(&state, "Yes please").expect("accept");

    assert_eq!(turn.state, state);
    assert_eq!(turn.outcome, TurnOutcome::PurchaseContinued);
    assert!(turn.reply.contains("[Proceed to Purchase](https://homes.test/buy)"));
}

#[test]
fn greeting_is_idempotent_regardless_of_progress() {
    let engine = DialogueEngine::new(RecordingPredictor::default());
    let (midway, _) = drive(&engine, SessionState::new(), &SCENARIO[..6]);

    let first = engine.handle(&midway, "hi").expect("first greeting");
    let second = engine.handle(&first.state, "hi").expect("second greeting");

    assert_eq!(first, second);
    assert!(first.state.is_empty());
    assert_eq!(first.reply, ONBOARDING_MESSAGE);
}

#[test]
fn declining_a_basement_defaults_both_basement_baths() {
    let engine = DialogueEngine::new(RecordingPredictor::default());

    let (state, last) = drive(&engine, SessionState::new(), &["4", "rarely", "no", "no"]);

    assert_eq!(state.count(SlotKey::BsmtFullBath), Some(0));
    assert_eq!(state.count(SlotKey::BsmtHalfBath), Some(0));
    assert_eq!(last.expect("turn").reply, descriptor(SlotKey::GrLivArea).prompt);
}

#[test]
fn frequent_guests_skip_the_basement_full_bath() {
    let engine = DialogueEngine::new(RecordingPredictor::default());

    let (state, last) = drive(&engine, SessionState::new(), &["4", "Frequently", "no", "yes"]);

    assert_eq!(state.count(SlotKey::BsmtFullBath), Some(0));
    assert!(!state.contains(SlotKey::BsmtHalfBath));
    assert!(last.expect("turn").reply.starts_with("Since you have frequent guests"));

    let (state, _) = drive(&engine, state, &["2"]);
    assert_eq!(state.count(SlotKey::BsmtHalfBath), Some(2));
    assert_eq!(ConversationPhase::of(&state), ConversationPhase::Collecting(SlotKey::GrLivArea));
}

#[test]
fn elderly_members_enforce_bedroom_and_bath_floors() {
    let engine = DialogueEngine::new(RecordingPredictor::default());
    let (state, _) = drive(&engine, SessionState::new(), &["3", "rarely", "yes", "no", "20x40"]);

    let low = engine.handle(&state, "1").expect("advisory");
    assert_eq!(low.state, state);
    assert_eq!(low.outcome, TurnOutcome::AdvisoryRejected { slot: SlotKey::BedroomAbvGr, minimum: 2 });
    assert!(low.reply.contains("at least 2 bedrooms"));

    let ok = engine.handle(&state, "2").expect("accepted");
    assert_eq!(ok.state.count(SlotKey::BedroomAbvGr), Some(2));

    let no_bath = engine.handle(&ok.state, "0").expect("advisory");
    assert_eq!(no_bath.state, ok.state);
    assert!(no_bath.reply.contains("at least 1 full bathroom"));
}

#[test]
fn area_accepts_width_by_length_only() {
    let engine = DialogueEngine::new(RecordingPredictor::default());
    let (state, _) = drive(&engine, SessionState::new(), &SCENARIO[..6]);

    let dashed = engine.handle(&state, "30-50").expect("format error");
    assert_eq!(dashed.state, state);
    assert_eq!(dashed.reply, descriptor(SlotKey::GrLivArea).error);

    let accepted = engine.handle(&state, "30X50").expect("area");
    assert_eq!(accepted.state.area(), Some(1500));
    assert_eq!(accepted.state.get(SlotKey::GrLivArea), Some(&SlotValue::Area(1500)));
}

#[test]
fn every_count_slot_rejects_non_integers_without_writing() {
    let engine = DialogueEngine::new(RecordingPredictor::default());
    let prefixes: [(SlotKey, usize); 6] = [
        (SlotKey::FamilySize, 0),
        (SlotKey::BsmtFullBath, 4),
        (SlotKey::BsmtHalfBath, 5),
        (SlotKey::BedroomAbvGr, 7),
        (SlotKey::FullBath, 8),
        (SlotKey::HalfBath, 9),
    ];

    for (slot, answered) in prefixes {
        let (state, _) = drive(&engine, SessionState::new(), &SCENARIO[..answered]);
        assert_eq!(ConversationPhase::of(&state), phase_for(slot, answered));

        for bad in ["two", "2.5", "-1", ""] {
            let turn = engine.handle(&state, bad).expect("rejection is a reply");
            assert_eq!(turn.state, state, "{slot} must not change on {bad:?}");
            assert_eq!(turn.reply, descriptor(slot).error);
        }
    }
    assert!(engine.predictor().calls().is_empty());
}

fn phase_for(slot: SlotKey, answered: usize) -> ConversationPhase {
    if answered == 0 {
        ConversationPhase::Greeting
    } else {
        ConversationPhase::Collecting(slot)
    }
}

#[test]
fn predictor_failure_keeps_answers_for_retry() {
    let failing = DialogueEngine::new(UnavailablePredictor);
    let (state, _) = drive(&failing, SessionState::new(), &SCENARIO[..9]);

    let error = failing.handle(&state, "1").expect_err("predictor down");
    assert!(error.to_string().contains("model host unreachable"));
    assert_eq!(ConversationPhase::of(&state), ConversationPhase::Collecting(SlotKey::HalfBath));

    let healthy = DialogueEngine::new(RecordingPredictor::default());
    let retried = healthy.handle(&state, "1").expect("retry succeeds");
    assert!(retried.state.predicted_price.is_some());
}
