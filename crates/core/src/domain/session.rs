use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::slot::{GuestFrequency, SlotKey, SlotValue, YesNo};
use crate::pricing::PredictionInput;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accumulated answers for one conversation.
///
/// Answers may arrive out of order (derived defaults are written ahead of
/// their slot), but the schema always presents slots in [`SlotKey`] order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub answers: BTreeMap<SlotKey, SlotValue>,
    #[serde(default)]
    pub predicted_price: Option<Decimal>,
    #[serde(default)]
    pub awaiting_revision: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty() && self.predicted_price.is_none() && !self.awaiting_revision
    }

    pub fn get(&self, key: SlotKey) -> Option<&SlotValue> {
        self.answers.get(&key)
    }

    pub fn contains(&self, key: SlotKey) -> bool {
        self.answers.contains_key(&key)
    }

    pub fn insert(&mut self, key: SlotKey, value: SlotValue) {
        self.answers.insert(key, value);
    }

    pub fn count(&self, key: SlotKey) -> Option<u32> {
        self.get(key).and_then(SlotValue::as_count)
    }

    pub fn area(&self) -> Option<u64> {
        self.get(SlotKey::GrLivArea).and_then(SlotValue::as_area)
    }

    pub fn guest_frequency(&self) -> Option<GuestFrequency> {
        self.get(SlotKey::GuestFrequency).and_then(SlotValue::as_guests)
    }

    pub fn answer(&self, key: SlotKey) -> Option<YesNo> {
        self.get(key).and_then(SlotValue::as_answer)
    }

    pub fn has_elderly_members(&self) -> bool {
        self.answer(SlotKey::ElderlyMembers) == Some(YesNo::Yes)
    }

    /// Build the feature tuple, or report which slots are missing.
    pub fn prediction_input(&self) -> Result<PredictionInput, Vec<SlotKey>> {
        let area = self.area();
        let bedrooms = self.count(SlotKey::BedroomAbvGr);
        let full_bath = self.count(SlotKey::FullBath);
        let bsmt_full_bath = self.count(SlotKey::BsmtFullBath);
        let bsmt_half_bath = self.count(SlotKey::BsmtHalfBath);
        let half_bath = self.count(SlotKey::HalfBath);

        match (area, bedrooms, full_bath, bsmt_full_bath, bsmt_half_bath, half_bath) {
            (
                Some(gr_liv_area),
                Some(bedroom_abv_gr),
                Some(full_bath),
                Some(bsmt_full_bath),
                Some(bsmt_half_bath),
                Some(half_bath),
            ) => Ok(PredictionInput {
                gr_liv_area,
                bedroom_abv_gr,
                full_bath,
                bsmt_full_bath,
                bsmt_half_bath,
                half_bath,
            }),
            _ => {
                let present = [
                    (SlotKey::GrLivArea, area.is_some()),
                    (SlotKey::BedroomAbvGr, bedrooms.is_some()),
                    (SlotKey::FullBath, full_bath.is_some()),
                    (SlotKey::BsmtFullBath, bsmt_full_bath.is_some()),
                    (SlotKey::BsmtHalfBath, bsmt_half_bath.is_some()),
                    (SlotKey::HalfBath, half_bath.is_some()),
                ];
                Err(present.into_iter().filter(|(_, found)| !found).map(|(key, _)| key).collect())
            }
        }
    }
}
