//! Declarative slot table.
//!
//! Each [`SlotDescriptor`] carries its own applicability predicate, parser,
//! derived-default side effect and advisory floor. The engine never branches
//! on a specific slot; it asks [`next_applicable_slot`] and delegates.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::session::SessionState;
use crate::domain::slot::{GuestFrequency, SlotKey, SlotValue, YesNo};

static AREA_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)x(\d+)").expect("area pattern is a valid regex"));

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotRule {
    /// Non-negative integer.
    Count,
    /// `rarely` or `frequently`.
    Guests,
    /// `yes` or `no`.
    YesNo,
    /// `<width>x<length>`, stored as the product.
    Area,
}

/// Minimum value recommended when the household includes elderly members.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdvisoryFloor {
    pub minimum: u32,
    pub message: &'static str,
}

#[derive(Clone, Copy)]
pub struct AlternatePrompt {
    pub when: fn(&SessionState) -> bool,
    pub text: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotRejection {
    /// The utterance does not satisfy the slot's format.
    Parse { slot: SlotKey, message: &'static str },
    /// The value parsed but falls below an advisory floor.
    Advisory { slot: SlotKey, minimum: u32, message: &'static str },
}

impl SlotRejection {
    pub fn slot(&self) -> SlotKey {
        match self {
            Self::Parse { slot, .. } | Self::Advisory { slot, .. } => *slot,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Parse { message, .. } | Self::Advisory { message, .. } => message,
        }
    }
}

#[derive(Clone, Copy)]
pub struct SlotDescriptor {
    pub key: SlotKey,
    pub prompt: &'static str,
    pub error: &'static str,
    pub rule: SlotRule,
    pub applies: fn(&SessionState) -> bool,
    pub on_accept: Option<fn(&mut SessionState)>,
    pub advisory_floor: Option<AdvisoryFloor>,
    pub alternate_prompt: Option<AlternatePrompt>,
}

impl fmt::Debug for SlotDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotDescriptor")
            .field("key", &self.key)
            .field("rule", &self.rule)
            .field("advisory_floor", &self.advisory_floor)
            .finish_non_exhaustive()
    }
}

impl SlotDescriptor {
    pub fn is_applicable(&self, state: &SessionState) -> bool {
        !state.contains(self.key) && (self.applies)(state)
    }

    pub fn prompt_for(&self, state: &SessionState) -> &'static str {
        match self.alternate_prompt {
            Some(alternate) if (alternate.when)(state) => alternate.text,
            _ => self.prompt,
        }
    }

    /// Parse `utterance` against this slot, then apply any advisory floor.
    pub fn validate(
        &self,
        state: &SessionState,
        utterance: &str,
    ) -> Result<SlotValue, SlotRejection> {
        let parse_error = SlotRejection::Parse { slot: self.key, message: self.error };
        let normalized = utterance.trim().to_ascii_lowercase();

        let value = match self.rule {
            SlotRule::Count => SlotValue::Count(parse_count(&normalized).ok_or(parse_error)?),
            SlotRule::Guests => {
                SlotValue::Guests(GuestFrequency::parse(&normalized).ok_or(parse_error)?)
            }
            SlotRule::YesNo => SlotValue::Answer(YesNo::parse(&normalized).ok_or(parse_error)?),
            SlotRule::Area => SlotValue::Area(parse_area(&normalized).ok_or(parse_error)?),
        };

        if let (Some(floor), Some(count)) = (self.advisory_floor, value.as_count()) {
            if state.has_elderly_members() && count < floor.minimum {
                return Err(SlotRejection::Advisory {
                    slot: self.key,
                    minimum: floor.minimum,
                    message: floor.message,
                });
            }
        }

        Ok(value)
    }

    /// Write `value` and any derived defaults into `state`.
    pub fn accept(&self, state: &mut SessionState, value: SlotValue) {
        state.insert(self.key, value);
        if let Some(side_effect) = self.on_accept {
            side_effect(state);
        }
    }
}

pub static SLOTS: [SlotDescriptor; 10] = [
    SlotDescriptor {
        key: SlotKey::FamilySize,
        prompt: "How many people are in your family?",
        error: "Please enter a valid number for family size.",
        rule: SlotRule::Count,
        applies: always,
        on_accept: None,
        advisory_floor: None,
        alternate_prompt: None,
    },
    SlotDescriptor {
        key: SlotKey::GuestFrequency,
        prompt: "How often do you have guests? (Rarely/Frequently)",
        error: "Please answer 'Rarely' or 'Frequently'.",
        rule: SlotRule::Guests,
        applies: family_size_known,
        on_accept: None,
        advisory_floor: None,
        alternate_prompt: None,
    },
    SlotDescriptor {
        key: SlotKey::ElderlyMembers,
        prompt: "Do you have elderly members in your family? (Yes/No)",
        error: "Please answer 'Yes' or 'No'.",
        rule: SlotRule::YesNo,
        applies: guest_frequency_known,
        on_accept: None,
        advisory_floor: None,
        alternate_prompt: None,
    },
    SlotDescriptor {
        key: SlotKey::Basement,
        prompt: "Would you like a basement? (Yes/No)",
        error: "Please answer 'Yes' or 'No'.",
        rule: SlotRule::YesNo,
        applies: elderly_members_known,
        on_accept: Some(default_basement_baths),
        advisory_floor: None,
        alternate_prompt: None,
    },
    SlotDescriptor {
        key: SlotKey::BsmtFullBath,
        prompt: "How many full bathrooms do you need in the basement?",
        error: "Please enter a valid number for basement full bathrooms.",
        rule: SlotRule::Count,
        applies: basement_without_frequent_guests,
        on_accept: None,
        advisory_floor: None,
        alternate_prompt: None,
    },
    SlotDescriptor {
        key: SlotKey::BsmtHalfBath,
        prompt: "How many half bathrooms do you need in the basement?",
        error: "Please enter a valid number for basement half bathrooms.",
        rule: SlotRule::Count,
        applies: wants_basement,
        on_accept: None,
        advisory_floor: None,
        alternate_prompt: Some(AlternatePrompt {
            when: frequent_guests,
            text: "Since you have frequent guests, a full basement bathroom is not required. \
                   How many half bathrooms do you need in the basement?",
        }),
    },
    SlotDescriptor {
        key: SlotKey::GrLivArea,
        prompt: "Enter your living area in Width x Length format (e.g., 30x50):",
        error: "Please enter the area in Width x Length format (e.g., 30x50).",
        rule: SlotRule::Area,
        applies: basement_resolved,
        on_accept: None,
        advisory_floor: None,
        alternate_prompt: None,
    },
    SlotDescriptor {
        key: SlotKey::BedroomAbvGr,
        prompt: "How many bedrooms above ground do you need?",
        error: "Please enter a valid number for bedrooms.",
        rule: SlotRule::Count,
        applies: area_known,
        on_accept: None,
        advisory_floor: Some(AdvisoryFloor {
            minimum: 2,
            message: "Since you have elderly members, it is recommended to have at least \
                      2 bedrooms. How many bedrooms do you need?",
        }),
        alternate_prompt: None,
    },
    SlotDescriptor {
        key: SlotKey::FullBath,
        prompt: "How many full bathrooms do you need above ground?",
        error: "Please enter a valid number for full bathrooms.",
        rule: SlotRule::Count,
        applies: bedrooms_known,
        on_accept: None,
        advisory_floor: Some(AdvisoryFloor {
            minimum: 1,
            message: "Since you have elderly members, it is recommended to have at least \
                      1 full bathroom. How many full bathrooms do you need?",
        }),
        alternate_prompt: None,
    },
    SlotDescriptor {
        key: SlotKey::HalfBath,
        prompt: "How many half bathrooms do you need above ground?",
        error: "Please enter a valid number for half bathrooms.",
        rule: SlotRule::Count,
        applies: full_bath_known,
        on_accept: None,
        advisory_floor: None,
        alternate_prompt: None,
    },
];

/// First slot, in schema order, that is unanswered and applicable.
pub fn next_applicable_slot(state: &SessionState) -> Option<&'static SlotDescriptor> {
    SLOTS.iter().find(|slot| slot.is_applicable(state))
}

/// `SLOTS` is laid out in `SlotKey` declaration order.
pub fn descriptor(key: SlotKey) -> &'static SlotDescriptor {
    &SLOTS[key as usize]
}

pub fn parse_count(utterance: &str) -> Option<u32> {
    utterance.trim().parse::<u32>().ok()
}

pub fn parse_area(utterance: &str) -> Option<u64> {
    let captures = AREA_PATTERN.captures(utterance.trim())?;
    let width = captures.get(1)?.as_str().parse::<u64>().ok()?;
    let length = captures.get(2)?.as_str().parse::<u64>().ok()?;
    width.checked_mul(length)
}

fn always(_: &SessionState) -> bool {
    true
}

fn family_size_known(state: &SessionState) -> bool {
    state.contains(SlotKey::FamilySize)
}

fn guest_frequency_known(state: &SessionState) -> bool {
    state.contains(SlotKey::GuestFrequency)
}

fn elderly_members_known(state: &SessionState) -> bool {
    state.contains(SlotKey::ElderlyMembers)
}

fn wants_basement(state: &SessionState) -> bool {
    state.answer(SlotKey::Basement) == Some(YesNo::Yes)
}

fn frequent_guests(state: &SessionState) -> bool {
    state.guest_frequency() == Some(GuestFrequency::Frequently)
}

fn basement_without_frequent_guests(state: &SessionState) -> bool {
    wants_basement(state) && !frequent_guests(state)
}

fn basement_resolved(state: &SessionState) -> bool {
    state.contains(SlotKey::BsmtFullBath) && state.contains(SlotKey::BsmtHalfBath)
}

fn area_known(state: &SessionState) -> bool {
    state.contains(SlotKey::GrLivArea)
}

fn bedrooms_known(state: &SessionState) -> bool {
    state.contains(SlotKey::BedroomAbvGr)
}

fn full_bath_known(state: &SessionState) -> bool {
    state.contains(SlotKey::FullBath)
}

fn default_basement_baths(state: &mut SessionState) {
    match state.answer(SlotKey::Basement) {
        Some(YesNo::No) => {
            state.insert(SlotKey::BsmtFullBath, SlotValue::Count(0));
            state.insert(SlotKey::BsmtHalfBath, SlotValue::Count(0));
        }
        Some(YesNo::Yes) if frequent_guests(state) => {
            state.insert(SlotKey::BsmtFullBath, SlotValue::Count(0));
        }
        _ => {}
    }
}
