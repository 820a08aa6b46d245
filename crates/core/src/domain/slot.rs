use std::fmt;

use serde::{Deserialize, Serialize};

/// Every piece of information the interview collects, in presentation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SlotKey {
    FamilySize,
    GuestFrequency,
    ElderlyMembers,
    Basement,
    BsmtFullBath,
    BsmtHalfBath,
    GrLivArea,
    BedroomAbvGr,
    FullBath,
    HalfBath,
}

impl SlotKey {
    pub const ALL: [SlotKey; 10] = [
        Self::FamilySize,
        Self::GuestFrequency,
        Self::ElderlyMembers,
        Self::Basement,
        Self::BsmtFullBath,
        Self::BsmtHalfBath,
        Self::GrLivArea,
        Self::BedroomAbvGr,
        Self::FullBath,
        Self::HalfBath,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FamilySize => "FamilySize",
            Self::GuestFrequency => "GuestFrequency",
            Self::ElderlyMembers => "ElderlyMembers",
            Self::Basement => "Basement",
            Self::BsmtFullBath => "BsmtFullBath",
            Self::BsmtHalfBath => "BsmtHalfBath",
            Self::GrLivArea => "GrLivArea",
            Self::BedroomAbvGr => "BedroomAbvGr",
            Self::FullBath => "FullBath",
            Self::HalfBath => "HalfBath",
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuestFrequency {
    Rarely,
    Frequently,
}

impl GuestFrequency {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rarely" => Some(Self::Rarely),
            "frequently" => Some(Self::Frequently),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            _ => None,
        }
    }

    pub fn is_yes(&self) -> bool {
        matches!(self, Self::Yes)
    }
}

/// Typed value stored for a slot after validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SlotValue {
    Count(u32),
    Area(u64),
    Guests(GuestFrequency),
    Answer(YesNo),
}

impl SlotValue {
    pub fn as_count(&self) -> Option<u32> {
        match self {
            Self::Count(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_area(&self) -> Option<u64> {
        match self {
            Self::Area(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_guests(&self) -> Option<GuestFrequency> {
        match self {
            Self::Guests(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_answer(&self) -> Option<YesNo> {
        match self {
            Self::Answer(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(value) => write!(f, "{value}"),
            Self::Area(value) => write!(f, "{value}"),
            Self::Guests(GuestFrequency::Rarely) => f.write_str("rarely"),
            Self::Guests(GuestFrequency::Frequently) => f.write_str("frequently"),
            Self::Answer(YesNo::Yes) => f.write_str("yes"),
            Self::Answer(YesNo::No) => f.write_str("no"),
        }
    }
}
