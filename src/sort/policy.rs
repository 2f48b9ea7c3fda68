//! Duplicate handling

use serde::{Deserialize, Serialize};

/// What a sort does with rows whose ordering keys compare equal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep every row; an ordinal makes each key unique
    Preserve,
    /// Keep only the first row of each key
    Suppress,
    /// Keep every row with no tie-breaking ordinal
    #[default]
    Default,
}

impl DuplicatePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicatePolicy::Preserve => "preserve",
            DuplicatePolicy::Suppress => "suppress",
            DuplicatePolicy::Default => "default",
        }
    }

    /// Returns true if keys carry an ordinal segment
    pub fn appends_ordinal(&self) -> bool {
        matches!(self, DuplicatePolicy::Preserve)
    }
}
