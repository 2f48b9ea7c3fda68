//! String collations

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// How text values are ordered when key-encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collation {
    /// Byte order of the UTF-8 encoding
    #[default]
    Binary,
    /// Unicode lowercase folding before byte comparison
    CaseInsensitive,
}

impl Collation {
    /// Returns the text used for comparison under this collation
    pub fn sort_text<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self {
            Collation::Binary => Cow::Borrowed(text),
            Collation::CaseInsensitive => {
                if text.chars().any(|c| c.is_uppercase()) {
                    Cow::Owned(text.to_lowercase())
                } else {
                    Cow::Borrowed(text)
                }
            }
        }
    }

    /// Returns true unless this is plain byte order
    pub fn is_collating(&self) -> bool {
        !matches!(self, Collation::Binary)
    }
}
