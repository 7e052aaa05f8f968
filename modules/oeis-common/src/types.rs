use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical OEIS sequence identifier: `A` followed by six zero-padded digits.
///
/// Used as the join key for every node the pipeline writes. The inner string
/// is always in canonical form, so equality and hashing work on the text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeqId(String);

impl SeqId {
    /// Largest numeric suffix that fits the six-digit identifier space.
    pub const MAX_NUMBER: u32 = 999_999;

    /// Build an identifier from its numeric suffix, e.g. `45` -> `A000045`.
    /// Suffixes above `MAX_NUMBER` are clamped so the fixed width always
    /// holds; the CLI rejects out-of-range input before it gets here.
    pub fn from_number(n: u32) -> Self {
        Self(format!("A{:06}", n.min(Self::MAX_NUMBER)))
    }

    /// Parse text that must match the identifier shape exactly.
    /// Anything else (external link text, free-form citations) is not a SeqId.
    pub fn parse(text: &str) -> Option<Self> {
        let digits = text.strip_prefix('A')?;
        if digits.len() == 6 && digits.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(text.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One extracted fact, ready for graph persistence.
///
/// `to_id` holds a canonical identifier when the link target matched the
/// SeqId shape, otherwise the opaque link text of an external target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeTriple {
    pub from_id: SeqId,
    pub to_id: String,
    pub relationship: String,
}
