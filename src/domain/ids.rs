//! Human-readable sequential record IDs (`U00001`, `C00042`, `UP00007`, ...).
//!
//! Each record family has a fixed letter prefix; the numeric part is the
//! highest existing sequence plus one, zero-padded to five digits. Issuance
//! is read-then-write with no atomic counter — two concurrent creations can
//! compute the same "next" ID. Acceptable at this system's write volume.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdKind {
    Client,
    Instructor,
    Manager,
    Class,
    Pass,
    OwnedPass,
}

impl IdKind {
    pub fn prefix(self) -> &'static str {
        match self {
            IdKind::Client => "U",
            IdKind::Instructor => "I",
            IdKind::Manager => "M",
            IdKind::Class => "C",
            IdKind::Pass => "P",
            IdKind::OwnedPass => "UP",
        }
    }

    pub fn format(self, sequence: u32) -> String {
        format!("{}{:05}", self.prefix(), sequence)
    }

    /// Parse the trailing sequence number out of an ID of this kind.
    ///
    /// Returns `None` for IDs of a different kind; `U` never matches a
    /// `UP`-prefixed ID because the remainder must be all digits.
    pub fn sequence_of(self, id: &str) -> Option<u32> {
        let rest = id.strip_prefix(self.prefix())?;
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        rest.parse().ok()
    }

    /// Next ID after the highest issued sequence (`None` = empty family).
    pub fn next(self, highest: Option<u32>) -> String {
        self.format(highest.unwrap_or(0) + 1)
    }

    pub fn max_sequence<'a>(self, ids: impl IntoIterator<Item = &'a str>) -> Option<u32> {
        ids.into_iter().filter_map(|id| self.sequence_of(id)).max()
    }
}
