//! Trigger tags detected in free-text mood input.
//!
//! Tags form a fixed vocabulary. The declaration order of [`TriggerTag`] is
//! also the catalog's priority order, so iterating a [`TagSet`] yields the
//! tag the catalog will act on first.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A short label for a detected emotional or behavioral theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerTag {
    /// Cravings or substance use.
    Substance,
    /// Anger or frustration.
    Angry,
    /// Anxiety or panic.
    Anxious,
    /// Stress or overwhelm.
    Stress,
    /// Sadness or low mood.
    Sad,
    /// Nothing specific detected.
    Default,
}

/// A set of trigger tags. Ordering carries no meaning beyond catalog priority.
pub type TagSet = BTreeSet<TriggerTag>;

impl TriggerTag {
    /// Every tag, in catalog priority order.
    pub const ALL: [Self; 6] = [
        Self::Substance,
        Self::Angry,
        Self::Anxious,
        Self::Stress,
        Self::Sad,
        Self::Default,
    ];

    /// The lowercase wire name of this tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Substance => "substance",
            Self::Angry => "angry",
            Self::Anxious => "anxious",
            Self::Stress => "stress",
            Self::Sad => "sad",
            Self::Default => "default",
        }
    }

    /// The first-tier badge name the catalog awards for this tag,
    /// e.g. `"Substance Step I"`.
    #[must_use]
    pub fn starter_badge(self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        let capitalized: String = chars
            .next()
            .map(|c| c.to_ascii_uppercase())
            .into_iter()
            .chain(chars)
            .collect();
        format!("{capitalized} Step I")
    }
}

impl std::fmt::Display for TriggerTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not part of the tag vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown trigger tag: {0}")]
pub struct ParseTagError(pub String);

impl FromStr for TriggerTag {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == lower)
            .ok_or_else(|| ParseTagError(s.to_string()))
    }
}

/// Returns the tag the catalog acts on for a set: the highest-priority
/// member, or [`TriggerTag::Default`] for an empty set.
#[must_use]
pub fn primary_tag(tags: &TagSet) -> TriggerTag {
    tags.first().copied().unwrap_or(TriggerTag::Default)
}
