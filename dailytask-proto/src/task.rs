//! Task descriptors and their lifecycle.
//!
//! A task moves `Pending -> Submitted -> {Verified | Rejected}`. `Rejected`
//! may go back to `Pending` (or straight to `Submitted`) for another proof;
//! `Verified` is terminal.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of an assigned task.
///
/// Server-issued ids look like `task_1a2b3c4d`. Tasks suggested through the
/// tag flow carry no server id and get a locally minted `local_<uuid>` one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a client-side identifier (UUID v7, time-ordered).
    #[must_use]
    pub fn local() -> Self {
        Self(format!("local_{}", Uuid::now_v7().simple()))
    }

    /// Whether this id was minted on the client rather than by the server.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.0.starts_with("local_")
    }

    /// Returns the string form of this id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How demanding a task is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Doable in a couple of minutes.
    #[default]
    Easy,
    /// Takes some effort.
    Medium,
    /// A stretch goal.
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Easy => write!(f, "easy"),
            Self::Medium => write!(f, "medium"),
            Self::Hard => write!(f, "hard"),
        }
    }
}

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Assigned and waiting for proof.
    Pending,
    /// A proof is being checked.
    Submitted,
    /// Proof accepted. Terminal.
    #[serde(alias = "approved")]
    Verified,
    /// Proof checked and refused; another proof may be submitted.
    Rejected,
}

impl TaskStatus {
    /// Whether moving from `self` to `next` is a legal lifecycle step.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending | Self::Rejected, Self::Submitted)
                | (Self::Submitted, Self::Verified | Self::Rejected | Self::Pending)
                | (Self::Rejected, Self::Pending)
        )
    }

    /// Whether the task is finished and leaves the pending view.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Verified)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Submitted => write!(f, "submitted"),
            Self::Verified => write!(f, "verified"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// A task assigned to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    /// Unique id of the task.
    pub task_id: TaskId,
    /// Human-readable instruction, e.g. "Take a photo of your shoes by the door".
    pub title: String,
    /// How demanding the task is.
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Categories (usually trigger tag names) the task addresses.
    #[serde(default)]
    pub category: BTreeSet<String>,
    /// Badge granted when the task is verified.
    pub badge: String,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// When the task was assigned.
    #[serde(with = "timestamp")]
    pub assigned_at: DateTime<Utc>,
    /// Verifier feedback from the last rejected proof.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// Lenient timestamp (de)serialization.
///
/// Serializes as RFC 3339. Accepts RFC 3339 and RFC 2822 on input; the
/// latter is what the backend emits for datetimes
/// (`Sat, 17 Oct 2026 10:00:00 GMT`).
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Parses an RFC 3339 or RFC 2822 timestamp into UTC.
    #[must_use]
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .or_else(|_| DateTime::parse_from_rfc2822(raw))
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Serializes as RFC 3339.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_rfc3339())
    }

    /// Deserializes from RFC 3339 or RFC 2822.
    ///
    /// # Errors
    ///
    /// Fails if the string matches neither format.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    /// Optional variant for fields the server may omit or send unparseable.
    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer};

        /// Deserializes an optional timestamp; unparseable values become `None`.
        ///
        /// # Errors
        ///
        /// Fails only if the value is neither null nor a string.
        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw = Option::<String>::deserialize(d)?;
            Ok(raw.as_deref().and_then(super::parse))
        }
    }
}
