//! Request and response bodies of the task catalog and profile endpoints.
//!
//! | Operation | Route |
//! |---|---|
//! | pending tasks | `GET /api/profile/{user_id}` |
//! | suggest (profile flow) | `GET /api/suggest-task?user_id={id}` |
//! | suggest (tags flow) | `POST /api/tasks/suggest` |
//!
//! The two suggestion routes answer with different shapes; both are
//! normalised into a [`TaskDescriptor`] here so callers only ever see one.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::streak::{EarnedBadge, StreakUpdate};
use crate::tag::{TagSet, TriggerTag, primary_tag};
use crate::task::{Difficulty, TaskDescriptor, TaskId, TaskStatus, timestamp};

/// Badge used when the profile flow omits one.
pub const FALLBACK_BADGE: &str = "Default Step I";

/// Category used when the profile flow omits one.
pub const FALLBACK_CATEGORY: &str = "general";

/// A task entry as stored in the user's profile document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileTask {
    /// Task id.
    pub task_id: TaskId,
    /// Task instruction.
    pub title: String,
    /// Difficulty, easy when absent.
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Categories, if recorded.
    #[serde(default)]
    pub category: Option<Vec<String>>,
    /// Badge granted on completion.
    #[serde(default)]
    pub badge: Option<String>,
    /// Lifecycle status.
    pub status: TaskStatus,
    /// Assignment time.
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub assigned_at: Option<DateTime<Utc>>,
    /// Verifier feedback from a rejected proof.
    #[serde(default)]
    pub feedback: Option<String>,
}

impl ProfileTask {
    /// Converts into a descriptor, using `received_at` when the server did
    /// not record an assignment time.
    #[must_use]
    pub fn into_descriptor(self, received_at: DateTime<Utc>) -> TaskDescriptor {
        TaskDescriptor {
            task_id: self.task_id,
            title: self.title,
            difficulty: self.difficulty.unwrap_or_default(),
            category: category_or_fallback(self.category),
            badge: self.badge.unwrap_or_else(|| FALLBACK_BADGE.to_string()),
            status: self.status,
            assigned_at: self.assigned_at.unwrap_or(received_at),
            feedback: self.feedback,
        }
    }
}

/// A badge entry in the profile document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileBadge {
    /// Badge name.
    pub badge: String,
    /// When it was earned; unparseable values are dropped.
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub earned_at: Option<DateTime<Utc>>,
}

/// Response of `GET /api/profile/{user_id}`. Only the fields the task
/// workflow reads are modelled; the rest of the document is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileResponse {
    /// Every task ever assigned to the user.
    #[serde(default)]
    pub tasks: Vec<ProfileTask>,
    /// Current streak count.
    #[serde(default)]
    pub streak: Option<u32>,
    /// Earned badges.
    #[serde(default)]
    pub badges: Vec<ProfileBadge>,
}

impl ProfileResponse {
    /// Descriptors of the tasks still waiting for proof: `pending` ones and
    /// `rejected` ones, which keep their feedback and may be resubmitted.
    #[must_use]
    pub fn open_tasks(&self, received_at: DateTime<Utc>) -> Vec<TaskDescriptor> {
        self.tasks
            .iter()
            .filter(|t| matches!(t.status, TaskStatus::Pending | TaskStatus::Rejected))
            .cloned()
            .map(|t| t.into_descriptor(received_at))
            .collect()
    }

    /// The streak and badges as a mergeable report.
    #[must_use]
    pub fn streak_update(&self) -> StreakUpdate {
        StreakUpdate {
            count: self.streak,
            badges: self
                .badges
                .iter()
                .filter_map(|b| {
                    b.earned_at.map(|earned_at| EarnedBadge {
                        badge: b.badge.clone(),
                        earned_at,
                    })
                })
                .collect(),
        }
    }
}

/// Response of `GET /api/suggest-task?user_id={id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileSuggestResponse {
    /// Task instruction (the route calls it `task`).
    pub task: String,
    /// Server-assigned task id.
    pub task_id: TaskId,
    /// Difficulty, easy when absent.
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Categories, `general` when absent or empty.
    #[serde(default)]
    pub category: Option<Vec<String>>,
    /// Badge granted on completion.
    #[serde(default)]
    pub badge_awarded: Option<String>,
    /// Encouragement text.
    #[serde(default)]
    pub message: Option<String>,
}

impl ProfileSuggestResponse {
    /// Normalises into a pending descriptor assigned at `received_at`.
    #[must_use]
    pub fn into_descriptor(self, received_at: DateTime<Utc>) -> TaskDescriptor {
        TaskDescriptor {
            task_id: self.task_id,
            title: self.task,
            difficulty: self.difficulty.unwrap_or_default(),
            category: category_or_fallback(self.category),
            badge: self
                .badge_awarded
                .unwrap_or_else(|| FALLBACK_BADGE.to_string()),
            status: TaskStatus::Pending,
            assigned_at: received_at,
            feedback: None,
        }
    }
}

/// Body of `POST /api/tasks/suggest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSuggestRequest {
    /// Detected trigger tags, in priority order.
    pub issues: Vec<TriggerTag>,
    /// The user's own words, used by the catalog for context.
    pub text: String,
}

impl TagSuggestRequest {
    /// Builds a request from a tag set and optional context text.
    #[must_use]
    pub fn new(tags: &TagSet, text: Option<&str>) -> Self {
        Self {
            issues: tags.iter().copied().collect(),
            text: text.unwrap_or_default().to_string(),
        }
    }
}

/// Response of `POST /api/tasks/suggest`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TagSuggestResponse {
    /// Task instruction.
    pub title: String,
    /// Difficulty, easy when absent.
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Badge granted on completion.
    #[serde(default)]
    pub badge: Option<String>,
    /// Server id, when the catalog persisted the task.
    #[serde(default)]
    pub task_id: Option<TaskId>,
    /// Assignment time, when the catalog reports one.
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub assigned_at: Option<DateTime<Utc>>,
}

impl TagSuggestResponse {
    /// Normalises into a pending descriptor.
    ///
    /// Missing ids are minted locally, the category is the requested tag
    /// set and a missing badge becomes the starter badge of the primary tag.
    #[must_use]
    pub fn into_descriptor(self, tags: &TagSet, received_at: DateTime<Utc>) -> TaskDescriptor {
        TaskDescriptor {
            task_id: self.task_id.unwrap_or_else(TaskId::local),
            title: self.title,
            difficulty: self.difficulty.unwrap_or_default(),
            category: tags.iter().map(|t| t.as_str().to_string()).collect(),
            badge: self
                .badge
                .unwrap_or_else(|| primary_tag(tags).starter_badge()),
            status: TaskStatus::Pending,
            assigned_at: self.assigned_at.unwrap_or(received_at),
            feedback: None,
        }
    }
}

/// Body of a non-2xx response. Routes use `reason`, `message` or `error`
/// for the human-readable detail; the combined submit route also reports
/// `status: "rejected"` for an explicit negative verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Verifier explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// General message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Validation or lookup error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Verdict marker of the combined submit route.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ErrorBody {
    /// The most specific detail text available.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.reason
            .as_deref()
            .or(self.message.as_deref())
            .or(self.error.as_deref())
    }

    /// Whether this body is an explicit negative verdict.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        self.status.as_deref() == Some("rejected")
    }
}

fn category_or_fallback(category: Option<Vec<String>>) -> BTreeSet<String> {
    let set: BTreeSet<String> = category.unwrap_or_default().into_iter().collect();
    if set.is_empty() {
        BTreeSet::from([FALLBACK_CATEGORY.to_string()])
    } else {
        set
    }
}
