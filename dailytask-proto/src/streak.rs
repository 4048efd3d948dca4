//! Streak and badge bookkeeping.
//!
//! The server owns the streak. The client only merges what the server
//! reports, so `count` never moves backwards on the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::timestamp;

/// A badge the user has earned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnedBadge {
    /// Badge name, e.g. "Substance Step I".
    pub badge: String,
    /// When it was earned.
    #[serde(with = "timestamp")]
    pub earned_at: DateTime<Utc>,
}

/// What the server reported after a verification or profile read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreakUpdate {
    /// Server's current streak count, if reported.
    pub count: Option<u32>,
    /// Badges the server reports as earned.
    pub badges: Vec<EarnedBadge>,
}

/// Client-side mirror of the user's streak.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    /// Consecutive-day count of verified completions.
    pub count: u32,
    /// Badges in the order they were earned.
    pub badges_earned: Vec<EarnedBadge>,
}

impl StreakState {
    /// Merges a server report and returns how many days the streak advanced.
    ///
    /// A report with a lower count than the local one is ignored for
    /// `count`. Badges already present by name are skipped.
    pub fn merge(&mut self, update: &StreakUpdate) -> u32 {
        let delta = update
            .count
            .map_or(0, |server| server.saturating_sub(self.count));
        self.count += delta;

        for badge in &update.badges {
            if !self.badges_earned.iter().any(|b| b.badge == badge.badge) {
                self.badges_earned.push(badge.clone());
            }
        }
        delta
    }

    /// Returns the most recently earned badge.
    #[must_use]
    pub fn latest_badge(&self) -> Option<&EarnedBadge> {
        self.badges_earned.last()
    }
}
