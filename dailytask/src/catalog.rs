//! Task recommendations and pending-task lookup.
//!
//! [`TaskCatalogClient`] wraps a [`TaskApi`] with a per-call timeout and
//! turns the catalog's two suggestion shapes into [`TaskDescriptor`]s.
//! It never touches local state: adding a suggestion to the task list is
//! the caller's decision.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use dailytask_proto::api::TagSuggestRequest;
use dailytask_proto::streak::StreakUpdate;
use dailytask_proto::tag::TagSet;
use dailytask_proto::task::TaskDescriptor;

use crate::api::{ApiError, TaskApi};
use crate::session::Session;

/// Runs `call`, mapping expiry of `limit` to [`ApiError::Timeout`].
pub(crate) async fn with_timeout<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or_else(|_| Err(ApiError::Timeout(limit)))
}

/// Client for the remote task catalog.
#[derive(Debug)]
pub struct TaskCatalogClient<A: TaskApi> {
    api: Arc<A>,
    timeout: Duration,
}

impl<A: TaskApi> Clone for TaskCatalogClient<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            timeout: self.timeout,
        }
    }
}

impl<A: TaskApi> TaskCatalogClient<A> {
    /// Creates a client that gives every call at most `timeout`.
    pub const fn new(api: Arc<A>, timeout: Duration) -> Self {
        Self { api, timeout }
    }

    /// Asks the catalog for a task addressing `tags`.
    ///
    /// The returned descriptor is always `pending`. Two calls with the same
    /// tags may yield different tasks.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] of the failed request.
    pub async fn suggest(
        &self,
        tags: &TagSet,
        context_text: Option<&str>,
    ) -> Result<TaskDescriptor, ApiError> {
        debug_assert!(!tags.is_empty(), "classifier never yields an empty tag set");
        let request = TagSuggestRequest::new(tags, context_text);
        let response = with_timeout(self.timeout, self.api.suggest_by_tags(&request))
            .await
            .inspect_err(|e| warn!(error = %e, ?tags, "tag suggestion failed"))?;

        let task = response.into_descriptor(tags, Utc::now());
        info!(task_id = %task.task_id, title = %task.title, badge = %task.badge, "task suggested");
        Ok(task)
    }

    /// Asks the catalog for a task chosen from the user's profile.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] of the failed request.
    pub async fn suggest_for_user(&self, session: &Session) -> Result<TaskDescriptor, ApiError> {
        let response = with_timeout(self.timeout, self.api.suggest_for_user(&session.user_id))
            .await
            .inspect_err(|e| warn!(error = %e, user_id = %session.user_id, "profile suggestion failed"))?;

        if let Some(message) = response.message.as_deref() {
            debug!(message, "catalog message");
        }
        let task = response.into_descriptor(Utc::now());
        info!(task_id = %task.task_id, title = %task.title, "task suggested for user");
        Ok(task)
    }

    /// Fetches the user's open tasks (pending or rejected) and current
    /// streak.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] of the failed request.
    pub async fn fetch_profile(
        &self,
        session: &Session,
    ) -> Result<(Vec<TaskDescriptor>, StreakUpdate), ApiError> {
        let profile = with_timeout(self.timeout, self.api.fetch_profile(&session.user_id)).await?;
        let open = profile.open_tasks(Utc::now());
        debug!(
            user_id = %session.user_id,
            open = open.len(),
            streak = ?profile.streak,
            "profile fetched"
        );
        Ok((open, profile.streak_update()))
    }
}
