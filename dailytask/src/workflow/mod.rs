//! User-facing task workflow.
//!
//! Contains the [`WorkflowController`] which binds the classifier, the
//! catalog client, the proof pipeline and the task list together:
//! mood text -> tags -> suggested task -> proof -> verdict -> streak.
//!
//! The controller owns all local state. State changes are published as
//! [`WorkflowEvent`]s on a bounded channel and can also be polled through
//! the accessor methods.

mod state;

pub use state::{ErrorKind, WorkflowState};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use dailytask_proto::proof::VerificationResult;
use dailytask_proto::streak::{EarnedBadge, StreakState, StreakUpdate};
use dailytask_proto::tag::TagSet;
use dailytask_proto::task::{TaskDescriptor, TaskId, TaskStatus};

use crate::api::{ApiError, Photo, TaskApi};
use crate::catalog::TaskCatalogClient;
use crate::classifier::{IssueClassifier, KeywordRules};
use crate::pipeline::{PipelineError, PipelineStep, ProofMode, ProofOutcome, ProofPipeline};
use crate::session::Session;
use crate::store::{StatusFields, TaskListStore};

/// Shown when a proof is refused without a reason.
pub const REJECTED_FALLBACK: &str = "Try again with a clearer photo of the task.";
/// Shown when a suggestion is requested without mood text.
pub const EMPTY_TEXT_MESSAGE: &str = "Please describe how you're feeling.";
/// Shown when the catalog could not be reached.
pub const CATALOG_UNREACHABLE: &str = "Could not connect to server.";
/// Shown when a suggested task was added.
pub const TASK_ADDED: &str = "New task added!";

/// Input rejected before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Mood text was empty or whitespace.
    #[error("mood text is empty")]
    EmptyText,
    /// The proof photo carried no data.
    #[error("proof photo is empty")]
    EmptyPhoto,
}

/// Errors returned by [`WorkflowController`] operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowError {
    /// Required input was missing.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The task is not in the pending list.
    #[error("unknown task: {0}")]
    UnknownTask(TaskId),

    /// A submission for this task is already running.
    #[error("a proof for task {0} is already being submitted")]
    ConcurrentSubmission(TaskId),

    /// The catalog could not suggest a task.
    #[error("task suggestion failed: {0}")]
    Catalog(ApiError),

    /// The profile could not be loaded.
    #[error("profile fetch failed: {0}")]
    Profile(ApiError),

    /// The proof photo could not be uploaded.
    #[error("upload failed: {0}")]
    Upload(ApiError),

    /// The proof could not be checked.
    #[error("verification failed: {0}")]
    Verification(ApiError),

    /// The controller was shut down while the operation ran.
    #[error("workflow shut down")]
    Cancelled,
}

impl WorkflowError {
    /// The user-facing failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::UnknownTask(_) => ErrorKind::Validation,
            Self::ConcurrentSubmission(_) => ErrorKind::ConcurrentSubmission,
            Self::Catalog(e) | Self::Profile(e) => {
                if e.is_network() {
                    ErrorKind::Network
                } else {
                    ErrorKind::Server
                }
            }
            Self::Upload(_) => ErrorKind::Upload,
            Self::Verification(_) => ErrorKind::Verification,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

impl From<PipelineError> for WorkflowError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Upload(e) => Self::Upload(e),
            PipelineError::Verification(e) => Self::Verification(e),
        }
    }
}

/// Tone of a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Something worked.
    Success,
    /// Something failed.
    Error,
    /// Neutral information.
    Info,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Tone of the message.
    pub kind: NoticeKind,
    /// Text to display.
    pub text: String,
}

impl Notice {
    fn new(kind: NoticeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Events emitted by the [`WorkflowController`] for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    /// A task was added to the pending list.
    TaskAdded(TaskDescriptor),
    /// A task left the pending list (verified or dismissed).
    TaskRemoved(TaskId),
    /// A workflow state changed. `task_id` is `None` for the suggestion slot.
    StateChanged {
        /// The task whose state changed.
        task_id: Option<TaskId>,
        /// The new state.
        state: WorkflowState,
    },
    /// The streak count changed.
    StreakChanged {
        /// New streak count.
        count: u32,
        /// Increase caused by the latest verification (0 on refresh).
        delta: u32,
    },
    /// A message for the user.
    Notice(Notice),
}

/// Result of a [`WorkflowController::submit_proof`] call that reached a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Proof accepted; the task left the pending list.
    Verified {
        /// Increase of the streak count.
        streak_delta: u32,
        /// Success message shown to the user.
        message: String,
    },
    /// Proof refused; the task stays in the list as `rejected`.
    Rejected {
        /// Reason shown to the user.
        reason: String,
    },
    /// The task was dismissed while the proof was being checked; the
    /// verdict was dropped.
    Discarded,
}

/// Tunables for a [`WorkflowController`].
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Limit for every remote call.
    pub request_timeout: Duration,
    /// Route used for proof submission.
    pub proof_mode: ProofMode,
    /// Capacity of the event channel.
    pub event_buffer: usize,
    /// Classifier keyword table.
    pub keyword_rules: KeywordRules,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            proof_mode: ProofMode::Split,
            event_buffer: 64,
            keyword_rules: KeywordRules::default(),
        }
    }
}

/// Local state guarded by one lock. Never held across an `.await`.
#[derive(Debug, Default)]
struct Inner {
    store: TaskListStore,
    streak: StreakState,
    task_states: HashMap<TaskId, WorkflowState>,
    suggestion_state: WorkflowState,
    last_notice: Option<Notice>,
}

/// Submissions in flight, each with the token that abandons it.
type InFlight = Arc<Mutex<HashMap<TaskId, CancellationToken>>>;

/// Marks a task as having a submission in flight; released on drop.
struct InFlightGuard {
    map: InFlight,
    task_id: TaskId,
    token: CancellationToken,
}

impl InFlightGuard {
    /// Claims `task_id` with `token`, or returns `None` if it is already
    /// claimed.
    fn acquire(map: &InFlight, task_id: &TaskId, token: CancellationToken) -> Option<Self> {
        let mut claimed = map.lock();
        if claimed.contains_key(task_id) {
            return None;
        }
        claimed.insert(task_id.clone(), token.clone());
        drop(claimed);
        Some(Self {
            map: Arc::clone(map),
            task_id: task_id.clone(),
            token,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.map.lock().remove(&self.task_id);
    }
}

/// Drives the task workflow for one user-facing component.
///
/// All methods take `&self`; the controller can be shared behind an
/// [`Arc`] and driven from several tasks at once. At most one proof per
/// task is in flight at any time.
pub struct WorkflowController<A: TaskApi> {
    classifier: IssueClassifier,
    catalog: TaskCatalogClient<A>,
    pipeline: ProofPipeline<A>,
    inner: Mutex<Inner>,
    in_flight: InFlight,
    event_tx: mpsc::Sender<WorkflowEvent>,
    shutdown: CancellationToken,
}

impl<A: TaskApi> WorkflowController<A> {
    /// Creates a controller over `api`.
    ///
    /// Returns the controller and a receiver for [`WorkflowEvent`]s that
    /// the presentation layer should consume.
    pub fn new(api: Arc<A>, config: WorkflowConfig) -> (Self, mpsc::Receiver<WorkflowEvent>) {
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer.max(1));
        let controller = Self {
            classifier: IssueClassifier::new(config.keyword_rules),
            catalog: TaskCatalogClient::new(Arc::clone(&api), config.request_timeout),
            pipeline: ProofPipeline::new(api, config.proof_mode, config.request_timeout),
            inner: Mutex::new(Inner::default()),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            event_tx,
            shutdown: CancellationToken::new(),
        };
        (controller, event_rx)
    }

    /// Classifies mood text into trigger tags.
    #[must_use]
    pub fn classify(&self, text: &str) -> TagSet {
        self.classifier.classify(text)
    }

    /// Fetches the user's profile: adds every pending or rejected task not
    /// already listed and seeds the streak from the server. A rejected task
    /// keeps its feedback and can be resubmitted.
    ///
    /// Returns the number of tasks added.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Profile`] if the profile cannot be loaded,
    /// or [`WorkflowError::Cancelled`] after [`shutdown`](Self::shutdown).
    pub async fn refresh(&self, session: &Session) -> Result<usize, WorkflowError> {
        let result = tokio::select! {
            biased;
            () = self.shutdown.cancelled() => return Err(WorkflowError::Cancelled),
            r = self.catalog.fetch_profile(session) => r,
        };
        let (pending, update) = result.map_err(|e| {
            self.notify(Notice::new(NoticeKind::Error, CATALOG_UNREACHABLE));
            WorkflowError::Profile(e)
        })?;

        let (added, streak_changed) = {
            let mut inner = self.inner.lock();
            let added: Vec<TaskDescriptor> = pending
                .into_iter()
                .filter(|task| inner.store.add(task.clone()))
                .collect();
            for task in &added {
                inner
                    .task_states
                    .insert(task.task_id.clone(), listed_state(task));
            }
            let before = inner.streak.count;
            inner.streak.merge(&update);
            let after = inner.streak.count;
            (added, (after != before).then_some(after))
        };

        if let Some(count) = streak_changed {
            self.emit(WorkflowEvent::StreakChanged { count, delta: 0 });
        }
        info!(user_id = %session.user_id, added = added.len(), "profile refreshed");
        self.notify(Notice::new(
            NoticeKind::Info,
            format!("{} pending task(s) loaded.", added.len()),
        ));
        let count = added.len();
        for task in added {
            self.emit(WorkflowEvent::TaskAdded(task));
        }
        Ok(count)
    }

    /// Classifies `text`, asks the catalog for a matching task and adds it
    /// to the pending list.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyText`] for blank text,
    /// [`WorkflowError::Catalog`] if no suggestion could be obtained, or
    /// [`WorkflowError::Cancelled`] after [`shutdown`](Self::shutdown).
    pub async fn request_task(&self, text: &str) -> Result<TaskDescriptor, WorkflowError> {
        if text.trim().is_empty() {
            self.notify(Notice::new(NoticeKind::Error, EMPTY_TEXT_MESSAGE));
            return Err(ValidationError::EmptyText.into());
        }

        self.set_suggestion_state(WorkflowState::Classifying);
        let tags = self.classifier.classify(text);
        debug!(?tags, "mood text classified");

        self.set_suggestion_state(WorkflowState::AwaitingSuggestion);
        let result = tokio::select! {
            biased;
            () = self.shutdown.cancelled() => {
                self.set_suggestion_state(WorkflowState::Idle);
                return Err(WorkflowError::Cancelled);
            }
            r = self.catalog.suggest(&tags, Some(text)) => r,
        };
        self.accept_suggestion(result)
    }

    /// Asks the catalog for a task chosen from the user's profile and adds
    /// it to the pending list.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Catalog`] if no suggestion could be
    /// obtained, or [`WorkflowError::Cancelled`] after
    /// [`shutdown`](Self::shutdown).
    pub async fn suggest_for_user(&self, session: &Session) -> Result<TaskDescriptor, WorkflowError> {
        self.set_suggestion_state(WorkflowState::AwaitingSuggestion);
        let result = tokio::select! {
            biased;
            () = self.shutdown.cancelled() => {
                self.set_suggestion_state(WorkflowState::Idle);
                return Err(WorkflowError::Cancelled);
            }
            r = self.catalog.suggest_for_user(session) => r,
        };
        self.accept_suggestion(result)
    }

    fn accept_suggestion(
        &self,
        result: Result<TaskDescriptor, ApiError>,
    ) -> Result<TaskDescriptor, WorkflowError> {
        let task = match result {
            Ok(task) => task,
            Err(e) => {
                let err = WorkflowError::Catalog(e);
                self.set_suggestion_state(WorkflowState::Errored(err.kind()));
                self.notify(Notice::new(NoticeKind::Error, CATALOG_UNREACHABLE));
                return Err(err);
            }
        };

        let added = {
            let mut inner = self.inner.lock();
            let added = inner.store.add(task.clone());
            if added {
                inner
                    .task_states
                    .insert(task.task_id.clone(), WorkflowState::PendingProof);
            }
            added
        };
        if added {
            self.emit(WorkflowEvent::TaskAdded(task.clone()));
            self.emit(WorkflowEvent::StateChanged {
                task_id: Some(task.task_id.clone()),
                state: WorkflowState::PendingProof,
            });
        } else {
            debug!(task_id = %task.task_id, "suggested task already listed");
        }
        self.set_suggestion_state(WorkflowState::Idle);
        self.notify(Notice::new(NoticeKind::Success, TASK_ADDED));
        Ok(task)
    }

    /// Submits `photo` as proof for a pending task.
    ///
    /// Validation, lookup and the in-flight check happen before any
    /// network call. Only a task waiting for proof (pending, rejected or
    /// after a failed attempt) is submitted. A second call for the same task while the first is
    /// running fails with [`WorkflowError::ConcurrentSubmission`].
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Upload`] or [`WorkflowError::Verification`]
    /// when no verdict could be obtained (the task stays pending), and
    /// [`WorkflowError::Cancelled`] if the controller is shut down before
    /// the verdict arrives.
    pub async fn submit_proof(
        &self,
        session: &Session,
        task_id: &TaskId,
        photo: Photo,
    ) -> Result<SubmitOutcome, WorkflowError> {
        if photo.is_empty() {
            self.notify(Notice::new(NoticeKind::Error, "Please select a photo first."));
            return Err(ValidationError::EmptyPhoto.into());
        }
        if self.shutdown.is_cancelled() {
            return Err(WorkflowError::Cancelled);
        }
        let listed = {
            let inner = self.inner.lock();
            inner
                .store
                .get(task_id)
                .cloned()
                .map(|task| (task, inner.task_states.get(task_id).cloned()))
        };
        let Some((task, state)) = listed else {
            return Err(WorkflowError::UnknownTask(task_id.clone()));
        };
        if let Some(state) = state
            && !state.accepts_proof()
        {
            warn!(task_id = %task_id, state = %state, "task is not waiting for proof");
            return Err(WorkflowError::ConcurrentSubmission(task_id.clone()));
        }
        let token = self.shutdown.child_token();
        let Some(guard) = InFlightGuard::acquire(&self.in_flight, task_id, token) else {
            warn!(task_id = %task_id, "proof already in flight");
            return Err(WorkflowError::ConcurrentSubmission(task_id.clone()));
        };

        self.begin_submission(&task);

        let work = async {
            let outcome = self
                .pipeline
                .submit(session, &task, photo, |step| self.enter_step(task_id, step))
                .await;
            let update = match &outcome {
                Ok(ProofOutcome::Verified {
                    verification,
                    streak,
                    ..
                }) => Some(self.reconcile_streak(session, verification, *streak).await),
                _ => None,
            };
            (outcome, update)
        };

        let (outcome, update) = tokio::select! {
            biased;
            () = self.shutdown.cancelled() => {
                info!(task_id = %task_id, "submission cancelled");
                self.abandon_submission(task_id);
                return Err(WorkflowError::Cancelled);
            }
            () = guard.token.cancelled() => {
                info!(task_id = %task_id, "task dismissed while in flight; verdict dropped");
                return Ok(SubmitOutcome::Discarded);
            }
            r = work => r,
        };
        if guard.token.is_cancelled() && !self.shutdown.is_cancelled() {
            info!(task_id = %task_id, "task dismissed before verdict was applied");
            return Ok(SubmitOutcome::Discarded);
        }

        match outcome {
            Ok(ProofOutcome::Verified { message, .. }) => {
                Ok(self.apply_verified(task_id, message.as_deref(), &update.unwrap_or_default()))
            }
            Ok(ProofOutcome::Rejected { reason }) => Ok(self.apply_rejected(task_id, reason)),
            Err(e) => Err(self.apply_failure(&task, e)),
        }
    }

    /// Runs [`submit_proof`](Self::submit_proof) on a new tokio task.
    pub fn spawn_submit(
        self: &Arc<Self>,
        session: Session,
        task_id: TaskId,
        photo: Photo,
    ) -> JoinHandle<Result<SubmitOutcome, WorkflowError>>
    where
        A: 'static,
    {
        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.submit_proof(&session, &task_id, photo).await })
    }

    /// Removes a task from the pending list and abandons its submission,
    /// if one is running. The abandoned submission resolves to
    /// [`SubmitOutcome::Discarded`] even if the same id is listed again
    /// before its response arrives. Returns `false` if the task was not
    /// listed.
    pub fn dismiss(&self, task_id: &TaskId) -> bool {
        if let Some(token) = self.in_flight.lock().get(task_id) {
            token.cancel();
        }
        let removed = {
            let mut inner = self.inner.lock();
            inner.task_states.remove(task_id);
            inner.store.remove(task_id).is_some()
        };
        if removed {
            info!(task_id = %task_id, "task dismissed");
            self.emit(WorkflowEvent::TaskRemoved(task_id.clone()));
        }
        removed
    }

    /// Cancels every running operation. Later calls return
    /// [`WorkflowError::Cancelled`].
    pub fn shutdown(&self) {
        info!("workflow shutting down");
        self.shutdown.cancel();
    }

    /// Tasks currently listed, in insertion order.
    #[must_use]
    pub fn pending_tasks(&self) -> Vec<TaskDescriptor> {
        self.inner.lock().store.tasks().to_vec()
    }

    /// A listed task by id.
    #[must_use]
    pub fn task(&self, task_id: &TaskId) -> Option<TaskDescriptor> {
        self.inner.lock().store.get(task_id).cloned()
    }

    /// Workflow state of a task, if it is known.
    #[must_use]
    pub fn task_state(&self, task_id: &TaskId) -> Option<WorkflowState> {
        self.inner.lock().task_states.get(task_id).cloned()
    }

    /// State of the suggestion slot.
    #[must_use]
    pub fn suggestion_state(&self) -> WorkflowState {
        self.inner.lock().suggestion_state.clone()
    }

    /// Current streak and earned badges.
    #[must_use]
    pub fn streak(&self) -> StreakState {
        self.inner.lock().streak.clone()
    }

    /// The most recent user-facing message.
    #[must_use]
    pub fn last_notice(&self) -> Option<Notice> {
        self.inner.lock().last_notice.clone()
    }

    /// Whether a proof for `task_id` is being submitted.
    #[must_use]
    pub fn is_in_flight(&self, task_id: &TaskId) -> bool {
        self.in_flight.lock().contains_key(task_id)
    }

    /// Marks the task submitted and resets a failed or rejected state.
    fn begin_submission(&self, task: &TaskDescriptor) {
        let mut inner = self.inner.lock();
        inner
            .store
            .replace_status(&task.task_id, TaskStatus::Submitted, StatusFields::default());
        let retrying = inner
            .task_states
            .get(&task.task_id)
            .is_some_and(|s| !matches!(s, WorkflowState::PendingProof));
        drop(inner);
        if retrying {
            self.set_task_state(&task.task_id, WorkflowState::PendingProof);
        }
    }

    fn enter_step(&self, task_id: &TaskId, step: PipelineStep) {
        let state = match step {
            PipelineStep::Uploading => WorkflowState::Uploading,
            PipelineStep::Verifying => WorkflowState::Verifying,
        };
        self.set_task_state(task_id, state);
    }

    /// Works out the streak report for an accepted proof. The server count
    /// is authoritative; when the verdict carries none, the profile is
    /// read. A failed read leaves the streak unchanged.
    async fn reconcile_streak(
        &self,
        session: &Session,
        verification: &VerificationResult,
        streak: Option<u32>,
    ) -> StreakUpdate {
        let mut update = match streak {
            Some(count) => StreakUpdate {
                count: Some(count),
                badges: Vec::new(),
            },
            None => match self.catalog.fetch_profile(session).await {
                Ok((_, update)) => update,
                Err(e) => {
                    warn!(error = %e, "streak reconciliation failed");
                    StreakUpdate::default()
                }
            },
        };
        if let Some(badge) = &verification.badge_awarded
            && !update.badges.iter().any(|b| &b.badge == badge)
        {
            update.badges.push(EarnedBadge {
                badge: badge.clone(),
                earned_at: Utc::now(),
            });
        }
        update
    }

    fn apply_verified(
        &self,
        task_id: &TaskId,
        server_message: Option<&str>,
        update: &StreakUpdate,
    ) -> SubmitOutcome {
        let (delta, count) = {
            let mut inner = self.inner.lock();
            inner
                .store
                .replace_status(task_id, TaskStatus::Verified, StatusFields::default());
            let delta = inner.streak.merge(update);
            (delta, inner.streak.count)
        };
        self.set_task_state(task_id, WorkflowState::Verified);
        self.emit(WorkflowEvent::TaskRemoved(task_id.clone()));
        if delta > 0 {
            self.emit(WorkflowEvent::StreakChanged { count, delta });
        }

        let message = success_message(server_message, delta);
        info!(task_id = %task_id, streak = count, delta, "task verified");
        self.notify(Notice::new(NoticeKind::Success, message.clone()));
        SubmitOutcome::Verified {
            streak_delta: delta,
            message,
        }
    }

    fn apply_rejected(&self, task_id: &TaskId, reason: Option<String>) -> SubmitOutcome {
        let reason = reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| REJECTED_FALLBACK.to_string());
        self.inner.lock().store.replace_status(
            task_id,
            TaskStatus::Rejected,
            StatusFields::feedback(reason.clone()),
        );
        self.set_task_state(
            task_id,
            WorkflowState::Rejected {
                reason: reason.clone(),
            },
        );
        info!(task_id = %task_id, reason = %reason, "proof rejected");
        self.notify(Notice::new(NoticeKind::Error, reason.clone()));
        SubmitOutcome::Rejected { reason }
    }

    fn apply_failure(&self, task: &TaskDescriptor, err: PipelineError) -> WorkflowError {
        let err = WorkflowError::from(err);
        self.inner.lock().store.replace_status(
            &task.task_id,
            TaskStatus::Pending,
            StatusFields {
                feedback: task.feedback.clone(),
            },
        );
        self.set_task_state(&task.task_id, WorkflowState::Errored(err.kind()));
        warn!(task_id = %task.task_id, error = %err, "proof submission failed");
        self.notify(Notice::new(NoticeKind::Error, failure_message(&err)));
        err
    }

    /// Puts a task whose submission was cancelled back to pending.
    fn abandon_submission(&self, task_id: &TaskId) {
        let present = self.inner.lock().store.replace_status(
            task_id,
            TaskStatus::Pending,
            StatusFields::default(),
        );
        if present {
            self.set_task_state(task_id, WorkflowState::PendingProof);
        }
    }

    fn set_task_state(&self, task_id: &TaskId, next: WorkflowState) {
        {
            let mut inner = self.inner.lock();
            let Some(current) = inner.task_states.get_mut(task_id) else {
                debug!(task_id = %task_id, state = %next, "state change for unlisted task ignored");
                return;
            };
            debug_assert!(
                current.can_transition_to(&next),
                "illegal workflow transition {current} -> {next} for {task_id}"
            );
            debug!(task_id = %task_id, from = %current, to = %next, "workflow state changed");
            *current = next.clone();
        }
        self.emit(WorkflowEvent::StateChanged {
            task_id: Some(task_id.clone()),
            state: next,
        });
    }

    fn set_suggestion_state(&self, next: WorkflowState) {
        self.inner.lock().suggestion_state = next.clone();
        self.emit(WorkflowEvent::StateChanged {
            task_id: None,
            state: next,
        });
    }

    fn notify(&self, notice: Notice) {
        self.inner.lock().last_notice = Some(notice.clone());
        self.emit(WorkflowEvent::Notice(notice));
    }

    fn emit(&self, event: WorkflowEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(event)) => {
                warn!(?event, "workflow event channel full, event dropped");
            }
        }
    }
}

/// Workflow state of a task taken from the profile.
fn listed_state(task: &TaskDescriptor) -> WorkflowState {
    match task.status {
        TaskStatus::Rejected => WorkflowState::Rejected {
            reason: task
                .feedback
                .clone()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| REJECTED_FALLBACK.to_string()),
        },
        _ => WorkflowState::PendingProof,
    }
}

/// Message shown after an accepted proof.
fn success_message(server_message: Option<&str>, delta: u32) -> String {
    let base = server_message.unwrap_or("Verified! Great job!");
    if delta > 0 {
        format!("{base} +{delta} day streak!")
    } else {
        base.to_string()
    }
}

/// Message shown after a submission that produced no verdict.
fn failure_message(err: &WorkflowError) -> String {
    let detail = match err {
        WorkflowError::Upload(e) | WorkflowError::Verification(e) => e.detail(),
        _ => None,
    };
    match (err.kind(), detail) {
        (_, Some(detail)) => detail.to_string(),
        (ErrorKind::Upload, None) => "Could not upload the photo. Please try again.".to_string(),
        _ => "Could not verify the photo. Please try again.".to_string(),
    }
}
