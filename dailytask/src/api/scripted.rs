//! Scripted task API for testing.
//!
//! [`ScriptedApi`] answers every route from a per-route queue of prepared
//! results and records each call it receives, so tests can assert both on
//! workflow outcomes and on which requests were (or were not) issued. An
//! optional latency makes calls suspend, which is how tests hold a request
//! in flight.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;

use dailytask_proto::api::{
    ProfileResponse, ProfileSuggestResponse, TagSuggestRequest, TagSuggestResponse,
};
use dailytask_proto::proof::{SubmitResponse, UploadResponse, VerificationResult, VerifyRequest};
use dailytask_proto::task::TaskId;

use super::{ApiError, Photo, TaskApi};
use crate::session::UserId;

/// A request received by [`ScriptedApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    /// `GET /api/profile/{user_id}`.
    FetchProfile(UserId),
    /// `GET /api/suggest-task`.
    SuggestForUser(UserId),
    /// `POST /api/tasks/suggest`.
    SuggestByTags(TagSuggestRequest),
    /// `POST /api/tasks/upload`, recorded by file name.
    Upload(String),
    /// `POST /api/tasks/verify`.
    Verify(VerifyRequest),
    /// `POST /api/submit-task`.
    SubmitCombined {
        /// Submitting user.
        user_id: UserId,
        /// Task the proof is for.
        task_id: TaskId,
    },
}

type Queue<T> = Mutex<VecDeque<Result<T, ApiError>>>;

/// In-process [`TaskApi`] with queued responses.
///
/// A route whose queue is empty answers [`ApiError::Network`].
#[derive(Debug, Default)]
pub struct ScriptedApi {
    profiles: Queue<ProfileResponse>,
    user_suggestions: Queue<ProfileSuggestResponse>,
    tag_suggestions: Queue<TagSuggestResponse>,
    uploads: Queue<UploadResponse>,
    verifications: Queue<VerificationResult>,
    combined: Queue<SubmitResponse>,
    calls: Mutex<Vec<ApiCall>>,
    latency: Mutex<Option<Duration>>,
}

impl ScriptedApi {
    /// Creates an API with empty queues and no latency.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every answer by `latency` (tokio time, so it can be paused).
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(Some(latency));
        self
    }

    /// Changes the delay applied to calls made from now on.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Queues an answer for `fetch_profile`.
    pub fn push_profile(&self, result: Result<ProfileResponse, ApiError>) {
        self.profiles.lock().push_back(result);
    }

    /// Queues an answer for `suggest_for_user`.
    pub fn push_user_suggestion(&self, result: Result<ProfileSuggestResponse, ApiError>) {
        self.user_suggestions.lock().push_back(result);
    }

    /// Queues an answer for `suggest_by_tags`.
    pub fn push_tag_suggestion(&self, result: Result<TagSuggestResponse, ApiError>) {
        self.tag_suggestions.lock().push_back(result);
    }

    /// Queues an answer for `upload_photo`.
    pub fn push_upload(&self, result: Result<UploadResponse, ApiError>) {
        self.uploads.lock().push_back(result);
    }

    /// Queues an answer for `verify`.
    pub fn push_verification(&self, result: Result<VerificationResult, ApiError>) {
        self.verifications.lock().push_back(result);
    }

    /// Queues an answer for `submit_combined`.
    pub fn push_combined(&self, result: Result<SubmitResponse, ApiError>) {
        self.combined.lock().push_back(result);
    }

    /// Every call received so far, in arrival order.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().clone()
    }

    /// Number of upload requests received.
    #[must_use]
    pub fn upload_count(&self) -> usize {
        self.count(|c| matches!(c, ApiCall::Upload(_)))
    }

    /// Number of verify requests received.
    #[must_use]
    pub fn verify_count(&self) -> usize {
        self.count(|c| matches!(c, ApiCall::Verify(_)))
    }

    /// Number of combined submit requests received.
    #[must_use]
    pub fn combined_count(&self) -> usize {
        self.count(|c| matches!(c, ApiCall::SubmitCombined { .. }))
    }

    fn count(&self, pred: impl Fn(&ApiCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    /// Records `call`, waits out the latency and pops the next answer.
    async fn answer<T>(&self, call: ApiCall, queue: &Queue<T>) -> Result<T, ApiError> {
        self.calls.lock().push(call);
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("no scripted response".to_string())))
    }
}

impl TaskApi for ScriptedApi {
    async fn fetch_profile(&self, user_id: &UserId) -> Result<ProfileResponse, ApiError> {
        self.answer(ApiCall::FetchProfile(user_id.clone()), &self.profiles)
            .await
    }

    async fn suggest_for_user(&self, user_id: &UserId) -> Result<ProfileSuggestResponse, ApiError> {
        self.answer(ApiCall::SuggestForUser(user_id.clone()), &self.user_suggestions)
            .await
    }

    async fn suggest_by_tags(
        &self,
        request: &TagSuggestRequest,
    ) -> Result<TagSuggestResponse, ApiError> {
        self.answer(ApiCall::SuggestByTags(request.clone()), &self.tag_suggestions)
            .await
    }

    async fn upload_photo(&self, photo: &Photo) -> Result<UploadResponse, ApiError> {
        self.answer(ApiCall::Upload(photo.file_name.clone()), &self.uploads)
            .await
    }

    async fn verify(&self, request: &VerifyRequest) -> Result<VerificationResult, ApiError> {
        self.answer(ApiCall::Verify(request.clone()), &self.verifications)
            .await
    }

    async fn submit_combined(
        &self,
        user_id: &UserId,
        task_id: &TaskId,
        _photo: &Photo,
    ) -> Result<SubmitResponse, ApiError> {
        let call = ApiCall::SubmitCombined {
            user_id: user_id.clone(),
            task_id: task_id.clone(),
        };
        self.answer(call, &self.combined).await
    }
}
