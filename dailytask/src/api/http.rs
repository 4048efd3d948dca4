//! reqwest-backed [`TaskApi`] implementation.
//!
//! Talks JSON to the backend, multipart for photo uploads. Every request
//! shares one client-wide timeout; timeouts surface as [`ApiError::Timeout`].

use std::time::Duration;

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use dailytask_proto::api::{
    ErrorBody, ProfileResponse, ProfileSuggestResponse, TagSuggestRequest, TagSuggestResponse,
};
use dailytask_proto::proof::{SubmitResponse, UploadResponse, VerificationResult, VerifyRequest};
use dailytask_proto::task::TaskId;

use super::{ApiError, Photo, TaskApi};
use crate::session::UserId;

/// HTTP client for the recovery task backend.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    /// Shared HTTP client.
    client: Client,
    /// Base URL, always ending in `/`.
    base_url: Url,
    /// Timeout applied to every request.
    timeout: Duration,
}

impl HttpTaskApi {
    /// Creates a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if `base_url` is not an absolute
    /// URL, or [`ApiError::Network`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// The normalised base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins a relative route onto the base URL.
    fn endpoint(&self, route: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(route)
            .map_err(|e| ApiError::InvalidUrl(format!("{route}: {e}")))
    }

    /// Maps a reqwest error onto the API error taxonomy.
    fn transport_error(&self, err: &reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }

    /// Sends a prepared request and decodes the JSON answer.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&e))?;

        if status.is_success() {
            serde_json::from_slice(&bytes).map_err(|e| {
                warn!(error = %e, status = status.as_u16(), "failed to parse response body");
                ApiError::InvalidResponse(e.to_string())
            })
        } else {
            let body = serde_json::from_slice::<ErrorBody>(&bytes).ok();
            debug!(status = status.as_u16(), detail = ?body.as_ref().and_then(ErrorBody::detail), "request failed");
            Err(ApiError::Server {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// Builds the multipart part carrying the photo.
    fn photo_part(photo: &Photo) -> Result<Part, ApiError> {
        Part::bytes(photo.bytes.clone())
            .file_name(photo.file_name.clone())
            .mime_str(&photo.content_type)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid photo content type: {e}")))
    }
}

impl TaskApi for HttpTaskApi {
    async fn fetch_profile(&self, user_id: &UserId) -> Result<ProfileResponse, ApiError> {
        let mut url = self.endpoint("api/profile/")?;
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(user_id.as_str());
        }
        debug!(url = %url, "GET profile");
        self.execute(self.client.get(url)).await
    }

    async fn suggest_for_user(&self, user_id: &UserId) -> Result<ProfileSuggestResponse, ApiError> {
        let mut url = self.endpoint("api/suggest-task")?;
        url.query_pairs_mut()
            .append_pair("user_id", user_id.as_str());
        debug!(url = %url, "GET suggest-task");
        self.execute(self.client.get(url)).await
    }

    async fn suggest_by_tags(
        &self,
        request: &TagSuggestRequest,
    ) -> Result<TagSuggestResponse, ApiError> {
        let url = self.endpoint("api/tasks/suggest")?;
        debug!(url = %url, issues = ?request.issues, "POST tasks/suggest");
        self.execute(self.client.post(url).json(request)).await
    }

    async fn upload_photo(&self, photo: &Photo) -> Result<UploadResponse, ApiError> {
        let url = self.endpoint("api/tasks/upload")?;
        let form = Form::new().part("photo", Self::photo_part(photo)?);
        debug!(url = %url, size = photo.bytes.len(), "POST tasks/upload");
        self.execute(self.client.post(url).multipart(form)).await
    }

    async fn verify(&self, request: &VerifyRequest) -> Result<VerificationResult, ApiError> {
        let url = self.endpoint("api/tasks/verify")?;
        debug!(url = %url, photo_path = %request.photo_path, "POST tasks/verify");
        self.execute(self.client.post(url).json(request)).await
    }

    async fn submit_combined(
        &self,
        user_id: &UserId,
        task_id: &TaskId,
        photo: &Photo,
    ) -> Result<SubmitResponse, ApiError> {
        let url = self.endpoint("api/submit-task")?;
        let form = Form::new()
            .text("user_id", user_id.as_str().to_string())
            .text("task_id", task_id.as_str().to_string())
            .part("photo", Self::photo_part(photo)?);
        debug!(url = %url, task_id = %task_id, "POST submit-task");
        self.execute(self.client.post(url).multipart(form)).await
    }
}
