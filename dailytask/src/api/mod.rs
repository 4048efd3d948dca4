//! Remote task API abstraction.
//!
//! Defines the [`TaskApi`] trait covering every route the task workflow
//! talks to. Implementations:
//! - [`http::HttpTaskApi`]: reqwest client against the real backend
//! - [`scripted::ScriptedApi`]: in-process scripted responses for testing

pub mod http;
pub mod scripted;

use std::path::Path;
use std::time::Duration;

use dailytask_proto::api::{
    ErrorBody, ProfileResponse, ProfileSuggestResponse, TagSuggestRequest, TagSuggestResponse,
};
use dailytask_proto::proof::{SubmitResponse, UploadResponse, VerificationResult, VerifyRequest};
use dailytask_proto::task::TaskId;

use crate::session::UserId;

/// Errors that can occur while talking to the remote API.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The request could not be sent or the connection broke.
    #[error("network error: {0}")]
    Network(String),

    /// No response arrived within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered with a non-2xx status.
    #[error("server returned {status}{}", detail_suffix(.body.as_ref()))]
    Server {
        /// HTTP status code.
        status: u16,
        /// Parsed error body, `None` when the body was absent or not JSON.
        body: Option<ErrorBody>,
    },

    /// A 2xx response body did not match the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The endpoint URL could not be built.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The request could not be assembled from the given input.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

fn detail_suffix(body: Option<&ErrorBody>) -> String {
    body.and_then(ErrorBody::detail)
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

impl ApiError {
    /// Whether the failure happened before any server verdict was received.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }

    /// Server-supplied detail text, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Server { body, .. } => body.as_ref().and_then(ErrorBody::detail),
            _ => None,
        }
    }
}

/// Photo extensions accepted as proof, with their content types.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("heic", "image/heic"),
];

/// A photo selected as proof of task completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    /// Original file name, sent as the multipart file name.
    pub file_name: String,
    /// MIME type of the image.
    pub content_type: String,
    /// Raw image bytes.
    pub bytes: Vec<u8>,
}

impl Photo {
    /// Wraps in-memory image bytes, guessing the content type from the name.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name).to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Reads a photo from disk.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be read.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("photo.jpg")
            .to_string();
        Ok(Self::new(file_name, bytes))
    }

    /// Whether the photo carries no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    IMAGE_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map_or("application/octet-stream", |&(_, mime)| mime)
}

/// Async access to the task catalog, proof upload and verification routes.
///
/// Implementations map transport failures to [`ApiError::Network`] and
/// non-2xx answers to [`ApiError::Server`]; they never retry on their own.
pub trait TaskApi: Send + Sync {
    /// `GET /api/profile/{user_id}`.
    fn fetch_profile(
        &self,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<ProfileResponse, ApiError>> + Send;

    /// `GET /api/suggest-task?user_id={id}`.
    fn suggest_for_user(
        &self,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<ProfileSuggestResponse, ApiError>> + Send;

    /// `POST /api/tasks/suggest`.
    fn suggest_by_tags(
        &self,
        request: &TagSuggestRequest,
    ) -> impl std::future::Future<Output = Result<TagSuggestResponse, ApiError>> + Send;

    /// `POST /api/tasks/upload` (multipart field `photo`).
    fn upload_photo(
        &self,
        photo: &Photo,
    ) -> impl std::future::Future<Output = Result<UploadResponse, ApiError>> + Send;

    /// `POST /api/tasks/verify`.
    fn verify(
        &self,
        request: &VerifyRequest,
    ) -> impl std::future::Future<Output = Result<VerificationResult, ApiError>> + Send;

    /// `POST /api/submit-task` (multipart `user_id`, `task_id`, `photo`).
    fn submit_combined(
        &self,
        user_id: &UserId,
        task_id: &TaskId,
        photo: &Photo,
    ) -> impl std::future::Future<Output = Result<SubmitResponse, ApiError>> + Send;
}
