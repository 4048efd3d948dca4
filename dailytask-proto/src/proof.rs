//! Proof upload and verification payloads.

use serde::{Deserialize, Serialize};

/// Response of `POST /api/tasks/upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Server-side reference to the stored photo, passed on to verification.
    pub photo_path: String,
    /// Public URL of the stored photo, if the server exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Body of `POST /api/tasks/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    /// The task instruction the photo should show.
    pub task_text: String,
    /// Reference returned by the upload step.
    pub photo_path: String,
}

/// Verdict of the remote verifier. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Whether the photo was accepted as proof.
    pub verified: bool,
    /// Explanation from the verifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// URL of the accepted photo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Verifier confidence in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// New server-side streak count, when the verifier records completions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streak: Option<u32>,
    /// Badge granted by this verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_awarded: Option<String>,
    /// Failure detail sent instead of `reason`, e.g. for a missing photo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerificationResult {
    /// A positive verdict with no extra detail.
    #[must_use]
    pub const fn accepted() -> Self {
        Self {
            verified: true,
            reason: None,
            url: None,
            confidence: None,
            streak: None,
            badge_awarded: None,
            error: None,
        }
    }

    /// A negative verdict with an optional reason.
    #[must_use]
    pub const fn refused(reason: Option<String>) -> Self {
        Self {
            verified: false,
            reason,
            url: None,
            confidence: None,
            streak: None,
            badge_awarded: None,
            error: None,
        }
    }

    /// Explanation for the user: `reason`, else `error`.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.reason.as_deref().or(self.error.as_deref())
    }
}

/// Status reported by `POST /api/submit-task`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitStatus {
    /// The proof was accepted and the task closed.
    Approved,
    /// The proof was refused.
    Rejected,
}

/// Success body of `POST /api/submit-task`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Verdict; absent on older servers, which only answer 2xx on approval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SubmitStatus>,
    /// Encouragement text to show the user.
    #[serde(default)]
    pub message: String,
    /// New total streak count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streak: Option<u32>,
    /// Badge granted by this submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_awarded: Option<String>,
    /// Where the server stored the photo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// Verifier confidence in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl SubmitResponse {
    /// Converts the combined-route answer into a [`VerificationResult`].
    #[must_use]
    pub fn into_verification(self) -> VerificationResult {
        VerificationResult {
            verified: self.status != Some(SubmitStatus::Rejected),
            reason: None,
            url: self.photo_url,
            confidence: self.confidence,
            streak: self.streak,
            badge_awarded: self.badge_awarded,
            error: None,
        }
    }
}
