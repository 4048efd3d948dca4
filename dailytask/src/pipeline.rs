//! Proof submission: upload a photo, then have the remote verifier judge it.
//!
//! The pipeline is stateless between calls and never touches the task list.
//! It reports which step it is on through a callback and returns either an
//! explicit verdict ([`ProofOutcome`]) or the step that could not complete
//! ([`PipelineError`]). The distinction matters to callers: a verdict of
//! "not verified" moves a task to `rejected`, a failed step leaves it
//! `pending`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use dailytask_proto::proof::{SubmitStatus, VerificationResult, VerifyRequest};
use dailytask_proto::task::{TaskDescriptor, TaskId};

use crate::api::{ApiError, Photo, TaskApi};
use crate::catalog::with_timeout;
use crate::session::Session;

/// Which backend route carries the proof.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofMode {
    /// `POST /api/tasks/upload` followed by `POST /api/tasks/verify`.
    #[default]
    Split,
    /// `POST /api/submit-task`: one round trip, the server records the verdict.
    Combined,
}

impl fmt::Display for ProofMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Split => f.write_str("split"),
            Self::Combined => f.write_str("combined"),
        }
    }
}

/// Error returned when parsing an unknown proof mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown proof mode {0:?} (expected \"split\" or \"combined\")")]
pub struct ParseProofModeError(String);

impl FromStr for ProofMode {
    type Err = ParseProofModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "split" => Ok(Self::Split),
            "combined" => Ok(Self::Combined),
            _ => Err(ParseProofModeError(s.to_string())),
        }
    }
}

/// The network step the pipeline is about to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    /// Sending the photo.
    Uploading,
    /// Waiting for the verifier's verdict.
    Verifying,
}

/// One proof being pushed through the pipeline. Lives only for the
/// duration of a single [`ProofPipeline::submit`] call.
#[derive(Debug, Clone)]
pub struct ProofAttempt {
    /// Task the proof is for.
    pub task_id: TaskId,
    /// The photo being submitted.
    pub photo: Photo,
    /// Server-side path, set once the upload step succeeded.
    pub uploaded_path: Option<String>,
    /// Verdict, set once the verify step succeeded.
    pub verification: Option<VerificationResult>,
}

impl ProofAttempt {
    fn new(task_id: TaskId, photo: Photo) -> Self {
        Self {
            task_id,
            photo,
            uploaded_path: None,
            verification: None,
        }
    }

    /// The verify request for this attempt, if the upload has completed.
    fn verify_request(&self, task_text: &str) -> Option<VerifyRequest> {
        self.uploaded_path.as_ref().map(|path| VerifyRequest {
            task_text: task_text.to_string(),
            photo_path: path.clone(),
        })
    }
}

/// An explicit verdict from the verifier.
#[derive(Debug, Clone, PartialEq)]
pub enum ProofOutcome {
    /// The proof was accepted.
    Verified {
        /// The verifier's answer.
        verification: VerificationResult,
        /// Server streak count, when the response carried one.
        streak: Option<u32>,
        /// Server message (combined mode).
        message: Option<String>,
    },
    /// The proof was checked and refused.
    Rejected {
        /// Verifier explanation, if any.
        reason: Option<String>,
    },
}

/// A pipeline step that could not complete. The task stays resubmittable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// The photo could not be uploaded.
    #[error("upload failed: {0}")]
    Upload(ApiError),

    /// The proof could not be checked.
    #[error("verification failed: {0}")]
    Verification(ApiError),
}

impl PipelineError {
    /// The underlying API error.
    #[must_use]
    pub const fn api_error(&self) -> &ApiError {
        match self {
            Self::Upload(e) | Self::Verification(e) => e,
        }
    }
}

/// Runs proof submissions against a [`TaskApi`].
#[derive(Debug)]
pub struct ProofPipeline<A: TaskApi> {
    api: Arc<A>,
    mode: ProofMode,
    timeout: Duration,
}

impl<A: TaskApi> ProofPipeline<A> {
    /// Creates a pipeline; every network step gets at most `timeout`.
    pub const fn new(api: Arc<A>, mode: ProofMode, timeout: Duration) -> Self {
        Self { api, mode, timeout }
    }

    /// The route this pipeline submits through.
    #[must_use]
    pub const fn mode(&self) -> ProofMode {
        self.mode
    }

    /// Submits `photo` as proof for `task`.
    ///
    /// `on_step` is called right before each network step. In split mode
    /// the verify request is only issued after the upload succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Upload`] if the photo could not be
    /// uploaded and [`PipelineError::Verification`] if no verdict could be
    /// obtained. An explicit refusal is `Ok(ProofOutcome::Rejected)`.
    pub async fn submit(
        &self,
        session: &Session,
        task: &TaskDescriptor,
        photo: Photo,
        mut on_step: impl FnMut(PipelineStep) + Send,
    ) -> Result<ProofOutcome, PipelineError> {
        let attempt = ProofAttempt::new(task.task_id.clone(), photo);
        match self.mode {
            ProofMode::Split => self.submit_split(task, attempt, &mut on_step).await,
            ProofMode::Combined => self.submit_combined(session, attempt, &mut on_step).await,
        }
    }

    async fn submit_split(
        &self,
        task: &TaskDescriptor,
        mut attempt: ProofAttempt,
        on_step: &mut (impl FnMut(PipelineStep) + Send),
    ) -> Result<ProofOutcome, PipelineError> {
        // Step 1: upload
        on_step(PipelineStep::Uploading);
        debug!(task_id = %attempt.task_id, size = attempt.photo.bytes.len(), "uploading proof");
        let upload = with_timeout(self.timeout, self.api.upload_photo(&attempt.photo))
            .await
            .map_err(|e| {
                warn!(task_id = %attempt.task_id, error = %e, "proof upload failed");
                PipelineError::Upload(e)
            })?;
        if upload.photo_path.trim().is_empty() {
            warn!(task_id = %attempt.task_id, "upload returned no photo path");
            return Err(PipelineError::Upload(ApiError::InvalidResponse(
                "upload returned an empty photo_path".to_string(),
            )));
        }
        attempt.uploaded_path = Some(upload.photo_path);

        // Step 2: verify
        let request = attempt.verify_request(&task.title);
        debug_assert!(request.is_some(), "verify issued without an upload path");
        let Some(request) = request else {
            return Err(PipelineError::Upload(ApiError::InvalidResponse(
                "no upload path recorded".to_string(),
            )));
        };
        on_step(PipelineStep::Verifying);
        debug!(task_id = %attempt.task_id, photo_path = %request.photo_path, "verifying proof");
        let verification = with_timeout(self.timeout, self.api.verify(&request))
            .await
            .map_err(|e| {
                warn!(task_id = %attempt.task_id, error = %e, "proof verification failed");
                PipelineError::Verification(e)
            })?;
        attempt.verification = Some(verification);

        Ok(Self::conclude(attempt, None))
    }

    async fn submit_combined(
        &self,
        session: &Session,
        mut attempt: ProofAttempt,
        on_step: &mut (impl FnMut(PipelineStep) + Send),
    ) -> Result<ProofOutcome, PipelineError> {
        on_step(PipelineStep::Uploading);
        debug!(task_id = %attempt.task_id, user_id = %session.user_id, "submitting proof");
        let result = with_timeout(
            self.timeout,
            self.api
                .submit_combined(&session.user_id, &attempt.task_id, &attempt.photo),
        )
        .await;

        match result {
            Ok(response) => {
                let message = Some(response.message.clone()).filter(|m| !m.trim().is_empty());
                let refused = response.status == Some(SubmitStatus::Rejected);
                let mut verification = response.into_verification();
                if refused {
                    verification.reason = message.clone();
                }
                attempt.uploaded_path = verification.url.clone();
                attempt.verification = Some(verification);
                Ok(Self::conclude(attempt, message))
            }
            Err(ApiError::Server {
                body: Some(ref body),
                status,
            }) if body.is_rejection() => {
                info!(task_id = %attempt.task_id, status, "proof rejected");
                Ok(ProofOutcome::Rejected {
                    reason: body.detail().map(str::to_string),
                })
            }
            Err(e) => {
                warn!(task_id = %attempt.task_id, error = %e, "combined submission failed");
                Err(PipelineError::Verification(e))
            }
        }
    }

    /// Turns a completed attempt into a verdict.
    fn conclude(attempt: ProofAttempt, message: Option<String>) -> ProofOutcome {
        debug_assert!(attempt.verification.is_some(), "concluded without a verdict");
        let verification = attempt
            .verification
            .unwrap_or_else(|| VerificationResult::refused(None));
        if verification.verified {
            info!(task_id = %attempt.task_id, url = ?verification.url, "proof verified");
            ProofOutcome::Verified {
                streak: verification.streak,
                verification,
                message,
            }
        } else {
            let reason = verification.detail().map(str::to_string);
            info!(task_id = %attempt.task_id, reason = ?reason, "proof rejected");
            ProofOutcome::Rejected { reason }
        }
    }
}
