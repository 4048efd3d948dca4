//! Workflow states and the transitions between them.

use std::fmt;

/// Failure category shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A request could not be sent, completed or timed out.
    Network,
    /// The server answered with a non-2xx status or an unreadable body.
    Server,
    /// The proof photo could not be uploaded.
    Upload,
    /// The proof could not be checked.
    Verification,
    /// A submission for the same task is already running.
    ConcurrentSubmission,
    /// Required input was missing.
    Validation,
    /// The workflow was shut down while the operation ran.
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Network => "network",
            Self::Server => "server",
            Self::Upload => "upload",
            Self::Verification => "verification",
            Self::ConcurrentSubmission => "concurrent submission",
            Self::Validation => "validation",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Where a task (or the suggestion slot) is in the workflow.
///
/// ```text
/// Idle -> Classifying -> AwaitingSuggestion -> PendingProof
///      -> Uploading -> Verifying -> Verified | Rejected | Errored
/// ```
///
/// `Rejected` and `Errored` go back to `PendingProof` when the user retries.
/// Combined proof submission goes from `Uploading` straight to a verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WorkflowState {
    /// Nothing in progress.
    #[default]
    Idle,
    /// Mood text is being classified.
    Classifying,
    /// Waiting for the catalog to suggest a task.
    AwaitingSuggestion,
    /// Task assigned, waiting for a photo.
    PendingProof,
    /// Proof photo is being uploaded.
    Uploading,
    /// Waiting for the verifier's verdict.
    Verifying,
    /// Proof accepted. Terminal.
    Verified,
    /// Proof refused with the given reason.
    Rejected {
        /// Text shown to the user.
        reason: String,
    },
    /// The last operation failed before a verdict.
    Errored(ErrorKind),
}

impl WorkflowState {
    /// Whether moving from `self` to `next` is a legal step.
    #[must_use]
    pub const fn can_transition_to(&self, next: &Self) -> bool {
        use WorkflowState::{
            AwaitingSuggestion, Classifying, Errored, Idle, PendingProof, Rejected, Uploading,
            Verified, Verifying,
        };
        matches!(
            (self, next),
            (Idle | Errored(_), Classifying | AwaitingSuggestion)
                | (Classifying, AwaitingSuggestion | Errored(_))
                | (AwaitingSuggestion, Idle | PendingProof | Errored(_))
                | (PendingProof, Uploading)
                | (
                    Uploading,
                    Verifying | Verified | Rejected { .. } | Errored(_) | PendingProof
                )
                | (Verifying, Verified | Rejected { .. } | Errored(_) | PendingProof)
                | (Rejected { .. } | Errored(_), PendingProof)
                | (Errored(_), Idle)
        )
    }

    /// Whether a proof can be submitted from this state.
    #[must_use]
    pub const fn accepts_proof(&self) -> bool {
        matches!(self, Self::PendingProof | Self::Rejected { .. } | Self::Errored(_))
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Classifying => write!(f, "classifying"),
            Self::AwaitingSuggestion => write!(f, "awaiting suggestion"),
            Self::PendingProof => write!(f, "pending proof"),
            Self::Uploading => write!(f, "uploading"),
            Self::Verifying => write!(f, "verifying"),
            Self::Verified => write!(f, "verified"),
            Self::Rejected { reason } => write!(f, "rejected: {reason}"),
            Self::Errored(kind) => write!(f, "{kind} error"),
        }
    }
}
