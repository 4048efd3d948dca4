//! Integration tests for the proof workflow.
//!
//! Drives a `WorkflowController` over the scripted API through the full
//! suggest -> upload -> verify -> streak cycle, including the failure,
//! concurrency, timeout and cancellation paths.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::too_many_lines)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;

use dailytask::api::scripted::{ApiCall, ScriptedApi};
use dailytask::api::{ApiError, Photo};
use dailytask::pipeline::ProofMode;
use dailytask::session::Session;
use dailytask::workflow::{
    ErrorKind, NoticeKind, REJECTED_FALLBACK, SubmitOutcome, WorkflowConfig, WorkflowController,
    WorkflowError, WorkflowEvent, WorkflowState,
};
use dailytask_proto::api::{ErrorBody, ProfileResponse, TagSuggestResponse};
use dailytask_proto::proof::{
    SubmitResponse, SubmitStatus, UploadResponse, VerificationResult, VerifyRequest,
};
use dailytask_proto::task::{TaskId, TaskStatus};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

const TASK_ID: &str = "task_1a2b3c4d";
const TASK_TITLE: &str = "Take a photo of a glass of water";

fn session() -> Session {
    Session::new("6650f0")
}

fn photo() -> Photo {
    Photo::new("proof.jpg", vec![0xff, 0xd8, 0xff, 0xe0])
}

/// A profile with one pending task and the given streak.
fn profile(streak: u32) -> ProfileResponse {
    serde_json::from_value(json!({
        "username": "sam",
        "streak": streak,
        "tasks": [
            {
                "task_id": TASK_ID,
                "title": TASK_TITLE,
                "difficulty": "easy",
                "category": ["substance"],
                "badge": "Substance Step I",
                "status": "pending",
                "assigned_at": "Sat, 17 Oct 2026 10:00:00 GMT"
            },
            {
                "task_id": "task_done",
                "title": "Already finished",
                "status": "approved"
            }
        ],
        "badges": []
    }))
    .unwrap()
}

/// The profile after the task was approved.
fn profile_after_approval(streak: u32) -> ProfileResponse {
    serde_json::from_value(json!({
        "streak": streak,
        "tasks": [{"task_id": TASK_ID, "title": TASK_TITLE, "status": "approved"}],
        "badges": [{"badge": "Substance Step I", "earned_at": "Sun, 18 Oct 2026 09:00:00 GMT"}]
    }))
    .unwrap()
}

fn uploaded(path: &str) -> UploadResponse {
    UploadResponse {
        photo_path: path.to_string(),
        url: None,
    }
}

fn setup(
    api: &Arc<ScriptedApi>,
    mode: ProofMode,
) -> (WorkflowController<ScriptedApi>, mpsc::Receiver<WorkflowEvent>) {
    let config = WorkflowConfig {
        proof_mode: mode,
        request_timeout: Duration::from_secs(5),
        ..WorkflowConfig::default()
    };
    WorkflowController::new(Arc::clone(api), config)
}

/// Builds a controller whose store already holds the profile's pending task.
async fn with_listed_task(
    api: &Arc<ScriptedApi>,
    mode: ProofMode,
    streak: u32,
) -> (WorkflowController<ScriptedApi>, mpsc::Receiver<WorkflowEvent>) {
    api.push_profile(Ok(profile(streak)));
    let (controller, rx) = setup(api, mode);
    assert_eq!(controller.refresh(&session()).await.unwrap(), 1);
    (controller, rx)
}

fn drain(rx: &mut mpsc::Receiver<WorkflowEvent>) -> Vec<WorkflowEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Yields until the controller reports a submission in flight.
async fn wait_in_flight(controller: &WorkflowController<ScriptedApi>, task_id: &TaskId) {
    while !controller.is_in_flight(task_id) {
        tokio::task::yield_now().await;
    }
}

// ===========================================================================
// Suggestion and task list
// ===========================================================================

#[tokio::test]
async fn mood_text_becomes_pending_task() {
    let api = Arc::new(ScriptedApi::new());
    api.push_tag_suggestion(Ok(TagSuggestResponse {
        title: "Take a photo of something that calms you".to_string(),
        difficulty: None,
        badge: None,
        task_id: None,
        assigned_at: None,
    }));
    let (controller, _rx) = setup(&api, ProofMode::Split);

    let task = controller.request_task("I am craving a drink").await.unwrap();

    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.badge, "Substance Step I");
    assert!(task.category.contains("substance"));
    assert_eq!(controller.pending_tasks(), vec![task]);
    match &api.calls()[0] {
        ApiCall::SuggestByTags(request) => {
            assert_eq!(request.text, "I am craving a drink");
            assert_eq!(request.issues.len(), 1);
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn refresh_twice_does_not_duplicate() {
    let api = Arc::new(ScriptedApi::new());
    api.push_profile(Ok(profile(2)));
    api.push_profile(Ok(profile(2)));
    let (controller, mut rx) = setup(&api, ProofMode::Split);

    assert_eq!(controller.refresh(&session()).await.unwrap(), 1);
    assert_eq!(controller.refresh(&session()).await.unwrap(), 0);

    let tasks = controller.pending_tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].task_id, TaskId::new(TASK_ID));
    assert_eq!(controller.streak().count, 2);

    let streak_events: Vec<_> = drain(&mut rx)
        .into_iter()
        .filter(|e| matches!(e, WorkflowEvent::StreakChanged { .. }))
        .collect();
    assert_eq!(
        streak_events,
        vec![WorkflowEvent::StreakChanged { count: 2, delta: 0 }]
    );
}

#[tokio::test]
async fn repeated_suggestions_append() {
    let api = Arc::new(ScriptedApi::new());
    for title in ["First", "Second"] {
        api.push_tag_suggestion(Ok(TagSuggestResponse {
            title: title.to_string(),
            difficulty: None,
            badge: None,
            task_id: None,
            assigned_at: None,
        }));
    }
    let (controller, _rx) = setup(&api, ProofMode::Split);

    controller.request_task("sad").await.unwrap();
    controller.request_task("sad").await.unwrap();

    let titles: Vec<String> = controller
        .pending_tasks()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, ["First", "Second"]);
}

// ===========================================================================
// Split proof submission
// ===========================================================================

#[tokio::test]
async fn verified_proof_removes_task_and_reports_streak() {
    let api = Arc::new(ScriptedApi::new());
    let (controller, mut rx) = with_listed_task(&api, ProofMode::Split, 0).await;
    drain(&mut rx);

    api.push_upload(Ok(uploaded("/tmp/abc.jpg")));
    let mut accepted = VerificationResult::accepted();
    accepted.url = Some("/img/abc.jpg".to_string());
    api.push_verification(Ok(accepted));
    api.push_profile(Ok(profile_after_approval(1)));

    let task_id = TaskId::new(TASK_ID);
    let outcome = controller
        .submit_proof(&session(), &task_id, photo())
        .await
        .unwrap();

    let SubmitOutcome::Verified {
        streak_delta,
        message,
    } = &outcome
    else {
        panic!("expected verified outcome, got {outcome:?}");
    };
    assert_eq!(*streak_delta, 1);
    assert!(message.contains("+1 day streak!"), "message was {message:?}");
    assert!(controller.pending_tasks().is_empty());
    assert_eq!(controller.task_state(&task_id), Some(WorkflowState::Verified));
    assert_eq!(controller.streak().count, 1);
    assert_eq!(
        controller.streak().latest_badge().unwrap().badge,
        "Substance Step I"
    );

    assert!(
        api.calls().contains(&ApiCall::Verify(VerifyRequest {
            task_text: TASK_TITLE.to_string(),
            photo_path: "/tmp/abc.jpg".to_string(),
        }))
    );

    let events = drain(&mut rx);
    let removed = events
        .iter()
        .filter(|e| **e == WorkflowEvent::TaskRemoved(task_id.clone()))
        .count();
    assert_eq!(removed, 1);
    assert!(events.contains(&WorkflowEvent::StreakChanged { count: 1, delta: 1 }));
    let states: Vec<&WorkflowState> = events
        .iter()
        .filter_map(|e| match e {
            WorkflowEvent::StateChanged {
                task_id: Some(id),
                state,
            } if *id == task_id => Some(state),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        [
            &WorkflowState::Uploading,
            &WorkflowState::Verifying,
            &WorkflowState::Verified
        ]
    );
}

#[tokio::test]
async fn stale_server_streak_never_decreases_count() {
    let api = Arc::new(ScriptedApi::new());
    let (controller, _rx) = with_listed_task(&api, ProofMode::Split, 5).await;

    api.push_upload(Ok(uploaded("/tmp/abc.jpg")));
    api.push_verification(Ok(VerificationResult::accepted()));
    api.push_profile(Ok(profile_after_approval(3)));

    let outcome = controller
        .submit_proof(&session(), &TaskId::new(TASK_ID), photo())
        .await
        .unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::Verified {
            streak_delta: 0,
            message: "Verified! Great job!".to_string()
        }
    );
    assert_eq!(controller.streak().count, 5);
}

#[tokio::test]
async fn failed_streak_lookup_keeps_verification() {
    let api = Arc::new(ScriptedApi::new());
    let (controller, _rx) = with_listed_task(&api, ProofMode::Split, 1).await;

    api.push_upload(Ok(uploaded("/tmp/abc.jpg")));
    api.push_verification(Ok(VerificationResult::accepted()));
    // no profile queued: the reconciliation fetch fails

    let outcome = controller
        .submit_proof(&session(), &TaskId::new(TASK_ID), photo())
        .await
        .unwrap();
    assert!(matches!(outcome, SubmitOutcome::Verified { streak_delta: 0, .. }));
    assert!(controller.pending_tasks().is_empty());
    assert_eq!(controller.streak().count, 1);
}

#[tokio::test]
async fn rejected_proof_keeps_task_as_rejected() {
    let api = Arc::new(ScriptedApi::new());
    let (controller, _rx) = with_listed_task(&api, ProofMode::Split, 0).await;

    api.push_upload(Ok(uploaded("/tmp/abc.jpg")));
    api.push_verification(Ok(VerificationResult::refused(None)));

    let task_id = TaskId::new(TASK_ID);
    let outcome = controller
        .submit_proof(&session(), &task_id, photo())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        SubmitOutcome::Rejected {
            reason: REJECTED_FALLBACK.to_string()
        }
    );
    let task = controller.task(&task_id).unwrap();
    assert_eq!(task.status, TaskStatus::Rejected);
    assert_eq!(task.feedback.as_deref(), Some(REJECTED_FALLBACK));
    assert_eq!(
        controller.task_state(&task_id),
        Some(WorkflowState::Rejected {
            reason: REJECTED_FALLBACK.to_string()
        })
    );
    assert_eq!(controller.streak().count, 0);
    assert!(!controller.is_in_flight(&task_id));
}

#[tokio::test]
async fn rejected_task_can_be_resubmitted() {
    let api = Arc::new(ScriptedApi::new());
    let (controller, _rx) = with_listed_task(&api, ProofMode::Split, 0).await;
    let task_id = TaskId::new(TASK_ID);

    api.push_upload(Ok(uploaded("/tmp/dark.jpg")));
    api.push_verification(Ok(VerificationResult::refused(Some(
        "Best match: 'a photo of a dark room'".to_string(),
    ))));
    api.push_upload(Ok(uploaded("/tmp/water.jpg")));
    let mut accepted = VerificationResult::accepted();
    accepted.streak = Some(1);
    api.push_verification(Ok(accepted));

    let first = controller
        .submit_proof(&session(), &task_id, photo())
        .await
        .unwrap();
    assert!(matches!(first, SubmitOutcome::Rejected { ref reason } if reason.contains("dark room")));

    let second = controller
        .submit_proof(&session(), &task_id, photo())
        .await
        .unwrap();
    assert!(matches!(second, SubmitOutcome::Verified { streak_delta: 1, .. }));
    assert!(controller.pending_tasks().is_empty());
}

#[tokio::test]
async fn server_rejected_task_is_listed_for_resubmission() {
    let api = Arc::new(ScriptedApi::new());
    api.push_profile(Ok(serde_json::from_value(json!({
        "streak": 1,
        "tasks": [{
            "task_id": TASK_ID,
            "title": TASK_TITLE,
            "status": "rejected",
            "feedback": "The glass is not visible"
        }]
    }))
    .unwrap()));
    let (controller, _rx) = setup(&api, ProofMode::Combined);

    assert_eq!(controller.refresh(&session()).await.unwrap(), 1);
    let task_id = TaskId::new(TASK_ID);
    let task = controller.task(&task_id).unwrap();
    assert_eq!(task.status, TaskStatus::Rejected);
    assert_eq!(task.feedback.as_deref(), Some("The glass is not visible"));
    assert_eq!(
        controller.task_state(&task_id),
        Some(WorkflowState::Rejected {
            reason: "The glass is not visible".to_string()
        })
    );

    api.push_combined(Ok(SubmitResponse {
        status: Some(SubmitStatus::Approved),
        message: "Great job! Your task was verified and approved".to_string(),
        streak: Some(2),
        badge_awarded: None,
        photo_url: None,
        confidence: Some(0.9),
    }));
    let outcome = controller
        .submit_proof(&session(), &task_id, photo())
        .await
        .unwrap();

    assert!(matches!(outcome, SubmitOutcome::Verified { streak_delta: 1, .. }));
    assert!(controller.pending_tasks().is_empty());
    assert_eq!(controller.streak().count, 2);
}

#[tokio::test]
async fn upload_server_error_skips_verify_and_keeps_task_pending() {
    let api = Arc::new(ScriptedApi::new());
    let (controller, _rx) = with_listed_task(&api, ProofMode::Split, 0).await;

    api.push_upload(Err(ApiError::Server {
        status: 500,
        body: None,
    }));

    let task_id = TaskId::new(TASK_ID);
    let err = controller
        .submit_proof(&session(), &task_id, photo())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Upload(ApiError::Server { status: 500, .. })
    ));
    assert_eq!(api.verify_count(), 0);
    assert_eq!(controller.task(&task_id).unwrap().status, TaskStatus::Pending);
    assert_eq!(
        controller.task_state(&task_id),
        Some(WorkflowState::Errored(ErrorKind::Upload))
    );
    let notice = controller.last_notice().unwrap();
    assert_eq!(notice.kind, NoticeKind::Error);
    assert!(!controller.is_in_flight(&task_id));
}

#[tokio::test]
async fn verifier_failure_is_not_a_rejection() {
    let api = Arc::new(ScriptedApi::new());
    let (controller, _rx) = with_listed_task(&api, ProofMode::Split, 0).await;

    api.push_upload(Ok(uploaded("/tmp/abc.jpg")));
    api.push_verification(Err(ApiError::Server {
        status: 502,
        body: Some(ErrorBody {
            message: Some("verifier unavailable".to_string()),
            ..ErrorBody::default()
        }),
    }));

    let task_id = TaskId::new(TASK_ID);
    let err = controller
        .submit_proof(&session(), &task_id, photo())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Verification);
    let task = controller.task(&task_id).unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
    assert!(task.feedback.is_none());
    assert_eq!(controller.last_notice().unwrap().text, "verifier unavailable");
}

// ===========================================================================
// Concurrency, timeouts, cancellation
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn concurrent_submit_makes_one_upload() {
    let api = Arc::new(ScriptedApi::new().with_latency(Duration::from_secs(1)));
    api.push_profile(Ok(profile(0)));
    api.push_upload(Ok(uploaded("/tmp/abc.jpg")));
    let mut accepted = VerificationResult::accepted();
    accepted.streak = Some(1);
    api.push_verification(Ok(accepted));
    let (controller, _rx) = setup(&api, ProofMode::Split);
    let controller = Arc::new(controller);
    controller.refresh(&session()).await.unwrap();

    let task_id = TaskId::new(TASK_ID);
    let first = controller.spawn_submit(session(), task_id.clone(), photo());
    wait_in_flight(&controller, &task_id).await;

    let second = controller.submit_proof(&session(), &task_id, photo()).await;
    assert_eq!(
        second.unwrap_err(),
        WorkflowError::ConcurrentSubmission(task_id.clone())
    );

    let outcome = first.await.unwrap().unwrap();
    assert!(matches!(outcome, SubmitOutcome::Verified { streak_delta: 1, .. }));
    assert_eq!(api.upload_count(), 1);
    assert_eq!(api.verify_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn different_tasks_submit_concurrently() {
    let api = Arc::new(ScriptedApi::new().with_latency(Duration::from_millis(200)));
    let two_tasks: ProfileResponse = serde_json::from_value(json!({
        "streak": 0,
        "tasks": [
            {"task_id": "task_a", "title": "A", "status": "pending"},
            {"task_id": "task_b", "title": "B", "status": "pending"}
        ]
    }))
    .unwrap();
    api.push_profile(Ok(two_tasks));
    for _ in 0..2 {
        api.push_upload(Ok(uploaded("/tmp/x.jpg")));
        let mut accepted = VerificationResult::accepted();
        accepted.streak = Some(1);
        api.push_verification(Ok(accepted));
    }
    let (controller, _rx) = setup(&api, ProofMode::Split);
    let controller = Arc::new(controller);
    controller.refresh(&session()).await.unwrap();

    let a = controller.spawn_submit(session(), TaskId::new("task_a"), photo());
    let b = controller.spawn_submit(session(), TaskId::new("task_b"), photo());
    assert!(a.await.unwrap().is_ok());
    assert!(b.await.unwrap().is_ok());

    assert!(controller.pending_tasks().is_empty());
    assert_eq!(api.upload_count(), 2);
    // both verdicts report the same server count; it is applied once
    assert_eq!(controller.streak().count, 1);
}

#[tokio::test(start_paused = true)]
async fn slow_upload_times_out_as_network_failure() {
    let api = Arc::new(ScriptedApi::new());
    let (controller, _rx) = with_listed_task(&api, ProofMode::Split, 0).await;
    api.set_latency(Some(Duration::from_secs(60)));
    api.push_upload(Ok(uploaded("/tmp/late.jpg")));

    let task_id = TaskId::new(TASK_ID);
    let err = controller
        .submit_proof(&session(), &task_id, photo())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        WorkflowError::Upload(ApiError::Timeout(Duration::from_secs(5)))
    );
    assert_eq!(api.verify_count(), 0);
    assert_eq!(controller.task(&task_id).unwrap().status, TaskStatus::Pending);
    assert!(!controller.is_in_flight(&task_id));
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_in_flight_submission() {
    let api = Arc::new(ScriptedApi::new().with_latency(Duration::from_secs(2)));
    api.push_profile(Ok(profile(0)));
    api.push_upload(Ok(uploaded("/tmp/abc.jpg")));
    api.push_verification(Ok(VerificationResult::accepted()));
    let (controller, _rx) = setup(&api, ProofMode::Split);
    let controller = Arc::new(controller);
    controller.refresh(&session()).await.unwrap();

    let task_id = TaskId::new(TASK_ID);
    let handle = controller.spawn_submit(session(), task_id.clone(), photo());
    wait_in_flight(&controller, &task_id).await;
    controller.shutdown();

    assert_eq!(handle.await.unwrap(), Err(WorkflowError::Cancelled));
    assert!(!controller.is_in_flight(&task_id));
    assert_eq!(controller.task(&task_id).unwrap().status, TaskStatus::Pending);
    assert_eq!(
        controller.task_state(&task_id),
        Some(WorkflowState::PendingProof)
    );
    assert_eq!(api.verify_count(), 0);
    assert_eq!(controller.streak().count, 0);
}

#[tokio::test(start_paused = true)]
async fn late_verdict_for_dismissed_task_is_dropped() {
    let api = Arc::new(ScriptedApi::new().with_latency(Duration::from_secs(1)));
    api.push_profile(Ok(profile(0)));
    api.push_upload(Ok(uploaded("/tmp/abc.jpg")));
    let mut accepted = VerificationResult::accepted();
    accepted.streak = Some(1);
    api.push_verification(Ok(accepted));
    let (controller, _rx) = setup(&api, ProofMode::Split);
    let controller = Arc::new(controller);
    controller.refresh(&session()).await.unwrap();

    let task_id = TaskId::new(TASK_ID);
    let handle = controller.spawn_submit(session(), task_id.clone(), photo());
    wait_in_flight(&controller, &task_id).await;
    assert!(controller.dismiss(&task_id));

    assert_eq!(handle.await.unwrap(), Ok(SubmitOutcome::Discarded));
    assert!(controller.pending_tasks().is_empty());
    assert_eq!(controller.streak().count, 0);
    assert!(controller.task_state(&task_id).is_none());
}

#[tokio::test(start_paused = true)]
async fn relisted_task_ignores_verdict_of_dismissed_submission() {
    let api = Arc::new(ScriptedApi::new().with_latency(Duration::from_secs(1)));
    api.push_profile(Ok(profile(0)));
    api.push_profile(Ok(profile(0)));
    api.push_upload(Ok(uploaded("/tmp/abc.jpg")));
    let mut accepted = VerificationResult::accepted();
    accepted.streak = Some(1);
    api.push_verification(Ok(accepted));
    let (controller, _rx) = setup(&api, ProofMode::Split);
    let controller = Arc::new(controller);
    controller.refresh(&session()).await.unwrap();

    let task_id = TaskId::new(TASK_ID);
    let handle = controller.spawn_submit(session(), task_id.clone(), photo());
    wait_in_flight(&controller, &task_id).await;
    assert!(controller.dismiss(&task_id));

    // The server still lists the task, so it comes back under the same id.
    assert_eq!(controller.refresh(&session()).await.unwrap(), 1);
    assert_eq!(handle.await.unwrap(), Ok(SubmitOutcome::Discarded));

    assert_eq!(controller.task(&task_id).unwrap().status, TaskStatus::Pending);
    assert_eq!(
        controller.task_state(&task_id),
        Some(WorkflowState::PendingProof)
    );
    assert!(!controller.is_in_flight(&task_id));
    assert_eq!(controller.streak().count, 0);
    assert_eq!(api.verify_count(), 0);

    // The re-listed entry takes a fresh submission normally.
    let outcome = controller
        .submit_proof(&session(), &task_id, photo())
        .await
        .unwrap();
    let SubmitOutcome::Verified { streak_delta, .. } = &outcome else {
        panic!("expected verification, got {outcome:?}");
    };
    assert_eq!(*streak_delta, 1);
    assert!(controller.pending_tasks().is_empty());
}

// ===========================================================================
// Combined proof submission
// ===========================================================================

#[tokio::test]
async fn combined_mode_uses_single_round_trip() {
    let api = Arc::new(ScriptedApi::new());
    let (controller, _rx) = with_listed_task(&api, ProofMode::Combined, 2).await;

    api.push_combined(Ok(SubmitResponse {
        status: Some(SubmitStatus::Approved),
        message: "Great job! Your task was verified and approved".to_string(),
        streak: Some(3),
        badge_awarded: Some("Substance Step I".to_string()),
        photo_url: Some("static/photos/6650f0_task_1a2b3c4d.jpg".to_string()),
        confidence: Some(0.82),
    }));

    let task_id = TaskId::new(TASK_ID);
    let outcome = controller
        .submit_proof(&session(), &task_id, photo())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        SubmitOutcome::Verified {
            streak_delta: 1,
            message: "Great job! Your task was verified and approved +1 day streak!".to_string()
        }
    );
    assert_eq!(api.upload_count(), 0);
    assert_eq!(api.verify_count(), 0);
    assert!(api.calls().contains(&ApiCall::SubmitCombined {
        user_id: session().user_id,
        task_id,
    }));
    assert_eq!(controller.streak().count, 3);
    assert_eq!(controller.streak().badges_earned.len(), 1);
}

#[tokio::test]
async fn combined_mode_rejection_body() {
    let api = Arc::new(ScriptedApi::new());
    let (controller, _rx) = with_listed_task(&api, ProofMode::Combined, 0).await;

    api.push_combined(Err(ApiError::Server {
        status: 400,
        body: Some(ErrorBody {
            status: Some("rejected".to_string()),
            message: Some("Photo verification failed".to_string()),
            ..ErrorBody::default()
        }),
    }));

    let task_id = TaskId::new(TASK_ID);
    let outcome = controller
        .submit_proof(&session(), &task_id, photo())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        SubmitOutcome::Rejected {
            reason: "Photo verification failed".to_string()
        }
    );
    assert_eq!(controller.task(&task_id).unwrap().status, TaskStatus::Rejected);
}
