use bytes::Bytes;
use perizia_core::{
    update, AnalysisResult, AppState, Effect, FailureKind, FileDescriptor, JobPhase, JobStatus,
    Msg, PollStatus, Ticket, ANALYSIS_FAILED_MESSAGE,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn init_logging() {
    engine_logging::initialize_for_tests();
}

/// Drives a fresh state to `Polling` for job `job-1`.
fn polling_state() -> (AppState, Ticket) {
    let (state, _) = update(
        AppState::new(),
        Msg::FilesSelected(vec![FileDescriptor::pdf(
            "perizia.pdf",
            Bytes::from_static(b"%PDF-1.4"),
        )]),
    );
    let (state, _) = update(state, Msg::SubmitClicked);
    let ticket = state.ticket();
    let (state, _) = update(
        state,
        Msg::SubmissionAccepted {
            ticket,
            job_id: "job-1".to_string(),
        },
    );
    assert_eq!(state.phase(), JobPhase::Polling);
    (state, ticket)
}

fn poll(state: AppState, ticket: Ticket, status: PollStatus) -> AppState {
    let (state, effects) = update(
        state,
        Msg::PollCompleted {
            ticket,
            job_id: "job-1".to_string(),
            status,
        },
    );
    assert!(effects.is_empty());
    state
}

#[test]
fn pending_pending_failed_ends_failed_after_three_polls() {
    init_logging();
    let (state, ticket) = polling_state();

    let state = poll(state, ticket, PollStatus::Pending);
    assert_eq!(state.phase(), JobPhase::Polling);
    let state = poll(state, ticket, PollStatus::Pending);
    assert_eq!(state.phase(), JobPhase::Polling);
    let state = poll(state, ticket, PollStatus::Failed);

    assert_eq!(state.phase(), JobPhase::Failed);
    let view = state.view();
    assert_eq!(view.error.as_deref(), Some(ANALYSIS_FAILED_MESSAGE));
    assert_eq!(view.failure_kind, Some(FailureKind::AnalysisFailed));
    assert_eq!(view.poll_attempts, 3);
    assert_eq!(state.job().map(|job| job.status), Some(JobStatus::Failed));
}

#[test]
fn pending_then_success_stores_result() {
    init_logging();
    let (state, ticket) = polling_state();
    let payload: AnalysisResult = serde_json::from_value(json!({
        "lotto_1": { "tipologia_immobile": { "value": "Villa" } },
        "total_tokens": 1200,
    }))
    .unwrap();

    let state = poll(state, ticket, PollStatus::Pending);
    let state = poll(state, ticket, PollStatus::Succeeded(payload.clone()));

    assert_eq!(state.phase(), JobPhase::Succeeded);
    assert_eq!(state.results().map(|r| r.result()), Some(&payload));
    let view = state.view();
    assert!(view.error.is_none());
    assert_eq!(view.poll_attempts, 2);
    assert_eq!(view.lots.len(), 1);
    assert_eq!(view.lots[0].summary.type_label, "Villa");
    assert_eq!(view.metering.and_then(|m| m.total_tokens), Some(1200));
}

#[test]
fn terminal_state_ignores_further_polls() {
    init_logging();
    let (state, ticket) = polling_state();
    let state = poll(state, ticket, PollStatus::Failed);
    let before = state.view();

    let state = poll(state, ticket, PollStatus::Succeeded(AnalysisResult::default()));

    assert_eq!(state.phase(), JobPhase::Failed);
    assert_eq!(state.view().poll_attempts, before.poll_attempts);
}

#[test]
fn stale_poll_after_reset_leaves_idle_state_untouched() {
    init_logging();
    let (state, ticket) = polling_state();
    let state = poll(state, ticket, PollStatus::Pending);

    let (mut state, effects) = update(state, Msg::ResetClicked);
    assert_eq!(effects, vec![Effect::CancelJob { ticket }]);
    assert_eq!(state.phase(), JobPhase::Idle);
    state.consume_dirty();
    let idle = state.clone();

    let mut state = poll(state, ticket, PollStatus::Succeeded(AnalysisResult::default()));
    assert_eq!(state, idle);
    assert!(!state.consume_dirty());

    let (state, _) = update(
        state,
        Msg::PollTransportFailed {
            ticket,
            job_id: "job-1".to_string(),
            message: "timeout".to_string(),
        },
    );
    assert_eq!(state.phase(), JobPhase::Idle);
    assert!(state.failure().is_none());
}

#[test]
fn poll_for_other_job_is_dropped() {
    init_logging();
    let (state, ticket) = polling_state();

    let (state, _) = update(
        state,
        Msg::PollCompleted {
            ticket,
            job_id: "someone-else".to_string(),
            status: PollStatus::Failed,
        },
    );
    assert_eq!(state.phase(), JobPhase::Polling);

    let (state, _) = update(
        state,
        Msg::PollCompleted {
            ticket: ticket + 7,
            job_id: "job-1".to_string(),
            status: PollStatus::Failed,
        },
    );
    assert_eq!(state.phase(), JobPhase::Polling);
    assert_eq!(state.view().poll_attempts, 0);
}

#[test]
fn transport_failure_is_reported_as_its_own_kind() {
    init_logging();
    let (state, ticket) = polling_state();

    let (state, _) = update(
        state,
        Msg::PollTransportFailed {
            ticket,
            job_id: "job-1".to_string(),
            message: "network error: connection reset".to_string(),
        },
    );

    assert_eq!(state.phase(), JobPhase::Failed);
    let failure = state.failure().expect("failure recorded");
    assert_eq!(failure.kind, FailureKind::Transport);
    assert_eq!(failure.message, "network error: connection reset");
}

#[test]
fn poll_limit_fails_the_job() {
    init_logging();
    let (state, ticket) = polling_state();

    let (state, _) = update(
        state,
        Msg::PollLimitReached {
            ticket,
            job_id: "job-1".to_string(),
            attempts: 12,
        },
    );

    assert_eq!(state.phase(), JobPhase::Failed);
    let view = state.view();
    assert_eq!(view.failure_kind, Some(FailureKind::PollLimitExceeded));
    assert!(view.error.unwrap().contains("12"));
}
