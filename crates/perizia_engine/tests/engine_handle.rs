use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use perizia_core::{update, AppState, Effect, FileDescriptor, JobPhase, Msg};
use perizia_engine::{
    ClientSettings, EngineEvent, EngineHandle, EngineStopped, PollSettings, ReqwestAnalysisClient,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine_for(server: &MockServer) -> EngineHandle {
    engine_logging::initialize_for_tests();
    let client = ReqwestAnalysisClient::new(ClientSettings {
        base_url: server.uri(),
        ..ClientSettings::default()
    })
    .expect("client");
    EngineHandle::new(
        Arc::new(client),
        PollSettings {
            interval: Duration::from_millis(50),
            ..PollSettings::default()
        },
    )
}

async fn next_event(engine: &EngineHandle) -> Option<EngineEvent> {
    for _ in 0..200 {
        if let Some(event) = engine.try_recv() {
            return Some(event);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    None
}

fn dispatch(state: AppState, msg: Msg, engine: &EngineHandle) -> AppState {
    let (state, effects) = update(state, msg);
    for effect in effects {
        match effect {
            Effect::SubmitBatch { ticket, batch } => engine.submit(ticket, batch),
            Effect::CancelJob { ticket } => engine.cancel(ticket),
        }
    }
    state
}

async fn mount_submit(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/process_pdfs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "job_id": "j-1" })))
        .mount(server)
        .await;
}

fn submitted_state(engine: &EngineHandle) -> AppState {
    let state = dispatch(
        AppState::new(),
        Msg::FilesSelected(vec![FileDescriptor::pdf(
            "perizia.pdf",
            Bytes::from_static(b"%PDF-1.4 perizia"),
        )]),
        engine,
    );
    dispatch(state, Msg::SubmitClicked, engine)
}

#[tokio::test]
async fn job_runs_to_completion_through_the_core() {
    let server = MockServer::start().await;
    mount_submit(&server).await;
    Mock::given(method("GET"))
        .and(path("/job_status/j-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "pending" })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/job_status/j-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "done",
            "lotto_1": { "valore_immobiliare": { "value": 90000 } },
            "lotto_2": { "valore_immobiliare": { "value": 45000 } }
        })))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    let mut state = submitted_state(&engine);
    assert_eq!(state.phase(), JobPhase::Submitting);

    while !state.phase().is_terminal() {
        let event = next_event(&engine).await.expect("engine event");
        state = dispatch(state, Msg::from(event), &engine);
    }

    assert_eq!(state.phase(), JobPhase::Succeeded);
    let view = state.view();
    assert_eq!(view.job_id.as_deref(), Some("j-1"));
    assert_eq!(view.poll_attempts, 2);
    let ids: Vec<_> = view.lots.iter().map(|card| card.lot_id.as_str()).collect();
    assert_eq!(ids, ["lotto_1", "lotto_2"]);
}

#[tokio::test]
async fn reset_cancels_the_running_job() {
    let server = MockServer::start().await;
    mount_submit(&server).await;
    Mock::given(method("GET"))
        .and(path("/job_status/j-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "pending" })))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    let mut state = submitted_state(&engine);

    while state.phase() != JobPhase::Polling {
        let event = next_event(&engine).await.expect("submission event");
        state = dispatch(state, Msg::from(event), &engine);
    }

    let state = dispatch(state, Msg::ResetClicked, &engine);
    assert_eq!(state.phase(), JobPhase::Idle);

    // Events already queued before the cancel landed are stale and ignored.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let mut state = state;
    while let Some(event) = engine.try_recv() {
        state = dispatch(state, Msg::from(event), &engine);
    }
    assert_eq!(state.phase(), JobPhase::Idle);

    let polls_after_cancel = server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or_default();
    tokio::time::sleep(Duration::from_millis(300)).await;
    let polls_later = server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or_default();
    assert_eq!(polls_after_cancel, polls_later);
}

#[tokio::test]
async fn shutdown_disconnects_the_event_stream() {
    let server = MockServer::start().await;
    let engine = engine_for(&server);

    assert_eq!(engine.recv_timeout(Duration::from_millis(10)), Ok(None));

    engine.shutdown();
    let mut outcome = Ok(None);
    for _ in 0..100 {
        outcome = engine.recv_timeout(Duration::from_millis(20));
        if outcome.is_err() {
            break;
        }
    }
    assert_eq!(outcome, Err(EngineStopped));
}
