use engine_logging::{engine_debug, engine_info};

use crate::{AppState, Effect, FailureKind, JobPhase, Msg, PollStatus, ANALYSIS_FAILED_MESSAGE};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FilesSelected(files) => {
            // The batch is frozen once submission begins.
            if state.phase() != JobPhase::Idle {
                engine_debug!("Ignoring file selection in phase {:?}", state.phase());
                return (state, Vec::new());
            }
            state.add_files(files);
            Vec::new()
        }
        Msg::FileRemoved { index } => {
            if state.phase() == JobPhase::Idle {
                state.remove_file(index);
            }
            Vec::new()
        }
        Msg::SubmitClicked => {
            if state.phase() != JobPhase::Idle || state.batch().is_empty() {
                return (state, Vec::new());
            }
            let ticket = state.begin_submission();
            engine_info!(
                "Submitting ticket={} files={} bytes={}",
                ticket,
                state.batch().len(),
                state.batch().total_bytes()
            );
            vec![Effect::SubmitBatch {
                ticket,
                batch: state.batch().clone(),
            }]
        }
        Msg::SubmissionAccepted { ticket, job_id } => {
            if !state.is_submitting(ticket) {
                engine_debug!("Dropping stale submission ticket={} job_id={}", ticket, job_id);
                return (state, Vec::new());
            }
            state.start_polling(job_id);
            Vec::new()
        }
        Msg::SubmissionFailed { ticket, message } => {
            if state.is_submitting(ticket) {
                state.fail(FailureKind::Submission, message);
            }
            Vec::new()
        }
        Msg::PollCompleted {
            ticket,
            job_id,
            status,
        } => {
            if !state.is_polling(ticket, &job_id) {
                engine_debug!("Dropping stale poll ticket={} job_id={}", ticket, job_id);
                return (state, Vec::new());
            }
            state.record_poll();
            match status {
                PollStatus::Pending => {}
                PollStatus::Failed => state.fail(FailureKind::AnalysisFailed, ANALYSIS_FAILED_MESSAGE),
                PollStatus::Succeeded(result) => state.succeed(result),
            }
            Vec::new()
        }
        Msg::PollTransportFailed {
            ticket,
            job_id,
            message,
        } => {
            if state.is_polling(ticket, &job_id) {
                state.fail(FailureKind::Transport, message);
            }
            Vec::new()
        }
        Msg::PollLimitReached {
            ticket,
            job_id,
            attempts,
        } => {
            if state.is_polling(ticket, &job_id) {
                state.fail(
                    FailureKind::PollLimitExceeded,
                    format!("Analisi non completata dopo {attempts} controlli"),
                );
            }
            Vec::new()
        }
        Msg::LotSelected { lot_id } => {
            let selected = state
                .results_mut()
                .is_some_and(|results| results.select(&lot_id));
            if selected {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SelectionCleared => {
            let had_selection = state.results_mut().is_some_and(|results| {
                let had = results.selection().is_some();
                results.deselect();
                had
            });
            if had_selection {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::LotFilterChanged(filter) => {
            if &filter != state.lot_filter() {
                state.set_lot_filter(filter);
            }
            Vec::new()
        }
        Msg::ResetClicked => {
            let was_active = state.phase().is_active();
            let ticket = state.ticket();
            if state.phase() == JobPhase::Idle {
                return (state, Vec::new());
            }
            state.reset();
            if was_active {
                engine_info!("Discarding in-flight job ticket={}", ticket);
                vec![Effect::CancelJob { ticket }]
            } else {
                Vec::new()
            }
        }
        Msg::Tick => Vec::new(),
    };

    (state, effects)
}
