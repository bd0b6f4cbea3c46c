use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use engine_logging::{engine_info, engine_warn};
use perizia_core::{update, AppState, AppViewModel, Effect, Msg};
use perizia_engine::{export_result, EngineHandle, ReqwestAnalysisClient};

use crate::config::AppConfig;
use crate::render;

/// How long to wait for an engine event before ticking the core.
const TICK: Duration = Duration::from_millis(250);

/// Executes core effects against the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = ReqwestAnalysisClient::new(config.client_settings())
            .context("building analysis client")?;
        let engine = EngineHandle::new(Arc::new(client), config.poll_settings());
        Ok(Self { engine })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitBatch { ticket, batch } => {
                    engine_info!(
                        "SubmitBatch ticket={} files={} bytes={}",
                        ticket,
                        batch.len(),
                        batch.total_bytes()
                    );
                    self.engine.submit(ticket, batch);
                }
                Effect::CancelJob { ticket } => {
                    engine_info!("CancelJob ticket={}", ticket);
                    self.engine.cancel(ticket);
                }
            }
        }
    }

    /// Next engine event as a message, or a tick when none arrived in time.
    pub fn next_msg(&self) -> Result<Msg> {
        let event = self
            .engine
            .recv_timeout(TICK)
            .context("waiting for the analysis job")?;
        Ok(event.map(Msg::from).unwrap_or(Msg::Tick))
    }

    pub fn shutdown(&self) {
        self.engine.shutdown();
    }
}

/// Owns the core state and prints a status line whenever it changes.
pub struct Session {
    state: AppState,
    runner: EffectRunner,
}

impl Session {
    pub fn new(state: AppState, runner: EffectRunner) -> Self {
        Self { state, runner }
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        self.runner.enqueue(effects);
        let view = state.view();
        if view.dirty {
            state.consume_dirty();
            println!("{}", render::status_line(&view));
        }
        self.state = state;
    }

    /// Drives the job until it succeeds or fails.
    ///
    /// Fails if the engine stops before the job reaches either outcome.
    pub fn wait_for_outcome(&mut self) -> Result<()> {
        while !self.state.phase().is_terminal() {
            let msg = self.runner.next_msg()?;
            self.dispatch(msg);
        }
        Ok(())
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    pub fn select_lot(&mut self, lot_id: &str) {
        self.dispatch(Msg::LotSelected {
            lot_id: lot_id.to_string(),
        });
        let selected = self
            .state
            .results()
            .and_then(|results| results.selection())
            .is_some_and(|selection| selection.lot_id == lot_id);
        if !selected {
            engine_warn!("Lot {} not found in the result", lot_id);
            eprintln!("warning: lot `{lot_id}` not found");
        }
    }

    /// Writes the succeeded result into `dir`.
    pub fn export(&self, dir: &Path) -> Result<PathBuf> {
        let job_id = self
            .state
            .job()
            .map(|job| job.id.as_str())
            .ok_or_else(|| anyhow!("no job to export"))?;
        let results = self
            .state
            .results()
            .ok_or_else(|| anyhow!("job {job_id} has no result to export"))?;
        let exported_utc = Utc::now().to_rfc3339();
        let path = export_result(dir, job_id, &exported_utc, results.result())
            .with_context(|| format!("exporting job {job_id} to {}", dir.display()))?;
        engine_info!("Exported job {} to {:?}", job_id, path);
        Ok(path)
    }
}
