use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_error};
use perizia_core::{Ticket, UploadBatch};
use tokio_util::sync::CancellationToken;

use crate::poller::{run_job, ChannelEventSink, PollSettings};
use crate::{AnalysisClient, EngineEvent, EngineStopped};

enum EngineCommand {
    Submit { ticket: Ticket, batch: UploadBatch },
    Cancel { ticket: Ticket },
    Shutdown,
}

type RunningJobs = Arc<Mutex<HashMap<Ticket, CancellationToken>>>;

/// Runs submission/poll jobs on a background tokio runtime.
///
/// Dropping the handle, or calling [`EngineHandle::shutdown`], stops the runtime
/// and every job still running on it. Once the engine thread is gone and its
/// queued events are drained, [`EngineHandle::recv_timeout`] reports
/// [`EngineStopped`].
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(client: Arc<dyn AnalysisClient>, settings: PollSettings) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    engine_error!("Failed to start engine runtime: {}", err);
                    return;
                }
            };
            let running: RunningJobs = Arc::default();
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Submit { ticket, batch } => {
                        let cancel = CancellationToken::new();
                        lock(&running).insert(ticket, cancel.clone());

                        let client = client.clone();
                        let settings = settings.clone();
                        let sink = ChannelEventSink::new(event_tx.clone());
                        let running = running.clone();
                        runtime.spawn(async move {
                            run_job(client.as_ref(), ticket, &batch, &settings, &cancel, &sink)
                                .await;
                            lock(&running).remove(&ticket);
                        });
                    }
                    EngineCommand::Cancel { ticket } => {
                        if let Some(cancel) = lock(&running).remove(&ticket) {
                            engine_debug!("Cancelling job run ticket={}", ticket);
                            cancel.cancel();
                        }
                    }
                    EngineCommand::Shutdown => {
                        engine_debug!("Engine shutdown requested");
                        break;
                    }
                }
            }
            for (_, cancel) in lock(&running).drain() {
                cancel.cancel();
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn submit(&self, ticket: Ticket, batch: UploadBatch) {
        let _ = self.cmd_tx.send(EngineCommand::Submit { ticket, batch });
    }

    pub fn cancel(&self, ticket: Ticket) {
        let _ = self.cmd_tx.send(EngineCommand::Cancel { ticket });
    }

    /// Stops the engine thread; running jobs are cancelled.
    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Waits up to `timeout` for the next event. `Ok(None)` means nothing arrived yet.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineStopped> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EngineStopped),
        }
    }
}

fn lock(running: &RunningJobs) -> std::sync::MutexGuard<'_, HashMap<Ticket, CancellationToken>> {
    running.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
