use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use perizia_core::{PollStatus, Ticket, UploadBatch};
use tokio_util::sync::CancellationToken;

use crate::{AnalysisClient, EngineEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    /// Fixed delay between a status answer and the next query.
    pub interval: Duration,
    /// Give up after this many status queries; `None` polls until a terminal status.
    pub max_attempts: Option<u32>,
    /// Consecutive failed status requests tolerated before the job fails.
    pub transport_retries: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: None,
            transport_retries: 0,
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Submits `batch`, then polls the assigned job until it reaches a terminal
/// status, the attempt limit runs out, or `cancel` fires.
///
/// Polls never overlap: the delay starts only after the previous answer has
/// been emitted. Once `cancel` fires nothing more is emitted.
pub async fn run_job(
    client: &dyn AnalysisClient,
    ticket: Ticket,
    batch: &UploadBatch,
    settings: &PollSettings,
    cancel: &CancellationToken,
    sink: &dyn EventSink,
) {
    let submitted = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            engine_info!("Submission cancelled ticket={}", ticket);
            return;
        }
        submitted = client.submit(batch) => submitted,
    };

    let job_id = match submitted {
        Ok(job_id) => job_id,
        Err(error) => {
            engine_warn!("Submission failed ticket={}: {}", ticket, error);
            sink.emit(EngineEvent::SubmissionFailed { ticket, error });
            return;
        }
    };
    engine_info!("Job accepted ticket={} job_id={}", ticket, job_id);
    sink.emit(EngineEvent::Submitted {
        ticket,
        job_id: job_id.clone(),
    });

    let mut attempt = 0u32;
    let mut consecutive_failures = 0u32;
    loop {
        attempt += 1;
        let polled = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                engine_info!("Polling cancelled job_id={} attempt={}", job_id, attempt);
                return;
            }
            polled = client.status(&job_id) => polled,
        };

        match polled {
            Ok(PollStatus::Pending) => {
                engine_debug!("Job {} pending after attempt {}", job_id, attempt);
                consecutive_failures = 0;
                sink.emit(EngineEvent::Polled {
                    ticket,
                    job_id: job_id.clone(),
                    attempt,
                    status: PollStatus::Pending,
                });
            }
            Ok(status) => {
                engine_info!(
                    "Job {} finished after {} attempts: {}",
                    job_id,
                    attempt,
                    if status == PollStatus::Failed { "failed" } else { "succeeded" }
                );
                sink.emit(EngineEvent::Polled {
                    ticket,
                    job_id,
                    attempt,
                    status,
                });
                return;
            }
            Err(error) => {
                consecutive_failures += 1;
                if consecutive_failures > settings.transport_retries {
                    engine_warn!("Status request failed job_id={}: {}", job_id, error);
                    sink.emit(EngineEvent::PollFailed {
                        ticket,
                        job_id,
                        attempt,
                        error,
                    });
                    return;
                }
                engine_warn!(
                    "Status request failed job_id={} ({}/{} retries): {}",
                    job_id,
                    consecutive_failures,
                    settings.transport_retries,
                    error
                );
            }
        }

        if settings.max_attempts.is_some_and(|max| attempt >= max) {
            engine_warn!("Job {} still pending after {} attempts", job_id, attempt);
            sink.emit(EngineEvent::PollLimitReached {
                ticket,
                job_id,
                attempts: attempt,
            });
            return;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                engine_info!("Polling cancelled job_id={} attempt={}", job_id, attempt);
                return;
            }
            _ = tokio::time::sleep(settings.interval) => {}
        }
    }
}
