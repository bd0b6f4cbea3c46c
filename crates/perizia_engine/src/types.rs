use perizia_core::{Msg, PollStatus, Ticket};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("submission response carried no job_id")]
    MissingJobId,
    #[error("invalid upload part {name}: {message}")]
    InvalidPart { name: String, message: String },
}

/// The engine thread has exited and no further events will arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("analysis engine stopped")]
pub struct EngineStopped;

/// Progress of one submission/poll run, tagged with the ticket it was started for.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Submitted {
        ticket: Ticket,
        job_id: String,
    },
    SubmissionFailed {
        ticket: Ticket,
        error: ClientError,
    },
    Polled {
        ticket: Ticket,
        job_id: String,
        attempt: u32,
        status: PollStatus,
    },
    PollFailed {
        ticket: Ticket,
        job_id: String,
        attempt: u32,
        error: ClientError,
    },
    PollLimitReached {
        ticket: Ticket,
        job_id: String,
        attempts: u32,
    },
}

impl EngineEvent {
    pub fn ticket(&self) -> Ticket {
        match self {
            EngineEvent::Submitted { ticket, .. }
            | EngineEvent::SubmissionFailed { ticket, .. }
            | EngineEvent::Polled { ticket, .. }
            | EngineEvent::PollFailed { ticket, .. }
            | EngineEvent::PollLimitReached { ticket, .. } => *ticket,
        }
    }

    /// True for the last event a run emits.
    pub fn is_final(&self) -> bool {
        !matches!(
            self,
            EngineEvent::Submitted { .. }
                | EngineEvent::Polled {
                    status: PollStatus::Pending,
                    ..
                }
        )
    }
}

impl From<EngineEvent> for Msg {
    fn from(event: EngineEvent) -> Self {
        match event {
            EngineEvent::Submitted { ticket, job_id } => Msg::SubmissionAccepted { ticket, job_id },
            EngineEvent::SubmissionFailed { ticket, error } => Msg::SubmissionFailed {
                ticket,
                message: error.to_string(),
            },
            EngineEvent::Polled {
                ticket,
                job_id,
                status,
                ..
            } => Msg::PollCompleted {
                ticket,
                job_id,
                status,
            },
            EngineEvent::PollFailed {
                ticket,
                job_id,
                error,
                ..
            } => Msg::PollTransportFailed {
                ticket,
                job_id,
                message: error.to_string(),
            },
            EngineEvent::PollLimitReached {
                ticket,
                job_id,
                attempts,
            } => Msg::PollLimitReached {
                ticket,
                job_id,
                attempts,
            },
        }
    }
}
