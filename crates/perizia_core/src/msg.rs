use crate::{FileDescriptor, LotFilter, PollStatus, Ticket};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User picked files; non-PDFs are filtered out.
    FilesSelected(Vec<FileDescriptor>),
    /// User removed the file at `index` from the batch.
    FileRemoved { index: usize },
    /// User asked to analyze the current batch.
    SubmitClicked,
    /// Submission endpoint accepted the batch.
    SubmissionAccepted { ticket: Ticket, job_id: String },
    /// Submission failed before a job id was assigned.
    SubmissionFailed { ticket: Ticket, message: String },
    /// One status query answered.
    PollCompleted {
        ticket: Ticket,
        job_id: String,
        status: PollStatus,
    },
    /// A status request failed at the transport level.
    PollTransportFailed {
        ticket: Ticket,
        job_id: String,
        message: String,
    },
    /// The poll loop ran out of attempts while the job was still pending.
    PollLimitReached {
        ticket: Ticket,
        job_id: String,
        attempts: u32,
    },
    /// User opened a lot.
    LotSelected { lot_id: String },
    /// User went back to the lot list.
    SelectionCleared,
    /// Lot policy switched at runtime.
    LotFilterChanged(LotFilter),
    /// User discarded the current job to start over.
    ResetClicked,
    /// UI/render tick to coalesce rendering.
    Tick,
}
