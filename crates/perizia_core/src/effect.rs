#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send the batch to the submission endpoint and poll the resulting job.
    SubmitBatch {
        ticket: crate::Ticket,
        batch: crate::UploadBatch,
    },
    /// Stop the submission or poll loop started for `ticket`.
    CancelJob { ticket: crate::Ticket },
}
