use crate::batch::{FileDescriptor, UploadBatch};
use crate::format::CurrencyFormat;
use crate::navigator::{LotFilter, ResultModel};
use crate::result::AnalysisResult;

/// Identifies one submission attempt; engine messages carrying an older
/// ticket belong to a discarded job.
pub type Ticket = u64;

/// User-facing message for a job the backend reports as failed.
pub const ANALYSIS_FAILED_MESSAGE: &str = "Analisi fallita";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobPhase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Succeeded,
    Failed,
}

impl JobPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobPhase::Succeeded | JobPhase::Failed)
    }

    /// A request is in flight or scheduled.
    pub fn is_active(self) -> bool {
        matches!(self, JobPhase::Submitting | JobPhase::Polling)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Succeeded,
    Failed,
}

/// A job accepted by the submission endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    pub poll_attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The batch was rejected or could not be sent.
    Submission,
    /// The backend reported the analysis as failed.
    AnalysisFailed,
    /// A status request itself failed.
    Transport,
    /// The configured poll attempt limit ran out while still pending.
    PollLimitExceeded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of one status query.
#[derive(Debug, Clone, PartialEq)]
pub enum PollStatus {
    Pending,
    Failed,
    Succeeded(AnalysisResult),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    batch: UploadBatch,
    last_rejected: usize,
    phase: JobPhase,
    ticket: Ticket,
    job: Option<Job>,
    failure: Option<JobFailure>,
    results: Option<ResultModel>,
    lot_filter: LotFilter,
    currency: CurrencyFormat,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lot_filter(mut self, filter: LotFilter) -> Self {
        self.lot_filter = filter;
        self
    }

    pub fn with_currency(mut self, currency: CurrencyFormat) -> Self {
        self.currency = currency;
        self
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn batch(&self) -> &UploadBatch {
        &self.batch
    }

    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    pub fn failure(&self) -> Option<&JobFailure> {
        self.failure.as_ref()
    }

    pub fn results(&self) -> Option<&ResultModel> {
        self.results.as_ref()
    }

    pub fn lot_filter(&self) -> &LotFilter {
        &self.lot_filter
    }

    pub fn currency(&self) -> &CurrencyFormat {
        &self.currency
    }

    pub(crate) fn last_rejected(&self) -> usize {
        self.last_rejected
    }

    /// Returns whether the state changed since the last call, clearing the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn add_files(&mut self, files: Vec<FileDescriptor>) {
        self.last_rejected = self.batch.add(files);
        self.mark_dirty();
    }

    pub(crate) fn remove_file(&mut self, index: usize) -> bool {
        let removed = self.batch.remove(index).is_some();
        if removed {
            self.mark_dirty();
        }
        removed
    }

    pub(crate) fn begin_submission(&mut self) -> Ticket {
        self.ticket += 1;
        self.phase = JobPhase::Submitting;
        self.failure = None;
        self.mark_dirty();
        self.ticket
    }

    /// True while `ticket` belongs to the submission in flight.
    pub(crate) fn is_submitting(&self, ticket: Ticket) -> bool {
        self.phase == JobPhase::Submitting && self.ticket == ticket
    }

    /// True while `ticket`/`job_id` identify the job being polled.
    pub(crate) fn is_polling(&self, ticket: Ticket, job_id: &str) -> bool {
        self.phase == JobPhase::Polling
            && self.ticket == ticket
            && self.job.as_ref().is_some_and(|job| job.id == job_id)
    }

    pub(crate) fn start_polling(&mut self, job_id: String) {
        self.job = Some(Job {
            id: job_id,
            status: JobStatus::Pending,
            poll_attempts: 0,
        });
        self.phase = JobPhase::Polling;
        self.mark_dirty();
    }

    pub(crate) fn record_poll(&mut self) {
        if let Some(job) = self.job.as_mut() {
            job.poll_attempts += 1;
        }
        self.mark_dirty();
    }

    pub(crate) fn succeed(&mut self, result: AnalysisResult) {
        if let Some(job) = self.job.as_mut() {
            job.status = JobStatus::Succeeded;
        }
        self.results = Some(ResultModel::new(result, self.lot_filter.clone()));
        self.phase = JobPhase::Succeeded;
        self.mark_dirty();
    }

    pub(crate) fn fail(&mut self, kind: FailureKind, message: impl Into<String>) {
        if let Some(job) = self.job.as_mut() {
            job.status = JobStatus::Failed;
        }
        self.failure = Some(JobFailure {
            kind,
            message: message.into(),
        });
        self.phase = JobPhase::Failed;
        self.mark_dirty();
    }

    pub(crate) fn results_mut(&mut self) -> Option<&mut ResultModel> {
        self.results.as_mut()
    }

    pub(crate) fn set_lot_filter(&mut self, filter: LotFilter) {
        if let Some(results) = self.results.as_mut() {
            results.set_filter(filter.clone());
        }
        self.lot_filter = filter;
        self.mark_dirty();
    }

    /// Discards the job, its outcome and any selection. The batch is kept so
    /// it can be resubmitted.
    pub(crate) fn reset(&mut self) {
        self.phase = JobPhase::Idle;
        self.job = None;
        self.failure = None;
        self.results = None;
        self.mark_dirty();
    }
}
