//! Perizia core: pure job state machine, analysis result model and view-model helpers.
mod batch;
mod effect;
mod format;
mod msg;
mod navigator;
mod result;
mod state;
mod update;
mod view_model;

pub use batch::{FileDescriptor, UploadBatch, PDF_MIME};
pub use effect::Effect;
pub use format::{
    label_for, parse_leading_number, summary_of, CurrencyFormat, LotSummary, MISSING_DETAILS,
    TYPE_FIELD, VALUE_FIELD,
};
pub use msg::Msg;
pub use navigator::{derive_lots, fields_of, LotFilter, ResultModel, Selection};
pub use result::{
    AnalysisResult, FieldEntry, FieldValue, LotData, LotEntry, Metering, PageRef, ResultEntry,
    Source, METERING_KEYS,
};
pub use state::{
    AppState, FailureKind, Job, JobFailure, JobPhase, JobStatus, PollStatus, Ticket,
    ANALYSIS_FAILED_MESSAGE,
};
pub use update::update;
pub use view_model::{
    AppViewModel, FieldView, FileRowView, LotCardView, LotDetailView, SourceView,
};
