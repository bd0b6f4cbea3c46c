//! Perizia engine: HTTP client, poll loop and effect execution.
mod client;
mod engine;
mod export;
mod poller;
mod types;

pub use client::{
    parse_status, AnalysisClient, ClientSettings, ReqwestAnalysisClient, UPLOAD_FIELD,
};
pub use engine::EngineHandle;
pub use export::{ensure_output_dir, export_filename, export_result, ExportError};
pub use poller::{run_job, ChannelEventSink, EventSink, PollSettings};
pub use types::{ClientError, EngineEvent, EngineStopped};
