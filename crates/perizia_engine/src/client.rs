use std::time::Duration;

use engine_logging::engine_debug;
use perizia_core::{AnalysisResult, PollStatus, UploadBatch};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::ClientError;

/// Multipart field name carrying each PDF.
pub const UPLOAD_FIELD: &str = "pdfs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub base_url: String,
    pub submit_path: String,
    pub status_path: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            submit_path: "/process_pdfs".to_string(),
            status_path: "/job_status".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// The two endpoints of the analysis service.
#[async_trait::async_trait]
pub trait AnalysisClient: Send + Sync {
    /// Uploads the batch and returns the job id assigned by the server.
    async fn submit(&self, batch: &UploadBatch) -> Result<String, ClientError>;

    /// Queries the status of `job_id` once.
    async fn status(&self, job_id: &str) -> Result<PollStatus, ClientError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestAnalysisClient {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl ReqwestAnalysisClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ClientError::Network(err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn submit_url(&self) -> Result<Url, ClientError> {
        endpoint(&self.settings.base_url, &self.settings.submit_path)
    }

    fn status_url(&self, job_id: &str) -> Result<Url, ClientError> {
        let mut url = endpoint(&self.settings.base_url, &self.settings.status_path)?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.settings.base_url.clone()))?
            .pop_if_empty()
            .push(job_id);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl AnalysisClient for ReqwestAnalysisClient {
    async fn submit(&self, batch: &UploadBatch) -> Result<String, ClientError> {
        let url = self.submit_url()?;

        let mut form = Form::new();
        for file in batch.files() {
            let part = Part::bytes(file.content.to_vec())
                .file_name(file.name.clone())
                .mime_str(&file.mime_type)
                .map_err(|err| ClientError::InvalidPart {
                    name: file.name.clone(),
                    message: err.to_string(),
                })?;
            form = form.part(UPLOAD_FIELD, part);
        }

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::HttpStatus(status.as_u16()));
        }

        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|err| ClientError::Decode(err.to_string()))?;
        body.job_id()
    }

    async fn status(&self, job_id: &str) -> Result<PollStatus, ClientError> {
        let url = self.status_url(job_id)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::HttpStatus(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| ClientError::Decode(err.to_string()))?;
        parse_status(body)
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    job_id: Option<Value>,
}

impl SubmitResponse {
    fn job_id(self) -> Result<String, ClientError> {
        match self.job_id {
            Some(Value::String(id)) if !id.is_empty() => Ok(id),
            Some(Value::Number(id)) => Ok(id.to_string()),
            _ => Err(ClientError::MissingJobId),
        }
    }
}

/// Interprets a status body: `pending` and `failed` are reserved markers,
/// any other status (or none) means the remaining keys are the result.
pub fn parse_status(body: Value) -> Result<PollStatus, ClientError> {
    let Value::Object(mut fields) = body else {
        return Err(ClientError::Decode("status body is not a JSON object".into()));
    };
    let marker = fields.shift_remove("status");
    engine_debug!("Status marker {:?} with {} payload keys", marker, fields.len());
    match marker.as_ref().and_then(Value::as_str) {
        Some("pending") => Ok(PollStatus::Pending),
        Some("failed") => Ok(PollStatus::Failed),
        _ => Ok(PollStatus::Succeeded(AnalysisResult::from(fields))),
    }
}

fn endpoint(base_url: &str, path: &str) -> Result<Url, ClientError> {
    let joined = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|err| ClientError::InvalidUrl(format!("{joined}: {err}")))
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::Timeout(err.to_string());
    }
    ClientError::Network(err.to_string())
}
