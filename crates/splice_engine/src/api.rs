use std::path::Path;
use std::time::Duration;

use engine_logging::engine_debug;
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use splice_core::{JobId, JobRequest, OverlayAsset, TabularAsset, WorkerRecommendation};
use tokio_util::sync::CancellationToken;

use crate::sse::SseDecoder;
use crate::types::map_reqwest_error;
use crate::wire::{
    decode_progress, CreateVideosRequest, CreateVideosResponse, DataUploadResponse,
    OverlayUploadResponse, WorkerCountsResponse,
};
use crate::{ApiError, EngineEvent, FailureKind};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applies to every request except the progress stream.
    pub request_timeout: Duration,
    pub worker_recommendation_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(300),
            worker_recommendation_attempts: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// How a progress stream ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    Completed,
    Cancelled,
}

/// Boundary to the batch rendering service.
#[async_trait::async_trait]
pub trait BatchApi: Send + Sync {
    async fn upload_overlay(&self, file: &Path) -> Result<OverlayAsset, ApiError>;

    async fn upload_data(&self, file: &Path) -> Result<TabularAsset, ApiError>;

    async fn worker_recommendation(&self) -> Result<WorkerRecommendation, ApiError>;

    async fn create_job(&self, request: &JobRequest) -> Result<JobId, ApiError>;

    /// Streams progress events for `job_id` into `sink` until a `complete`
    /// event, cancellation, or failure. Never reconnects.
    async fn stream_progress(
        &self,
        job_id: &str,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<StreamEnd, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBatchApi {
    settings: ApiSettings,
    client: reqwest::Client,
    /// No overall timeout: the progress stream lives as long as the job.
    stream_client: reqwest::Client,
}

impl ReqwestBatchApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        reqwest::Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        let stream_client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            client,
            stream_client,
        })
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    async fn upload(&self, path: &str, field: &'static str, file: &Path) -> Result<reqwest::Response, ApiError> {
        let bytes = tokio::fs::read(file)
            .await
            .map_err(|err| ApiError::new(FailureKind::Io, format!("{}: {err}", file.display())))?;
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| field.to_string());
        let form = Form::new().part(field, Part::bytes(bytes).file_name(file_name));

        self.client
            .post(self.endpoint(path))
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)
    }
}

#[async_trait::async_trait]
impl BatchApi for ReqwestBatchApi {
    async fn upload_overlay(&self, file: &Path) -> Result<OverlayAsset, ApiError> {
        let response = self.upload("upload-overlay-video", "overlayVideo", file).await?;
        parse_json::<OverlayUploadResponse>(response).await?.into_asset()
    }

    async fn upload_data(&self, file: &Path) -> Result<TabularAsset, ApiError> {
        let response = self.upload("upload-csv", "csvFile", file).await?;
        parse_json::<DataUploadResponse>(response).await?.into_asset()
    }

    async fn worker_recommendation(&self) -> Result<WorkerRecommendation, ApiError> {
        let response = self
            .client
            .get(self.endpoint("worker-counts"))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        parse_json::<WorkerCountsResponse>(response)
            .await?
            .into_recommendation()
    }

    async fn create_job(&self, request: &JobRequest) -> Result<JobId, ApiError> {
        let body = CreateVideosRequest::from(request);
        let response = self
            .client
            .post(self.endpoint("create-videos"))
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        parse_json::<CreateVideosResponse>(response).await?.into_job_id()
    }

    async fn stream_progress(
        &self,
        job_id: &str,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<StreamEnd, ApiError> {
        let request = self
            .stream_client
            .get(self.endpoint(&format!("progress/{job_id}")))
            .header(ACCEPT, "text/event-stream")
            .send();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(StreamEnd::Cancelled),
            response = request => response.map_err(map_reqwest_error)?,
        };
        let response = ensure_success(response).await?;

        let mut decoder = SseDecoder::new();
        let mut stream = response.bytes_stream();
        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(StreamEnd::Cancelled),
                chunk = stream.next() => chunk,
            };
            let chunk = match chunk {
                Some(chunk) => chunk.map_err(map_reqwest_error)?,
                None => {
                    return Err(ApiError::new(
                        FailureKind::ChannelClosed,
                        "progress stream ended before completion",
                    ))
                }
            };
            for event in decoder.feed(&chunk)? {
                if !event.is_message() {
                    engine_debug!(
                        "Skipping '{}' event for job {}",
                        event.event.as_deref().unwrap_or_default(),
                        job_id
                    );
                    continue;
                }
                let update = decode_progress(&event.data)?;
                let complete = update.complete;
                sink.emit(EngineEvent::Progress {
                    job_id: job_id.to_string(),
                    update,
                });
                if complete {
                    return Ok(StreamEnd::Completed);
                }
            }
        }
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(ApiError::new(FailureKind::HttpStatus(status.as_u16()), body));
    }
    Ok(response)
}

/// Decodes a JSON body. The service reports failures as `{success: false, error}`
/// regardless of status, so the status only matters when the body is not JSON.
async fn parse_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await.map_err(map_reqwest_error)?;
    serde_json::from_str(&body).map_err(|err| {
        if status.is_success() {
            ApiError::decode(err.to_string())
        } else {
            ApiError::new(FailureKind::HttpStatus(status.as_u16()), body.clone())
        }
    })
}
