//! JSON shapes exchanged with the batch service and their conversion into
//! core types. Field names follow the service's camelCase contract.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use splice_core::{
    JobId, JobRequest, JobResult, JobStatus, OverlayAsset, ProcessingMode, ProgressUpdate, Row,
    SystemInfo, TabularAsset, WorkerRecommendation,
};

use crate::{ApiError, FailureKind};

fn server_error(error: Option<String>, fallback: &str) -> ApiError {
    let message = error
        .filter(|msg| !msg.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());
    ApiError::new(FailureKind::ServerReported, message)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OverlayUploadResponse {
    success: bool,
    file: Option<String>,
    processed_path: Option<String>,
    savings: Option<String>,
    error: Option<String>,
}

impl OverlayUploadResponse {
    pub(crate) fn into_asset(self) -> Result<OverlayAsset, ApiError> {
        if !self.success {
            return Err(server_error(self.error, "overlay upload failed"));
        }
        let storage_key = self
            .file
            .filter(|file| !file.is_empty())
            .ok_or_else(|| ApiError::decode("upload response is missing `file`"))?;
        // Older servers skip pre-processing and omit the processed path.
        let processed_storage_key = self
            .processed_path
            .filter(|path| !path.is_empty())
            .unwrap_or_else(|| storage_key.clone());
        Ok(OverlayAsset {
            storage_key,
            processed_storage_key,
            savings: self.savings,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DataUploadResponse {
    success: bool,
    #[serde(default)]
    headers: Vec<String>,
    #[serde(default)]
    data: Vec<BTreeMap<String, serde_json::Value>>,
    error: Option<String>,
}

impl DataUploadResponse {
    pub(crate) fn into_asset(self) -> Result<TabularAsset, ApiError> {
        if !self.success {
            return Err(server_error(self.error, "data upload failed"));
        }
        let rows = self
            .data
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(key, value)| (key, cell_text(value)))
                    .collect::<Row>()
            })
            .collect();
        Ok(TabularAsset {
            headers: self.headers,
            rows,
        })
    }
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WorkerCountsResponse {
    success: bool,
    worker_counts: Option<WireWorkerCounts>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireWorkerCounts {
    recommended: u32,
    system_info: WireSystemInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSystemInfo {
    cpu_cores: u32,
    #[serde(rename = "memoryGB")]
    memory_gb: f64,
}

impl WorkerCountsResponse {
    pub(crate) fn into_recommendation(self) -> Result<WorkerRecommendation, ApiError> {
        if !self.success {
            return Err(server_error(self.error, "worker recommendation unavailable"));
        }
        let counts = self
            .worker_counts
            .ok_or_else(|| ApiError::decode("response is missing `workerCounts`"))?;
        let system_info = SystemInfo {
            cpu_cores: counts.system_info.cpu_cores,
            memory_gb: counts.system_info.memory_gb,
        };
        WorkerRecommendation::new(counts.recommended, system_info)
            .ok_or_else(|| ApiError::decode("recommended worker count must be at least 1"))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateVideosRequest<'a> {
    overlay_video: &'a str,
    processed_overlay_video: &'a str,
    mappings: WireMappings<'a>,
    rows: &'a [Row],
    use_parallel_processing: bool,
    use_extra_worker: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    worker_count: Option<u32>,
}

#[derive(Debug, Serialize)]
struct WireMappings<'a> {
    website: Option<&'a str>,
    name: Option<&'a str>,
}

impl<'a> From<&'a JobRequest> for CreateVideosRequest<'a> {
    fn from(request: &'a JobRequest) -> Self {
        Self {
            overlay_video: &request.overlay_storage_key,
            processed_overlay_video: &request.processed_overlay_storage_key,
            mappings: WireMappings {
                website: request.mapping.target_field.as_deref(),
                name: request.mapping.label_field.as_deref(),
            },
            rows: &request.rows,
            use_parallel_processing: request.mode.is_parallel(),
            use_extra_worker: request.mode.uses_extra_worker(),
            worker_count: request.requested_workers,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateVideosResponse {
    success: bool,
    job_id: Option<String>,
    error: Option<String>,
}

impl CreateVideosResponse {
    pub(crate) fn into_job_id(self) -> Result<JobId, ApiError> {
        if !self.success {
            return Err(server_error(self.error, "job creation failed"));
        }
        self.job_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::decode("response is missing `jobId`"))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressPayload {
    #[serde(default)]
    progress: f64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    results: Vec<WireResult>,
    #[serde(default)]
    complete: bool,
    use_parallel_processing: Option<bool>,
    use_extra_worker: Option<bool>,
    seq: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResult {
    #[serde(default)]
    name: String,
    #[serde(default)]
    website: String,
    #[serde(default)]
    status: String,
    video_path: Option<String>,
    error: Option<String>,
}

impl From<WireResult> for JobResult {
    fn from(wire: WireResult) -> Self {
        Self {
            label: wire.name,
            target: wire.website,
            status: JobStatus::from_label(&wire.status),
            output_path: wire.video_path,
            error_message: wire.error,
        }
    }
}

/// Decodes one `data:` payload from the progress channel.
pub fn decode_progress(data: &str) -> Result<ProgressUpdate, ApiError> {
    let payload: ProgressPayload = serde_json::from_str(data)
        .map_err(|err| ApiError::decode(format!("bad progress event: {err}")))?;
    let mode = payload.use_parallel_processing.map(|parallel| {
        if parallel {
            ProcessingMode::Parallel {
                use_extra_worker: payload.use_extra_worker.unwrap_or(false),
            }
        } else {
            ProcessingMode::Sequential
        }
    });
    Ok(ProgressUpdate {
        progress: clamp_percent(payload.progress),
        message: payload.message,
        results: payload.results.into_iter().map(JobResult::from).collect(),
        complete: payload.complete,
        mode,
        sequence: payload.seq,
    })
}

fn clamp_percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}
