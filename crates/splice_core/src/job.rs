use serde::{Deserialize, Serialize};

use crate::{AssetRegistry, ColumnMapping, ProcessingMode, Row, ValidationError, WorkerRecommendation};

/// Server-assigned identifier of a batch run.
pub type JobId = String;

/// Snapshot of everything the render service needs for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub overlay_storage_key: String,
    pub processed_overlay_storage_key: String,
    pub mapping: ColumnMapping,
    pub rows: Vec<Row>,
    pub mode: ProcessingMode,
    pub requested_workers: Option<u32>,
}

impl JobRequest {
    /// Copies the registry contents; later registry edits do not reach the request.
    pub fn snapshot(
        registry: &AssetRegistry,
        mode: ProcessingMode,
        advice: Option<&WorkerRecommendation>,
    ) -> Result<Self, ValidationError> {
        registry.ensure_ready()?;
        let overlay = registry.overlay().ok_or(ValidationError::MissingOverlay)?;
        let tabular = registry.tabular().ok_or(ValidationError::MissingTabular)?;
        Ok(Self {
            overlay_storage_key: overlay.storage_key.clone(),
            processed_overlay_storage_key: overlay.processed_storage_key.clone(),
            mapping: registry.mapping().clone(),
            rows: tabular.rows.clone(),
            mode,
            requested_workers: mode.requested_workers(advice),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JobStatus {
    #[default]
    Queued,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    /// Unknown labels fall back to `Queued`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "error" => JobStatus::Error,
            _ => JobStatus::Queued,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::Queued => "Queued",
            JobStatus::Processing => "Processing",
            JobStatus::Completed => "Completed",
            JobStatus::Error => "Error",
        }
    }
}

/// Latest known outcome for one input row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub label: String,
    pub target: String,
    pub status: JobStatus,
    pub output_path: Option<String>,
    pub error_message: Option<String>,
}

/// One decoded event from the progress channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressUpdate {
    pub progress: u8,
    pub message: String,
    pub results: Vec<JobResult>,
    pub complete: bool,
    /// Mode the server says it is running with, when it echoes one.
    pub mode: Option<ProcessingMode>,
    pub sequence: Option<u64>,
}
