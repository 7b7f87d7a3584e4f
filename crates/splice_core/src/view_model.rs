use crate::{ColumnMapping, JobId, JobResult, JobStatus, TabularAsset, WorkerRecommendation};

/// Number of data rows shown in the upload preview.
pub const PREVIEW_ROW_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub tone: Tone,
}

impl StatusLine {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLinks {
    pub download: String,
    pub view: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultCard {
    pub label: String,
    pub target: String,
    pub status: JobStatus,
    pub status_label: &'static str,
    pub tone: Tone,
    pub error_message: Option<String>,
    pub links: Option<OutputLinks>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub ready: bool,
    pub processing: bool,
    pub can_submit: bool,
    pub job_id: Option<JobId>,
    pub progress: u8,
    pub overlay_status: Option<StatusLine>,
    pub data_status: Option<StatusLine>,
    pub mapping_status: Option<StatusLine>,
    pub processing_status: Option<StatusLine>,
    pub overlay_preview: Option<String>,
    pub headers: Vec<String>,
    pub preview_rows: Vec<Vec<String>>,
    pub mapping: ColumnMapping,
    pub worker_recommendation: Option<WorkerRecommendation>,
    pub results: Vec<ResultCard>,
    pub dirty: bool,
}

pub fn tone_for(status: JobStatus) -> Tone {
    match status {
        JobStatus::Completed => Tone::Success,
        JobStatus::Processing => Tone::Info,
        JobStatus::Error => Tone::Danger,
        JobStatus::Queued => Tone::Warning,
    }
}

/// Maps results to display cards. Pure; identical input gives identical output.
pub fn project(results: &[JobResult]) -> Vec<ResultCard> {
    results.iter().map(card_for).collect()
}

fn card_for(result: &JobResult) -> ResultCard {
    ResultCard {
        label: result.label.clone(),
        target: result.target.clone(),
        status: result.status,
        status_label: result.status.label(),
        tone: tone_for(result.status),
        error_message: result.error_message.clone().filter(|msg| !msg.is_empty()),
        links: result
            .output_path
            .as_deref()
            .filter(|path| !path.is_empty())
            .map(|path| {
                let href = format!("/output/{path}");
                OutputLinks {
                    download: href.clone(),
                    view: href,
                }
            }),
    }
}

/// First rows of the data file laid out in header order; missing cells are empty.
pub fn project_preview(tabular: &TabularAsset) -> Vec<Vec<String>> {
    tabular
        .rows
        .iter()
        .take(PREVIEW_ROW_LIMIT)
        .map(|row| {
            tabular
                .headers
                .iter()
                .map(|header| row.get(header).cloned().unwrap_or_default())
                .collect()
        })
        .collect()
}
