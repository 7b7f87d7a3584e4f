use crate::{JobId, OverlayAsset, ProcessingMode, ProgressUpdate, TabularAsset, WorkerRecommendation};

/// Why a request to the batch service did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestFailure {
    /// Well-formed response with `success: false`.
    ServerReported(String),
    /// Network, HTTP status, timeout or undecodable body.
    Transport(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Application finished loading; fetch worker advice.
    Startup,
    /// User asked to upload the overlay video. `None` when no file was chosen.
    OverlayUploadRequested { file: Option<String> },
    OverlayUploaded(OverlayAsset),
    OverlayUploadFailed(RequestFailure),
    /// User asked to upload the data file. `None` when no file was chosen.
    DataUploadRequested { file: Option<String> },
    DataUploaded(TabularAsset),
    DataUploadFailed(RequestFailure),
    /// User picked both columns.
    MappingChanged {
        target_field: String,
        label_field: String,
    },
    /// User reset the column selection.
    MappingCleared,
    WorkerRecommendationLoaded(WorkerRecommendation),
    WorkerRecommendationFailed { message: String },
    /// User clicked "Create videos".
    SubmitClicked { mode: ProcessingMode },
    JobCreated { job_id: JobId },
    JobCreateFailed(RequestFailure),
    /// One event from the progress channel.
    ProgressReceived { job_id: JobId, update: ProgressUpdate },
    /// The progress channel dropped or delivered garbage before completion.
    ChannelFailed { job_id: JobId, reason: String },
    /// Render tick.
    Tick,
    NoOp,
}
