//! Splice core: pure state machine for readiness gating, job submission and
//! progress reconciliation, plus view-model helpers.
mod assets;
mod effect;
mod job;
mod msg;
mod state;
mod update;
mod view_model;
mod workers;

pub use assets::{
    AssetRegistry, ColumnMapping, MappingField, OverlayAsset, Row, TabularAsset, ValidationError,
};
pub use effect::Effect;
pub use job::{JobId, JobRequest, JobResult, JobStatus, ProgressUpdate};
pub use msg::{Msg, RequestFailure};
pub use state::{AppState, RunOutcome, RunState, SubscriptionState};
pub use update::update;
pub use view_model::{
    project, project_preview, tone_for, AppViewModel, OutputLinks, ResultCard, StatusLine, Tone,
    PREVIEW_ROW_LIMIT,
};
pub use workers::{ProcessingMode, SystemInfo, WorkerRecommendation};
