use crate::{JobId, JobRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchWorkerRecommendation,
    UploadOverlay { file: String },
    UploadData { file: String },
    CreateJob { request: Box<JobRequest> },
    SubscribeProgress { job_id: JobId },
    CloseProgress { job_id: JobId },
}
