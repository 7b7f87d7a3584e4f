use std::fmt;

use splice_core::{JobId, OverlayAsset, ProgressUpdate, RequestFailure, TabularAsset, WorkerRecommendation};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    WorkerRecommendation(Result<WorkerRecommendation, ApiError>),
    OverlayUploaded(Result<OverlayAsset, ApiError>),
    DataUploaded(Result<TabularAsset, ApiError>),
    JobCreated(Result<JobId, ApiError>),
    Progress { job_id: JobId, update: ProgressUpdate },
    /// The progress channel ended without a `complete` event.
    ChannelFailed { job_id: JobId, error: ApiError },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Decode, message)
    }

    pub fn is_server_reported(&self) -> bool {
        self.kind == FailureKind::ServerReported
    }
}

impl From<ApiError> for RequestFailure {
    fn from(err: ApiError) -> Self {
        if err.is_server_reported() {
            RequestFailure::ServerReported(err.message)
        } else {
            RequestFailure::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    /// Body could not be decoded into the expected shape.
    Decode,
    /// Well-formed response with `success: false`.
    ServerReported,
    /// Progress stream ended before a `complete` event.
    ChannelClosed,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::ServerReported => write!(f, "server error"),
            FailureKind::ChannelClosed => write!(f, "progress channel closed"),
            FailureKind::Io => write!(f, "io error"),
        }
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::decode(err.to_string());
    }
    if let Some(status) = err.status() {
        return ApiError::new(FailureKind::HttpStatus(status.as_u16()), err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
