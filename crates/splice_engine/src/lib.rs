//! Splice engine: batch-service client and effect execution.
mod api;
mod engine;
mod sse;
mod types;
mod wire;

pub use api::{ApiSettings, BatchApi, ChannelProgressSink, ProgressSink, ReqwestBatchApi, StreamEnd};
pub use engine::{fetch_recommendation, EngineHandle};
pub use sse::{SseDecoder, SseEvent};
pub use types::{ApiError, EngineEvent, FailureKind};
pub use wire::decode_progress;
