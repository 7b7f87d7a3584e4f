use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use splice_core::{Effect, Msg};
use splice_engine::{ApiError, ApiSettings, EngineEvent, EngineHandle};

/// Executes core effects on the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        engine_info!("Connecting to batch service at {}", settings.base_url);
        let engine = EngineHandle::new(settings)?;
        Ok(Self { engine })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchWorkerRecommendation => self.engine.fetch_worker_recommendation(),
                Effect::UploadOverlay { file } => self.engine.upload_overlay(file),
                Effect::UploadData { file } => self.engine.upload_data(file),
                Effect::CreateJob { request } => {
                    engine_info!(
                        "CreateJob rows={} workers={:?}",
                        request.rows.len(),
                        request.requested_workers
                    );
                    self.engine.create_job(request);
                }
                Effect::SubscribeProgress { job_id } => self.engine.subscribe(job_id),
                Effect::CloseProgress { job_id } => {
                    engine_debug!("CloseProgress job_id={}", job_id);
                    self.engine.unsubscribe(job_id);
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).map(to_msg)
    }
}

pub(crate) fn to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::WorkerRecommendation(Ok(advice)) => Msg::WorkerRecommendationLoaded(advice),
        EngineEvent::WorkerRecommendation(Err(err)) => {
            engine_warn!("Worker recommendation unavailable: {}", err);
            Msg::WorkerRecommendationFailed {
                message: err.to_string(),
            }
        }
        EngineEvent::OverlayUploaded(Ok(asset)) => Msg::OverlayUploaded(asset),
        EngineEvent::OverlayUploaded(Err(err)) => {
            engine_warn!("Overlay upload failed: {}", err);
            Msg::OverlayUploadFailed(err.into())
        }
        EngineEvent::DataUploaded(Ok(asset)) => Msg::DataUploaded(asset),
        EngineEvent::DataUploaded(Err(err)) => {
            engine_warn!("Data upload failed: {}", err);
            Msg::DataUploadFailed(err.into())
        }
        EngineEvent::JobCreated(Ok(job_id)) => Msg::JobCreated { job_id },
        EngineEvent::JobCreated(Err(err)) => {
            engine_warn!("Job creation failed: {}", err);
            Msg::JobCreateFailed(err.into())
        }
        EngineEvent::Progress { job_id, update } => Msg::ProgressReceived { job_id, update },
        EngineEvent::ChannelFailed { job_id, error } => Msg::ChannelFailed {
            job_id,
            reason: error.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use splice_core::RequestFailure;
    use splice_engine::FailureKind;

    use super::*;

    #[test]
    fn server_reported_failure_keeps_message() {
        let msg = to_msg(EngineEvent::JobCreated(Err(ApiError {
            kind: FailureKind::ServerReported,
            message: "Missing required data".to_string(),
        })));
        assert_eq!(
            msg,
            Msg::JobCreateFailed(RequestFailure::ServerReported("Missing required data".to_string()))
        );
    }

    #[test]
    fn transport_failure_is_not_server_reported() {
        let msg = to_msg(EngineEvent::OverlayUploaded(Err(ApiError {
            kind: FailureKind::Timeout,
            message: "operation timed out".to_string(),
        })));
        assert!(matches!(msg, Msg::OverlayUploadFailed(RequestFailure::Transport(_))));
    }

    #[test]
    fn channel_failure_carries_job_id() {
        let msg = to_msg(EngineEvent::ChannelFailed {
            job_id: "job-7".to_string(),
            error: ApiError {
                kind: FailureKind::ChannelClosed,
                message: "progress stream ended before completion".to_string(),
            },
        });
        match msg {
            Msg::ChannelFailed { job_id, reason } => {
                assert_eq!(job_id, "job-7");
                assert!(reason.contains("progress channel closed"));
            }
            other => panic!("unexpected msg: {other:?}"),
        }
    }
}
