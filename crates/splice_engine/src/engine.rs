use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use splice_core::{JobId, JobRequest, WorkerRecommendation};
use tokio_util::sync::CancellationToken;

use crate::api::{ApiSettings, BatchApi, ChannelProgressSink, ReqwestBatchApi, StreamEnd};
use crate::{ApiError, EngineEvent, FailureKind};

enum EngineCommand {
    FetchWorkerRecommendation,
    UploadOverlay { file: PathBuf },
    UploadData { file: PathBuf },
    CreateJob { request: Box<JobRequest> },
    Subscribe { job_id: JobId },
    Unsubscribe { job_id: JobId },
}

/// Live progress channels keyed by job id. Each entry is removed when its
/// stream task returns, whether or not anyone unsubscribed.
#[derive(Clone, Default)]
struct Subscriptions {
    inner: Arc<Mutex<SubscriptionTable>>,
}

#[derive(Default)]
struct SubscriptionTable {
    next_generation: u64,
    live: HashMap<JobId, (u64, CancellationToken)>,
}

impl Subscriptions {
    /// Registers a new channel for `job_id`, cancelling any older one.
    fn open(&self, job_id: &str) -> (u64, CancellationToken) {
        let mut table = self.lock();
        table.next_generation += 1;
        let generation = table.next_generation;
        let cancel = CancellationToken::new();
        if let Some((_, previous)) = table.live.insert(job_id.to_string(), (generation, cancel.clone())) {
            previous.cancel();
        }
        (generation, cancel)
    }

    /// Drops the entry for `job_id` if it still belongs to `generation`.
    fn release(&self, job_id: &str, generation: u64) {
        let mut table = self.lock();
        if table.live.get(job_id).is_some_and(|(current, _)| *current == generation) {
            table.live.remove(job_id);
        }
    }

    fn cancel(&self, job_id: &str) -> bool {
        match self.lock().live.remove(job_id) {
            Some((_, cancel)) => {
                cancel.cancel();
                true
            }
            None => false,
        }
    }

    fn cancel_all(&self) {
        for (_, (_, cancel)) in self.lock().live.drain() {
            cancel.cancel();
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lock().live.len()
    }

    fn lock(&self) -> MutexGuard<'_, SubscriptionTable> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Runs batch-service requests on a background tokio runtime and reports
/// results as [`EngineEvent`]s. Holds no application state.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let attempts = settings.worker_recommendation_attempts;
        let retry_delay = settings.retry_delay;
        let api = ReqwestBatchApi::new(settings)?;
        Self::with_api(Arc::new(api), attempts, retry_delay)
    }

    /// Builds a handle around any [`BatchApi`], e.g. a fake in tests.
    pub fn with_api(
        api: Arc<dyn BatchApi>,
        recommendation_attempts: u32,
        retry_delay: Duration,
    ) -> Result<Self, ApiError> {
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|err| ApiError::new(FailureKind::Io, format!("tokio runtime: {err}")))?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let subscriptions = Subscriptions::default();
            while let Ok(command) = cmd_rx.recv() {
                let api = api.clone();
                let event_tx = event_tx.clone();
                match command {
                    EngineCommand::Subscribe { job_id } => {
                        let (generation, cancel) = subscriptions.open(&job_id);
                        let subscriptions = subscriptions.clone();
                        runtime.spawn(async move {
                            run_subscription(api.as_ref(), job_id.clone(), event_tx, cancel).await;
                            subscriptions.release(&job_id, generation);
                        });
                    }
                    EngineCommand::Unsubscribe { job_id } => {
                        if subscriptions.cancel(&job_id) {
                            engine_debug!("Closing progress channel for job {}", job_id);
                        }
                    }
                    command => {
                        runtime.spawn(async move {
                            handle_request(api.as_ref(), command, event_tx, recommendation_attempts, retry_delay)
                                .await;
                        });
                    }
                }
            }
            subscriptions.cancel_all();
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn fetch_worker_recommendation(&self) {
        let _ = self.cmd_tx.send(EngineCommand::FetchWorkerRecommendation);
    }

    pub fn upload_overlay(&self, file: impl Into<PathBuf>) {
        let _ = self.cmd_tx.send(EngineCommand::UploadOverlay { file: file.into() });
    }

    pub fn upload_data(&self, file: impl Into<PathBuf>) {
        let _ = self.cmd_tx.send(EngineCommand::UploadData { file: file.into() });
    }

    pub fn create_job(&self, request: Box<JobRequest>) {
        let _ = self.cmd_tx.send(EngineCommand::CreateJob { request });
    }

    pub fn subscribe(&self, job_id: impl Into<JobId>) {
        let _ = self.cmd_tx.send(EngineCommand::Subscribe { job_id: job_id.into() });
    }

    pub fn unsubscribe(&self, job_id: impl Into<JobId>) {
        let _ = self.cmd_tx.send(EngineCommand::Unsubscribe { job_id: job_id.into() });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn handle_request(
    api: &dyn BatchApi,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
    recommendation_attempts: u32,
    retry_delay: Duration,
) {
    let event = match command {
        EngineCommand::FetchWorkerRecommendation => EngineEvent::WorkerRecommendation(
            fetch_recommendation(api, recommendation_attempts, retry_delay).await,
        ),
        EngineCommand::UploadOverlay { file } => {
            engine_info!("Uploading overlay {:?}", file);
            EngineEvent::OverlayUploaded(api.upload_overlay(&file).await)
        }
        EngineCommand::UploadData { file } => {
            engine_info!("Uploading data file {:?}", file);
            EngineEvent::DataUploaded(api.upload_data(&file).await)
        }
        EngineCommand::CreateJob { request } => {
            engine_info!(
                "Creating job rows={} mode={:?}",
                request.rows.len(),
                request.mode
            );
            EngineEvent::JobCreated(api.create_job(&request).await)
        }
        EngineCommand::Subscribe { .. } | EngineCommand::Unsubscribe { .. } => return,
    };
    let _ = event_tx.send(event);
}

/// Fetches worker advice, retrying up to `attempts` times in total.
/// Server-reported failures are not retried.
pub async fn fetch_recommendation(
    api: &dyn BatchApi,
    attempts: u32,
    retry_delay: Duration,
) -> Result<WorkerRecommendation, ApiError> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match api.worker_recommendation().await {
            Ok(advice) => return Ok(advice),
            Err(err) if attempt < attempts && !err.is_server_reported() => {
                engine_warn!(
                    "Worker recommendation attempt {}/{} failed: {}",
                    attempt,
                    attempts,
                    err
                );
                attempt += 1;
                tokio::time::sleep(retry_delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn run_subscription(
    api: &dyn BatchApi,
    job_id: JobId,
    event_tx: mpsc::Sender<EngineEvent>,
    cancel: CancellationToken,
) {
    engine_info!("Subscribing to progress for job {}", job_id);
    let sink = ChannelProgressSink::new(event_tx.clone());
    match api.stream_progress(&job_id, &sink, &cancel).await {
        Ok(StreamEnd::Completed) => engine_info!("Job {} reported completion", job_id),
        Ok(StreamEnd::Cancelled) => engine_debug!("Progress channel for job {} cancelled", job_id),
        Err(error) => {
            engine_warn!("Progress channel for job {} failed: {}", job_id, error);
            let _ = event_tx.send(EngineEvent::ChannelFailed { job_id, error });
        }
    }
}
