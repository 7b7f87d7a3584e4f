use crate::view_model::{project, project_preview, AppViewModel, StatusLine};
use crate::{AssetRegistry, JobId, JobResult, ProcessingMode, ProgressUpdate, WorkerRecommendation};

/// Lifecycle of the progress channel for the current run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubscriptionState {
    #[default]
    Idle,
    Subscribed {
        job_id: JobId,
    },
    Closed {
        job_id: JobId,
        outcome: RunOutcome,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    ChannelLost,
}

/// The single active run. `processing` is the only guard against a second run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunState {
    pub processing: bool,
    pub job_id: Option<JobId>,
    pub results: Vec<JobResult>,
    pub mode: ProcessingMode,
    pub(crate) last_sequence: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct StatusBoard {
    pub overlay: Option<StatusLine>,
    pub data: Option<StatusLine>,
    pub mapping: Option<StatusLine>,
    pub processing: Option<StatusLine>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub(crate) registry: AssetRegistry,
    pub(crate) advice: Option<WorkerRecommendation>,
    pub(crate) run: RunState,
    pub(crate) subscription: SubscriptionState,
    pub(crate) progress: u8,
    pub(crate) status: StatusBoard,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    pub fn run(&self) -> &RunState {
        &self.run
    }

    pub fn subscription(&self) -> &SubscriptionState {
        &self.subscription
    }

    pub fn worker_recommendation(&self) -> Option<&WorkerRecommendation> {
        self.advice.as_ref()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            ready: self.registry.is_ready(),
            processing: self.run.processing,
            can_submit: self.registry.is_ready() && !self.run.processing,
            job_id: self.run.job_id.clone(),
            progress: self.progress,
            overlay_status: self.status.overlay.clone(),
            data_status: self.status.data.clone(),
            mapping_status: self.status.mapping.clone(),
            processing_status: self.status.processing.clone(),
            overlay_preview: self
                .registry
                .overlay()
                .map(|overlay| format!("/uploads/{}", overlay.storage_key)),
            headers: self
                .registry
                .tabular()
                .map(|tabular| tabular.headers.clone())
                .unwrap_or_default(),
            preview_rows: self.registry.tabular().map(project_preview).unwrap_or_default(),
            mapping: self.registry.mapping().clone(),
            worker_recommendation: self.advice,
            results: project(&self.run.results),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn begin_run(&mut self, mode: ProcessingMode) {
        self.run = RunState {
            processing: true,
            mode,
            ..RunState::default()
        };
        self.subscription = SubscriptionState::Idle;
        self.progress = 0;
        self.mark_dirty();
    }

    pub(crate) fn abort_run(&mut self) {
        self.run.processing = false;
        self.mark_dirty();
    }

    pub(crate) fn attach(&mut self, job_id: JobId) {
        self.run.job_id = Some(job_id.clone());
        self.subscription = SubscriptionState::Subscribed { job_id };
        self.mark_dirty();
    }

    pub(crate) fn is_subscribed_to(&self, job_id: &str) -> bool {
        matches!(&self.subscription, SubscriptionState::Subscribed { job_id: current } if current == job_id)
    }

    /// Applies one channel event. Returns false when the event was stale and dropped.
    pub(crate) fn apply_progress(&mut self, update: &ProgressUpdate) -> bool {
        if let (Some(seq), Some(last)) = (update.sequence, self.run.last_sequence) {
            if seq <= last {
                return false;
            }
        }
        if update.sequence.is_some() {
            self.run.last_sequence = update.sequence;
        }
        self.progress = update.progress.min(100);
        if !update.results.is_empty() {
            self.run.results = update.results.clone();
        }
        self.mark_dirty();
        true
    }

    pub(crate) fn close(&mut self, outcome: RunOutcome) {
        let job_id = match std::mem::take(&mut self.subscription) {
            SubscriptionState::Subscribed { job_id } | SubscriptionState::Closed { job_id, .. } => job_id,
            SubscriptionState::Idle => self.run.job_id.clone().unwrap_or_default(),
        };
        self.subscription = SubscriptionState::Closed { job_id, outcome };
        self.run.processing = false;
        self.mark_dirty();
    }
}
