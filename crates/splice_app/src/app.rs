use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use splice_core::{update, AppState, Msg, ProcessingMode, RunOutcome, SubscriptionState};
use splice_engine::ApiError;

use crate::config::ClientConfig;
use crate::effects::EffectRunner;
use crate::render::Renderer;

const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// How an unattended run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    Completed,
    ChannelLost,
    /// Uploads settled without both assets and a full mapping.
    NotReady,
    SubmitFailed,
}

/// Drives one upload, map and submit cycle from config, then waits for the run to close.
pub fn run(config: &ClientConfig) -> Result<Finish, ApiError> {
    let runner = EffectRunner::new(config.api_settings())?;
    let mut renderer = Renderer::new(&config.base_url);
    let mut autopilot = Autopilot::new(config.mode, config.pinned_columns());
    let mut state = AppState::new();
    let mut inbox: VecDeque<Msg> = autopilot
        .start(
            config.overlay_path.as_deref(),
            config.data_path.as_deref(),
        )
        .into();

    loop {
        let msg = match inbox.pop_front() {
            Some(msg) => msg,
            None => runner.next_msg(TICK_INTERVAL).unwrap_or(Msg::Tick),
        };
        if !matches!(msg, Msg::Tick) {
            engine_debug!("Dispatch {:?}", msg);
        }

        let (next, effects) = update(state, msg.clone());
        state = next;
        runner.enqueue(effects);
        if state.consume_dirty() {
            renderer.draw(&state.view());
        }

        match autopilot.after(&msg, &state) {
            Step::Continue(follow_up) => inbox.extend(follow_up),
            Step::Finished(finish) => {
                engine_info!("Run finished: {:?}", finish);
                return Ok(finish);
            }
        }
    }
}

#[derive(Debug, PartialEq)]
pub(crate) enum Step {
    Continue(Vec<Msg>),
    Finished(Finish),
}

/// Plays the user's part: requests uploads, pins the mapping and submits once
/// everything it waits on has settled.
pub(crate) struct Autopilot {
    mode: ProcessingMode,
    pinned_columns: Option<(String, String)>,
    pending_uploads: usize,
    advice_settled: bool,
    submitted: bool,
}

impl Autopilot {
    pub(crate) fn new(mode: ProcessingMode, pinned_columns: Option<(String, String)>) -> Self {
        Self {
            mode,
            pinned_columns,
            pending_uploads: 0,
            advice_settled: false,
            submitted: false,
        }
    }

    pub(crate) fn start(&mut self, overlay: Option<&Path>, data: Option<&Path>) -> Vec<Msg> {
        let overlay = overlay.map(|path| path.to_string_lossy().into_owned());
        let data = data.map(|path| path.to_string_lossy().into_owned());
        self.pending_uploads = [&overlay, &data]
            .iter()
            .filter(|file| file.as_deref().is_some_and(|f| !f.trim().is_empty()))
            .count();
        vec![
            Msg::Startup,
            Msg::OverlayUploadRequested { file: overlay },
            Msg::DataUploadRequested { file: data },
        ]
    }

    pub(crate) fn after(&mut self, msg: &Msg, state: &AppState) -> Step {
        match msg {
            Msg::OverlayUploaded(_) | Msg::OverlayUploadFailed(_) | Msg::DataUploadFailed(_) => {
                self.pending_uploads = self.pending_uploads.saturating_sub(1);
            }
            Msg::DataUploaded(_) => {
                self.pending_uploads = self.pending_uploads.saturating_sub(1);
                if let Some((target_field, label_field)) = self.pinned_columns.clone() {
                    return Step::Continue(vec![Msg::MappingChanged {
                        target_field,
                        label_field,
                    }]);
                }
            }
            Msg::WorkerRecommendationLoaded(_) | Msg::WorkerRecommendationFailed { .. } => {
                self.advice_settled = true;
            }
            Msg::JobCreateFailed(_) if !state.run().processing => {
                return Step::Finished(Finish::SubmitFailed);
            }
            _ => {}
        }

        if let SubscriptionState::Closed { outcome, .. } = state.subscription() {
            return Step::Finished(match outcome {
                RunOutcome::Completed => Finish::Completed,
                RunOutcome::ChannelLost => Finish::ChannelLost,
            });
        }

        if self.submitted || self.pending_uploads > 0 || !self.advice_settled {
            return Step::Continue(Vec::new());
        }
        if !state.view().can_submit {
            return Step::Finished(Finish::NotReady);
        }
        self.submitted = true;
        Step::Continue(vec![Msg::SubmitClicked { mode: self.mode }])
    }
}
