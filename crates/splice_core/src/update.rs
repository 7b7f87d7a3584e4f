use crate::state::RunOutcome;
use crate::view_model::{StatusLine, Tone};
use crate::{AppState, Effect, JobRequest, Msg, OverlayAsset, RequestFailure};

const COMPLETED_MESSAGE: &str = "All videos have been created successfully!";
const CHANNEL_LOST_MESSAGE: &str = "Error receiving progress updates.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Startup => vec![Effect::FetchWorkerRecommendation],
        Msg::OverlayUploadRequested { file } => match non_blank(file) {
            Some(file) => {
                state.status.overlay = Some(StatusLine::new("Uploading video...", Tone::Info));
                state.mark_dirty();
                vec![Effect::UploadOverlay { file }]
            }
            None => {
                state.status.overlay = Some(StatusLine::new("Please select a video file", Tone::Danger));
                state.mark_dirty();
                Vec::new()
            }
        },
        Msg::OverlayUploaded(asset) => {
            state.status.overlay = Some(StatusLine::new(overlay_success_text(&asset), Tone::Success));
            state.registry.set_overlay(asset);
            state.mark_dirty();
            Vec::new()
        }
        Msg::OverlayUploadFailed(failure) => {
            // Prior overlay, if any, stays registered.
            state.status.overlay = Some(failure_line(&failure, "Error uploading video. Please try again."));
            state.mark_dirty();
            Vec::new()
        }
        Msg::DataUploadRequested { file } => match non_blank(file) {
            Some(file) => {
                state.status.data = Some(StatusLine::new("Uploading CSV...", Tone::Info));
                state.mark_dirty();
                vec![Effect::UploadData { file }]
            }
            None => {
                state.status.data = Some(StatusLine::new("Please select a CSV file", Tone::Danger));
                state.mark_dirty();
                Vec::new()
            }
        },
        Msg::DataUploaded(asset) => {
            state.registry.set_tabular(asset);
            state.status.data = Some(StatusLine::new("CSV uploaded successfully!", Tone::Success));
            state.status.mapping = mapping_hint(&state);
            state.mark_dirty();
            Vec::new()
        }
        Msg::DataUploadFailed(failure) => {
            state.status.data = Some(failure_line(&failure, "Error uploading CSV. Please try again."));
            state.mark_dirty();
            Vec::new()
        }
        Msg::MappingChanged {
            target_field,
            label_field,
        } => {
            state.status.mapping = match state.registry.set_mapping(&target_field, &label_field) {
                Ok(()) => None,
                Err(err) => Some(StatusLine::new(format!("Error: {err}"), Tone::Danger)),
            };
            state.mark_dirty();
            Vec::new()
        }
        Msg::MappingCleared => {
            state.registry.clear_mapping();
            state.status.mapping = mapping_hint(&state);
            state.mark_dirty();
            Vec::new()
        }
        Msg::WorkerRecommendationLoaded(advice) => {
            state.advice = Some(advice);
            state.mark_dirty();
            Vec::new()
        }
        // Worker advice is optional; submission falls back to whatever the server decides.
        Msg::WorkerRecommendationFailed { .. } => Vec::new(),
        Msg::SubmitClicked { mode } => {
            if state.run.processing {
                return (state, Vec::new());
            }
            match JobRequest::snapshot(&state.registry, mode, state.advice.as_ref()) {
                Ok(request) => {
                    state.begin_run(mode);
                    let text = format!(
                        "Starting video creation process...{}",
                        mode.worker_info(state.advice.as_ref())
                    );
                    state.status.processing = Some(StatusLine::new(text, Tone::Info));
                    vec![Effect::CreateJob {
                        request: Box::new(request),
                    }]
                }
                Err(err) => {
                    state.status.processing = Some(StatusLine::new(format!("Error: {err}"), Tone::Danger));
                    state.mark_dirty();
                    Vec::new()
                }
            }
        }
        Msg::JobCreated { job_id } => {
            if !state.run.processing || state.run.job_id.is_some() {
                return (state, Vec::new());
            }
            state.attach(job_id.clone());
            vec![Effect::SubscribeProgress { job_id }]
        }
        Msg::JobCreateFailed(failure) => {
            if !state.run.processing || state.run.job_id.is_some() {
                return (state, Vec::new());
            }
            state.abort_run();
            state.status.processing = Some(failure_line(
                &failure,
                "Error starting video creation. Please try again.",
            ));
            Vec::new()
        }
        Msg::ProgressReceived { job_id, update } => {
            if !state.is_subscribed_to(&job_id) || !state.apply_progress(&update) {
                return (state, Vec::new());
            }
            let mode = update.mode.unwrap_or(state.run.mode);
            let text = format!("{}{}", update.message, mode.progress_info(state.advice.as_ref()));
            state.status.processing = Some(StatusLine::new(text, Tone::Info));

            if update.complete {
                state.close(RunOutcome::Completed);
                state.status.processing = Some(StatusLine::new(COMPLETED_MESSAGE, Tone::Success));
                vec![Effect::CloseProgress { job_id }]
            } else {
                Vec::new()
            }
        }
        Msg::ChannelFailed { job_id, .. } => {
            if !state.is_subscribed_to(&job_id) {
                return (state, Vec::new());
            }
            // Results received so far stay visible.
            state.close(RunOutcome::ChannelLost);
            state.status.processing = Some(StatusLine::new(CHANNEL_LOST_MESSAGE, Tone::Warning));
            vec![Effect::CloseProgress { job_id }]
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn non_blank(file: Option<String>) -> Option<String> {
    file.map(|f| f.trim().to_string()).filter(|f| !f.is_empty())
}

fn overlay_success_text(asset: &OverlayAsset) -> String {
    match asset.savings.as_deref() {
        Some(savings) if !savings.is_empty() => format!(
            "Video uploaded and pre-processed successfully! ({savings} size reduction)"
        ),
        _ => "Video uploaded and pre-processed successfully!".to_string(),
    }
}

fn failure_line(failure: &RequestFailure, transport_text: &str) -> StatusLine {
    match failure {
        RequestFailure::ServerReported(message) => StatusLine::new(format!("Error: {message}"), Tone::Danger),
        RequestFailure::Transport(_) => StatusLine::new(transport_text, Tone::Danger),
    }
}

fn mapping_hint(state: &AppState) -> Option<StatusLine> {
    if state.registry.is_ready() || state.registry.tabular().is_none() {
        return None;
    }
    let mapping = state.registry.mapping();
    if mapping.target_field.is_some() && mapping.label_field.is_some() {
        return None;
    }
    Some(StatusLine::new(
        "Select the website and name columns to continue.",
        Tone::Warning,
    ))
}
