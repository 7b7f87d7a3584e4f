use splice_core::{
    update, AppState, Effect, JobResult, JobStatus, Msg, OverlayAsset, ProcessingMode,
    ProgressUpdate, Row, TabularAsset, Tone,
};

fn row(site: &str, contact: &str) -> Row {
    Row::from([
        ("Company Website".to_string(), site.to_string()),
        ("Contact Name".to_string(), contact.to_string()),
        ("Notes".to_string(), String::new()),
    ])
}

fn results(status: JobStatus) -> Vec<JobResult> {
    ["Ada", "Brian", "Chen"]
        .iter()
        .map(|name| JobResult {
            label: name.to_string(),
            target: format!("https://{}.example.com", name.to_lowercase()),
            status,
            output_path: (status == JobStatus::Completed).then(|| format!("{name}.mp4")),
            error_message: None,
        })
        .collect()
}

#[test]
fn upload_map_submit_and_stream_to_completion() {
    engine_logging::initialize_for_tests();

    let (state, effects) = update(
        AppState::new(),
        Msg::OverlayUploadRequested {
            file: Some("intro.mp4".to_string()),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::UploadOverlay {
            file: "intro.mp4".to_string()
        }]
    );

    let (state, _) = update(
        state,
        Msg::OverlayUploaded(OverlayAsset {
            storage_key: "intro-1700000000.mp4".to_string(),
            processed_storage_key: "processed-intro-1700000000.mp4".to_string(),
            savings: Some("40%".to_string()),
        }),
    );
    let overlay_status = state.view().overlay_status.unwrap();
    assert_eq!(
        overlay_status.text,
        "Video uploaded and pre-processed successfully! (40% size reduction)"
    );
    assert_eq!(overlay_status.tone, Tone::Success);
    assert!(!state.view().ready);

    let tabular = TabularAsset {
        headers: vec![
            "Company Website".to_string(),
            "Contact Name".to_string(),
            "Notes".to_string(),
        ],
        rows: vec![
            row("https://ada.example.com", "Ada"),
            row("https://brian.example.com", "Brian"),
            row("https://chen.example.com", "Chen"),
        ],
    };
    let (state, _) = update(state, Msg::DataUploaded(tabular));
    let view = state.view();
    assert_eq!(view.mapping.target_field.as_deref(), Some("Company Website"));
    assert_eq!(view.mapping.label_field.as_deref(), Some("Contact Name"));
    assert!(view.ready);
    assert!(view.can_submit);
    assert_eq!(view.preview_rows.len(), 3);
    assert_eq!(view.overlay_preview.as_deref(), Some("/uploads/intro-1700000000.mp4"));

    let (state, effects) = update(
        state,
        Msg::SubmitClicked {
            mode: ProcessingMode::Parallel {
                use_extra_worker: false,
            },
        },
    );
    assert!(matches!(effects.as_slice(), [Effect::CreateJob { .. }]));
    let (mut state, _) = update(state, Msg::JobCreated { job_id: "job-1".into() });

    for (progress, status, complete) in [
        (0, JobStatus::Queued, false),
        (50, JobStatus::Processing, false),
        (100, JobStatus::Completed, true),
    ] {
        let (next, _) = update(
            state,
            Msg::ProgressReceived {
                job_id: "job-1".to_string(),
                update: ProgressUpdate {
                    progress,
                    message: format!("{progress}% done"),
                    results: results(status),
                    complete,
                    mode: Some(ProcessingMode::Parallel {
                        use_extra_worker: false,
                    }),
                    sequence: None,
                },
            },
        );
        state = next;
    }

    let view = state.view();
    assert!(!view.processing);
    assert_eq!(view.progress, 100);
    assert_eq!(view.results.len(), 3);
    assert!(view
        .results
        .iter()
        .all(|card| card.status == JobStatus::Completed && card.links.is_some()));
    assert_eq!(state.run().results, results(JobStatus::Completed));
}
