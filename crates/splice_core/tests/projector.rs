use splice_core::{
    project, project_preview, JobResult, JobStatus, OutputLinks, Row, TabularAsset, Tone,
    PREVIEW_ROW_LIMIT,
};

fn result(status: JobStatus) -> JobResult {
    JobResult {
        label: "Acme".to_string(),
        target: "https://acme.example.com".to_string(),
        status,
        output_path: None,
        error_message: None,
    }
}

#[test]
fn status_maps_to_tone() {
    let cards = project(&[
        result(JobStatus::Completed),
        result(JobStatus::Processing),
        result(JobStatus::Error),
        result(JobStatus::Queued),
    ]);
    let tones: Vec<_> = cards.iter().map(|card| card.tone).collect();
    assert_eq!(
        tones,
        vec![Tone::Success, Tone::Info, Tone::Danger, Tone::Warning]
    );
    assert_eq!(cards[2].status_label, "Error");
}

#[test]
fn output_path_exposes_links_and_error_is_verbatim() {
    let mut done = result(JobStatus::Completed);
    done.output_path = Some("acme_1.mp4".to_string());
    let mut failed = result(JobStatus::Error);
    failed.error_message = Some("Screenshot failed: <timeout>".to_string());

    let cards = project(&[done, failed]);
    assert_eq!(
        cards[0].links,
        Some(OutputLinks {
            download: "/output/acme_1.mp4".to_string(),
            view: "/output/acme_1.mp4".to_string(),
        })
    );
    assert_eq!(cards[0].error_message, None);
    assert_eq!(cards[1].links, None);
    assert_eq!(
        cards[1].error_message.as_deref(),
        Some("Screenshot failed: <timeout>")
    );
}

#[test]
fn projection_is_idempotent() {
    let input = vec![result(JobStatus::Processing), result(JobStatus::Queued)];
    assert_eq!(project(&input), project(&input));
}

#[test]
fn unknown_status_labels_render_as_queued() {
    assert_eq!(JobStatus::from_label("pending"), JobStatus::Queued);
    assert_eq!(JobStatus::from_label("Completed"), JobStatus::Completed);
    let cards = project(&[result(JobStatus::from_label("waiting"))]);
    assert_eq!(cards[0].tone, Tone::Warning);
}

#[test]
fn preview_is_limited_and_follows_header_order() {
    let headers = vec!["Name".to_string(), "Website".to_string()];
    let rows: Vec<Row> = (0..8)
        .map(|i| Row::from([("Website".to_string(), format!("https://{i}.example.com"))]))
        .collect();
    let preview = project_preview(&TabularAsset { headers, rows });

    assert_eq!(preview.len(), PREVIEW_ROW_LIMIT);
    assert_eq!(
        preview[0],
        vec![String::new(), "https://0.example.com".to_string()]
    );
}
