use splice_core::{AppViewModel, ResultCard, StatusLine, Tone};

/// Prints view models to stdout, one line per fact, skipping lines already shown.
pub struct Renderer {
    base_url: String,
    shown: Vec<String>,
}

impl Renderer {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            shown: Vec::new(),
        }
    }

    pub fn draw(&mut self, view: &AppViewModel) {
        for line in self.fresh_lines(view) {
            println!("{line}");
        }
    }

    /// Lines of the current frame that were not in the previous one.
    pub(crate) fn fresh_lines(&mut self, view: &AppViewModel) -> Vec<String> {
        let frame = render(view, &self.base_url);
        let fresh = frame
            .iter()
            .filter(|line| !self.shown.contains(line))
            .cloned()
            .collect();
        self.shown = frame;
        fresh
    }
}

pub fn render(view: &AppViewModel, base_url: &str) -> Vec<String> {
    let mut lines = Vec::new();

    push_status(&mut lines, "overlay", view.overlay_status.as_ref());
    if let Some(preview) = &view.overlay_preview {
        lines.push(format!("{:<10} preview {}{}", "overlay", base_url, preview));
    }

    push_status(&mut lines, "data", view.data_status.as_ref());
    if !view.headers.is_empty() {
        lines.push(format!("{:<10} columns: {}", "data", view.headers.join(", ")));
        for (index, row) in view.preview_rows.iter().enumerate() {
            lines.push(format!("{:<10} row {}: {}", "data", index + 1, row.join(" | ")));
        }
    }

    if view.mapping.target_field.is_some() || view.mapping.label_field.is_some() {
        lines.push(format!(
            "{:<10} website={} name={}",
            "mapping",
            view.mapping.target_field.as_deref().unwrap_or("-"),
            view.mapping.label_field.as_deref().unwrap_or("-")
        ));
    }
    push_status(&mut lines, "mapping", view.mapping_status.as_ref());

    if let Some(advice) = &view.worker_recommendation {
        lines.push(format!(
            "{:<10} recommended {} ({} with extra worker). {}",
            "workers",
            advice.recommended(),
            advice.recommended_plus_one(),
            advice.describe_system()
        ));
    }

    push_status(&mut lines, "processing", view.processing_status.as_ref());
    if view.processing || view.job_id.is_some() {
        lines.push(format!("{:<10} {}%", "progress", view.progress));
    }

    for card in &view.results {
        lines.push(result_line(card, base_url));
    }

    lines
}

fn push_status(lines: &mut Vec<String>, area: &str, status: Option<&StatusLine>) {
    if let Some(status) = status {
        lines.push(format!("{:<10} {} {}", area, tone_marker(status.tone), status.text));
    }
}

fn tone_marker(tone: Tone) -> &'static str {
    match tone {
        Tone::Success => "[ok]",
        Tone::Info => "[..]",
        Tone::Warning => "[!!]",
        Tone::Danger => "[xx]",
    }
}

fn result_line(card: &ResultCard, base_url: &str) -> String {
    let mut line = format!(
        "{:<10} {} {} <{}> {}",
        "result",
        tone_marker(card.tone),
        card.label,
        card.target,
        card.status_label
    );
    if let Some(error) = &card.error_message {
        line.push_str(&format!(": {error}"));
    }
    if let Some(links) = &card.links {
        line.push_str(&format!(" download {}{}", base_url, links.download));
    }
    line
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use splice_core::{project, JobResult, JobStatus};

    use super::*;

    fn view_with_results(results: &[JobResult]) -> AppViewModel {
        AppViewModel {
            processing: true,
            job_id: Some("job-1".to_string()),
            progress: 50,
            results: project(results),
            ..AppViewModel::default()
        }
    }

    fn result(label: &str, status: JobStatus, path: Option<&str>, error: Option<&str>) -> JobResult {
        JobResult {
            label: label.to_string(),
            target: format!("https://{}.example.com", label.to_lowercase()),
            status,
            output_path: path.map(str::to_string),
            error_message: error.map(str::to_string),
        }
    }

    #[test]
    fn result_lines_resolve_links_against_base_url() {
        let view = view_with_results(&[
            result("Acme", JobStatus::Completed, Some("acme.mp4"), None),
            result("Beta", JobStatus::Error, None, Some("page timed out")),
        ]);
        let lines = render(&view, "http://localhost:3000");
        assert_eq!(
            lines,
            vec![
                "progress   50%".to_string(),
                "result     [ok] Acme <https://acme.example.com> Completed download http://localhost:3000/output/acme.mp4"
                    .to_string(),
                "result     [xx] Beta <https://beta.example.com> Error: page timed out".to_string(),
            ]
        );
    }

    #[test]
    fn renderer_only_emits_changed_lines() {
        let mut renderer = Renderer::new("http://localhost:3000/");
        let first = view_with_results(&[result("Acme", JobStatus::Processing, None, None)]);
        assert_eq!(renderer.fresh_lines(&first).len(), 2);

        let mut second = first.clone();
        second.progress = 100;
        let fresh = renderer.fresh_lines(&second);
        assert_eq!(fresh, vec!["progress   100%".to_string()]);
    }

    #[test]
    fn status_lines_carry_tone_markers() {
        let view = AppViewModel {
            overlay_status: Some(StatusLine::new("Uploading video...", Tone::Info)),
            data_status: Some(StatusLine::new("Please select a CSV file", Tone::Danger)),
            ..AppViewModel::default()
        };
        assert_eq!(
            render(&view, ""),
            vec![
                "overlay    [..] Uploading video...".to_string(),
                "data       [xx] Please select a CSV file".to_string(),
            ]
        );
    }
}
