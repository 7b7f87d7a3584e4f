use crate::ApiError;

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseEvent {
    pub event: Option<String>,
    pub id: Option<String>,
    pub data: String,
}

impl SseEvent {
    /// Unnamed events and `event: message` carry progress; anything else
    /// (heartbeats, custom types) is for other listeners.
    pub fn is_message(&self) -> bool {
        self.event.as_deref().map_or(true, |name| name.is_empty() || name == "message")
    }
}

/// Longest line accepted before the stream is treated as malformed.
pub const MAX_LINE_BYTES: usize = 1 << 20;

/// Incremental `text/event-stream` decoder.
///
/// Feed it raw chunks as they arrive; it returns every event whose terminating
/// blank line has been seen. Chunks may split lines or UTF-8 sequences anywhere.
/// Lines end in LF, CRLF or a bare CR.
#[derive(Debug)]
pub struct SseDecoder {
    line: Vec<u8>,
    after_cr: bool,
    max_line: usize,
    data: Vec<String>,
    event: Option<String>,
    id: Option<String>,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            line: Vec::new(),
            after_cr: false,
            max_line,
            data: Vec::new(),
            event: None,
            id: None,
        }
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>, ApiError> {
        let mut events = Vec::new();
        for &byte in chunk {
            // LF directly after CR belongs to the same terminator, even across chunks.
            if std::mem::take(&mut self.after_cr) && byte == b'\n' {
                continue;
            }
            match byte {
                b'\n' | b'\r' => {
                    self.after_cr = byte == b'\r';
                    let line = std::mem::take(&mut self.line);
                    if let Some(event) = self.process_line(&String::from_utf8_lossy(&line)) {
                        events.push(event);
                    }
                }
                _ => {
                    if self.line.len() >= self.max_line {
                        return Err(ApiError::decode(format!(
                            "progress stream line exceeds {} bytes",
                            self.max_line
                        )));
                    }
                    self.line.push(byte);
                }
            }
        }
        Ok(events)
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            // `retry` only matters to auto-reconnecting clients.
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event,
            id: self.id.clone(),
            data,
        })
    }
}
