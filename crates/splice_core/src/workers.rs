use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub cpu_cores: u32,
    pub memory_gb: f64,
}

/// Server-side advice on how many render workers this machine can sustain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkerRecommendation {
    recommended: u32,
    system_info: SystemInfo,
}

impl WorkerRecommendation {
    /// Returns `None` when `recommended` is zero.
    pub fn new(recommended: u32, system_info: SystemInfo) -> Option<Self> {
        (recommended >= 1).then_some(Self {
            recommended,
            system_info,
        })
    }

    pub fn recommended(&self) -> u32 {
        self.recommended
    }

    pub fn recommended_plus_one(&self) -> u32 {
        self.recommended + 1
    }

    pub fn system_info(&self) -> SystemInfo {
        self.system_info
    }

    pub fn describe_system(&self) -> String {
        format!(
            "The recommended count is based on your system's resources ({} CPU cores, {}GB RAM).",
            self.system_info.cpu_cores, self.system_info.memory_gb
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessingMode {
    #[default]
    Sequential,
    Parallel { use_extra_worker: bool },
}

impl ProcessingMode {
    pub fn is_parallel(&self) -> bool {
        matches!(self, ProcessingMode::Parallel { .. })
    }

    pub fn uses_extra_worker(&self) -> bool {
        matches!(self, ProcessingMode::Parallel { use_extra_worker: true })
    }

    /// Worker count this mode asks the server for, if it can be known client-side.
    pub fn requested_workers(&self, advice: Option<&WorkerRecommendation>) -> Option<u32> {
        match self {
            ProcessingMode::Sequential => Some(1),
            ProcessingMode::Parallel { use_extra_worker } => advice.map(|advice| {
                if *use_extra_worker {
                    advice.recommended_plus_one()
                } else {
                    advice.recommended()
                }
            }),
        }
    }

    /// Suffix appended to status messages, e.g. `" (using 4 workers)"`.
    pub fn worker_info(&self, advice: Option<&WorkerRecommendation>) -> String {
        match (self, self.requested_workers(advice)) {
            (ProcessingMode::Sequential, _) => " (sequential processing)".to_string(),
            (ProcessingMode::Parallel { .. }, Some(count)) => format!(" (using {count} workers)"),
            (ProcessingMode::Parallel { .. }, None) => " (parallel processing)".to_string(),
        }
    }

    /// Suffix for progress messages. Sequential runs read "(using sequential processing)" here.
    pub fn progress_info(&self, advice: Option<&WorkerRecommendation>) -> String {
        match self {
            ProcessingMode::Sequential => " (using sequential processing)".to_string(),
            ProcessingMode::Parallel { .. } => self.worker_info(advice),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advice(recommended: u32) -> WorkerRecommendation {
        WorkerRecommendation::new(
            recommended,
            SystemInfo {
                cpu_cores: 8,
                memory_gb: 16.0,
            },
        )
        .unwrap()
    }

    #[test]
    fn zero_recommendation_is_rejected() {
        assert!(WorkerRecommendation::new(0, advice(1).system_info()).is_none());
    }

    #[test]
    fn extra_worker_adds_one() {
        let advice = advice(3);
        let mode = ProcessingMode::Parallel {
            use_extra_worker: true,
        };
        assert_eq!(mode.requested_workers(Some(&advice)), Some(4));
        assert_eq!(mode.worker_info(Some(&advice)), " (using 4 workers)");
    }

    #[test]
    fn parallel_without_advice_has_no_count() {
        let mode = ProcessingMode::Parallel {
            use_extra_worker: false,
        };
        assert_eq!(mode.requested_workers(None), None);
        assert_eq!(mode.worker_info(None), " (parallel processing)");
    }

    #[test]
    fn sequential_always_one_worker() {
        assert_eq!(ProcessingMode::Sequential.requested_workers(None), Some(1));
        assert_eq!(
            ProcessingMode::Sequential.worker_info(Some(&advice(6))),
            " (sequential processing)"
        );
    }
}
