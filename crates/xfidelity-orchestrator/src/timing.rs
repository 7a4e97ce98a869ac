use std::time::Duration;

use tracing::info;

const SLOW_THRESHOLD: Duration = Duration::from_millis(100);
const MAX_TRACKED: usize = 10;

/// Accumulates per-file elapsed times and logs the slowest ten files that
/// crossed the 100ms threshold once a scan finishes (§4.I step 4).
#[derive(Debug, Default)]
pub struct TimingReport {
    entries: Vec<(String, Duration)>,
}

impl TimingReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, file_path: &str, elapsed: Duration) {
        if elapsed >= SLOW_THRESHOLD {
            self.entries.push((file_path.to_string(), elapsed));
        }
    }

    pub fn log_slowest(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.entries.sort_by(|a, b| b.1.cmp(&a.1));
        self.entries.truncate(MAX_TRACKED);
        info!(count = self.entries.len(), "SLOWEST FILES");
        for (path, elapsed) in &self.entries {
            info!(file = %path, elapsed_ms = elapsed.as_millis() as u64, "slow file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_files_are_never_tracked() {
        let mut report = TimingReport::new();
        report.record("a.rs", Duration::from_millis(5));
        assert!(report.entries.is_empty());
    }

    #[test]
    fn only_the_ten_slowest_are_kept() {
        let mut report = TimingReport::new();
        for i in 0..15 {
            report.record(&format!("f{i}.rs"), Duration::from_millis(100 + i));
        }
        report.entries.sort_by(|a, b| b.1.cmp(&a.1));
        report.entries.truncate(MAX_TRACKED);
        assert_eq!(report.entries.len(), MAX_TRACKED);
        assert_eq!(report.entries[0].0, "f14.rs");
    }
}
