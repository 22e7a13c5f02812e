use std::collections::HashMap;
use std::time::Instant;
use tracing::{info, warn};

/// Counts refresh outcomes across chunks and logs periodic progress plus a
/// final summary, so a long sweep does not log every item at info level.
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    refreshed: usize,
    failed: usize,
    timed_out: usize,
    start_time: Instant,
    /// Log every N items
    progress_interval: usize,
    last_progress_log: usize,
    error_counts: HashMap<String, usize>,
}

impl ProgressTracker {
    pub fn new(total: usize, progress_interval: usize) -> Self {
        if total > 0 {
            info!(total, "Starting refresh: {} items to process", total);
        }
        Self {
            total,
            refreshed: 0,
            failed: 0,
            timed_out: 0,
            start_time: Instant::now(),
            progress_interval: progress_interval.max(1),
            last_progress_log: 0,
            error_counts: HashMap::new(),
        }
    }

    pub fn record_refreshed(&mut self) {
        self.refreshed += 1;
    }

    pub fn record_timed_out(&mut self) {
        self.timed_out += 1;
        *self.error_counts.entry("timeout".to_string()).or_insert(0) += 1;
    }

    /// Failures are grouped by category in the summary
    pub fn record_failed(&mut self, category: &str) {
        self.failed += 1;
        *self.error_counts.entry(category.to_string()).or_insert(0) += 1;
    }

    pub fn processed(&self) -> usize {
        self.refreshed + self.failed + self.timed_out
    }

    pub fn refreshed(&self) -> usize {
        self.refreshed
    }

    pub fn failures(&self) -> usize {
        self.failed + self.timed_out
    }

    /// Call after each item or chunk
    pub fn log_progress(&mut self) {
        let current = self.processed();
        if current - self.last_progress_log < self.progress_interval && current != self.total {
            return;
        }

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 { current as f64 / elapsed } else { 0.0 };
        info!(
            "Progress: {}/{} ({:.1} items/sec) | Refreshed: {} | Failed: {} | Timed out: {}",
            current, self.total, rate, self.refreshed, self.failed, self.timed_out
        );
        self.last_progress_log = current;
    }

    /// Sorted by count, most frequent first
    pub fn error_breakdown(&self) -> Vec<(String, usize)> {
        let mut entries: Vec<(String, usize)> =
            self.error_counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }

    pub fn log_summary(&self, operation_name: &str) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if self.failures() == 0 {
            info!(
                "{} completed: {} total in {:.1}s | Refreshed: {}",
                operation_name, self.total, elapsed, self.refreshed
            );
            return;
        }

        warn!(
            "{} completed: {} total in {:.1}s | Refreshed: {} | Failed: {} | Timed out: {}",
            operation_name, self.total, elapsed, self.refreshed, self.failed, self.timed_out
        );
        let breakdown: Vec<String> = self
            .error_breakdown()
            .into_iter()
            .map(|(category, count)| format!("{}: {}", category, count))
            .collect();
        info!("Error breakdown: {}", breakdown.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_breakdown() {
        let mut tracker = ProgressTracker::new(5, 2);
        tracker.record_refreshed();
        tracker.record_refreshed();
        tracker.record_failed("http_status");
        tracker.record_timed_out();
        tracker.record_failed("http_status");

        assert_eq!(tracker.processed(), 5);
        assert_eq!(tracker.refreshed(), 2);
        assert_eq!(tracker.failures(), 3);
        assert_eq!(
            tracker.error_breakdown(),
            vec![("http_status".to_string(), 2), ("timeout".to_string(), 1)]
        );
    }
}
