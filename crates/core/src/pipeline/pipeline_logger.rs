use std::collections::BTreeMap;
use std::time::Instant;

/// Cross-cutting logger for use case events.
///
/// Use cases report progress, per-stage timings and running counts here
/// rather than printing, so the CLI and tests can observe a run without
/// touching the orchestration code.
pub trait PipelineLogger: Send {
    /// Report item-level progress; `total` is 0 when unknown.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage took for one item.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Add `amount` to a named running counter (faces found, images skipped).
    fn count(&mut self, name: &str, amount: usize);

    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn count(&mut self, _name: &str, _amount: usize) {}
    fn info(&mut self, _message: &str) {}
}

#[derive(Default)]
struct StageTiming {
    calls: usize,
    total_ms: f64,
}

/// Logger for the command line: throttled progress through the `log`
/// facade and a per-stage timing table at the end of the run.
pub struct StdoutPipelineLogger {
    throttle: usize,
    stages: BTreeMap<String, StageTiming>,
    counters: BTreeMap<String, usize>,
    started: Instant,
    items: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle: usize) -> Self {
        Self {
            throttle: throttle.max(1),
            stages: BTreeMap::new(),
            counters: BTreeMap::new(),
            started: Instant::now(),
            items: 0,
        }
    }

    pub fn counter(&self, name: &str) -> usize {
        self.counters.get(name).copied().unwrap_or(0)
    }

    /// Mean duration of a stage in milliseconds.
    pub fn average_ms(&self, stage: &str) -> Option<f64> {
        self.stages
            .get(stage)
            .filter(|t| t.calls > 0)
            .map(|t| t.total_ms / t.calls as f64)
    }

    /// The formatted summary, or `None` when nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.stages.is_empty() && self.counters.is_empty() {
            return None;
        }

        let elapsed_s = self.started.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Run summary ({} items, {elapsed_s:.1}s):",
            self.items
        )];

        for (stage, t) in &self.stages {
            let avg = t.total_ms / t.calls.max(1) as f64;
            lines.push(format!(
                "  {stage:12}: avg {avg:6.1}ms  total {:7.0}ms  ({} calls)",
                t.total_ms, t.calls
            ));
        }
        for (name, value) in &self.counters {
            lines.push(format!("  {name}: {value}"));
        }
        if self.items > 0 && elapsed_s > 0.0 {
            lines.push(format!(
                "  Throughput: {:.1} items/s",
                self.items as f64 / elapsed_s
            ));
        }

        Some(lines.join("\n"))
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(25)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.items = self.items.max(current);
        if current % self.throttle != 0 && current != total {
            return;
        }
        if total > 0 {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Processed {current}/{total} ({pct:.1}%)");
        } else {
            log::info!("Processed {current}");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        let t = self.stages.entry(stage.to_string()).or_default();
        t.calls += 1;
        t.total_ms += duration_ms;
    }

    fn count(&mut self, name: &str, amount: usize) {
        *self.counters.entry(name.to_string()).or_default() += amount;
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
