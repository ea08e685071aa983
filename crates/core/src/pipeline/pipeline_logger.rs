use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for per-camera pipeline activity: stage timings, counters and
/// progress, independent of where the output ends up.
pub trait PipelineLogger: Send {
    /// Called once per processed frame with the running frame count.
    fn progress(&mut self, frames_processed: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a per-frame sample (e.g. confirmed track count).
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emit a summary when the camera stops. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything. Used by tests and embedders with their own metrics.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _frames_processed: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

#[derive(Clone, Copy, Debug, Default)]
struct Aggregate {
    count: u64,
    total: f64,
    max: f64,
}

impl Aggregate {
    fn record(&mut self, value: f64) {
        self.count += 1;
        self.total += value;
        self.max = self.max.max(value);
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Logs through the `log` facade for one camera.
///
/// Streams are unbounded, so only running aggregates are kept. Progress is
/// logged every `throttle_frames` frames.
pub struct LogPipelineLogger {
    label: String,
    throttle_frames: usize,
    timings: BTreeMap<String, Aggregate>,
    metrics: BTreeMap<String, Aggregate>,
    start_time: Instant,
    frames: usize,
}

impl LogPipelineLogger {
    pub fn new(label: impl Into<String>, throttle_frames: usize) -> Self {
        Self {
            label: label.into(),
            throttle_frames: throttle_frames.max(1),
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            start_time: Instant::now(),
            frames: 0,
        }
    }

    /// Returns the formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_s = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "[{}] summary ({} frames, {elapsed_s:.1}s):",
            self.label, self.frames
        )];

        for (stage, agg) in &self.timings {
            lines.push(format!(
                "  {stage:10}: avg {:6.2}ms  max {:7.2}ms  total {:8.0}ms",
                agg.mean(),
                agg.max,
                agg.total
            ));
        }
        for (name, agg) in &self.metrics {
            lines.push(format!("  {name}: avg {:.1}  max {:.0}", agg.mean(), agg.max));
        }
        if self.frames > 0 && elapsed_s > 0.0 {
            lines.push(format!("  Throughput: {:.1} fps", self.frames as f64 / elapsed_s));
        }

        Some(lines.join("\n"))
    }

    /// Mean duration recorded for `stage`.
    pub fn mean_timing(&self, stage: &str) -> Option<f64> {
        self.timings.get(stage).map(Aggregate::mean)
    }

    pub fn mean_metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).map(Aggregate::mean)
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, frames_processed: usize) {
        self.frames = frames_processed;
        if frames_processed % self.throttle_frames == 0 {
            let elapsed_s = self.start_time.elapsed().as_secs_f64();
            log::info!(
                "[{}] {frames_processed} frames ({:.1} fps)",
                self.label,
                if elapsed_s > 0.0 { frames_processed as f64 / elapsed_s } else { 0.0 }
            );
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().record(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("[{}] {message}", self.label);
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n{text}");
        }
    }
}
