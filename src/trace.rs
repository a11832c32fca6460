//! Timing spans for the composed forward pass and objective evaluation
//!
//! Disabled by default. Enable the global [`TRACER`], run some steps, then
//! print [`Tracer::report`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{LazyLock, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// The measured stages of a model step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceStep {
    /// Full composed forward pass
    Forward,
    /// Fusion head evaluation
    Head,
    /// Loss computation
    Loss,
    /// Matrix multiplication kernel
    Matmul,
    /// Feature-axis concatenation of deep activations
    Concat,
}

impl fmt::Display for TraceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A single timing measurement.
#[derive(Debug, Clone)]
pub struct TraceMeasurement {
    pub step: TraceStep,
    pub duration: Duration,
    pub metadata: String,
}

/// Thread-safe tracer for collecting timing measurements.
pub struct Tracer {
    measurements: Mutex<Vec<TraceMeasurement>>,
    active_spans: Mutex<HashMap<TraceStep, Instant>>,
    enabled: Mutex<bool>,
}

impl Tracer {
    pub fn new() -> Self {
        Self {
            measurements: Mutex::new(Vec::new()),
            active_spans: Mutex::new(HashMap::new()),
            enabled: Mutex::new(false),
        }
    }

    pub fn enable(&self) {
        *self.enabled.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }

    pub fn disable(&self) {
        *self.enabled.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }

    pub fn is_enabled(&self) -> bool {
        *self.enabled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a timing span.
    pub fn start(&self, step: TraceStep) {
        if !self.is_enabled() {
            return;
        }
        let mut spans = self.active_spans.lock().unwrap_or_else(PoisonError::into_inner);
        spans.insert(step, Instant::now());
    }

    /// End a timing span and record measurement.
    pub fn end(&self, step: TraceStep, metadata: impl Into<String>) {
        if !self.is_enabled() {
            return;
        }
        let mut spans = self.active_spans.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(start) = spans.remove(&step) {
            let duration = start.elapsed();
            let mut measurements =
                self.measurements.lock().unwrap_or_else(PoisonError::into_inner);
            measurements.push(TraceMeasurement { step, duration, metadata: metadata.into() });
        }
    }

    /// Run a closure within a measured span.
    #[inline]
    pub fn span<F, R>(&self, step: TraceStep, metadata: impl Into<String>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.is_enabled() {
            return f();
        }
        self.start(step);
        let result = f();
        self.end(step, metadata);
        result
    }

    /// Snapshot of the recorded measurements.
    pub fn measurements(&self) -> Vec<TraceMeasurement> {
        self.measurements.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Clear all measurements.
    pub fn clear(&self) {
        self.measurements.lock().unwrap_or_else(PoisonError::into_inner).clear();
        self.active_spans.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Per-step totals, sorted by time spent.
    pub fn report(&self) -> String {
        let measurements = self.measurements.lock().unwrap_or_else(PoisonError::into_inner);
        if measurements.is_empty() {
            return "No measurements recorded. Enable tracing with TRACER.enable()".to_string();
        }

        let mut totals: HashMap<TraceStep, (Duration, usize)> = HashMap::new();
        for m in measurements.iter() {
            let entry = totals.entry(m.step).or_default();
            entry.0 += m.duration;
            entry.1 += 1;
        }
        // Forward encloses the other steps, so it is the reference for percentages
        let forward = totals.get(&TraceStep::Forward).map(|t| t.0).unwrap_or_default();

        let mut output = format!("{:<10} | {:<8} | {:<15} | {:<8}\n", "Step", "Count", "Duration", "% Fwd");
        output.push_str(&"-".repeat(50));
        output.push('\n');

        let mut sorted: Vec<_> = totals.into_iter().collect();
        sorted.sort_by(|a, b| b.1 .0.cmp(&a.1 .0));

        for (step, (duration, count)) in sorted {
            let pct = if forward.as_nanos() > 0 {
                format!("{:>7.2}%", duration.as_secs_f64() / forward.as_secs_f64() * 100.0)
            } else {
                "      -".to_string()
            };
            output.push_str(&format!(
                "{:<10} | {:<8} | {:<15.2?} | {pct}\n",
                step.to_string(),
                count,
                duration
            ));
        }

        output
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}

/// Global tracer instance.
pub static TRACER: LazyLock<Tracer> = LazyLock::new(Tracer::new);
