//! Compute-usage sampling.

use tracing::warn;

/// Rolling window of per-cycle compute ratios (`used / limit`).
#[derive(Debug, Clone)]
pub struct ComputeMonitor {
    window: u64,
    samples: Vec<f64>,
    heartbeat: Option<u64>,
}

impl Default for ComputeMonitor {
    fn default() -> Self {
        Self::new(300)
    }
}

impl ComputeMonitor {
    pub fn new(window: u64) -> Self {
        Self {
            window: window.max(1),
            samples: Vec::new(),
            heartbeat: None,
        }
    }

    /// Record the ratio observed at the end of `cycle`.
    ///
    /// A gap of more than one cycle since the previous heartbeat means at
    /// least one cycle was cut short by the compute limit. Returns whether
    /// such a gap was detected.
    pub fn record(&mut self, cycle: u64, usage: f64) -> bool {
        let transgression = self
            .heartbeat
            .is_some_and(|last| cycle.saturating_sub(last) > 1);
        if transgression {
            warn!(
                heartbeat = self.heartbeat,
                cycle, "compute limit transgression detected"
            );
        }
        self.heartbeat = Some(cycle);

        if cycle % self.window == 0 {
            self.samples.clear();
        }
        if usage.is_finite() {
            self.samples.push(usage.max(0.0));
        }
        transgression
    }

    /// Mean ratio over the window; an empty window counts as fully used.
    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            warn!("no compute samples recorded; assuming full usage");
            return 1.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}
