//! Running statistics over a stream of scalar observations.
//!
//! Used for write-latency telemetry, but works for any `f32` series. Keeps
//! O(1) state: no samples are retained.

/// Snapshot of a [`StatsAccumulator`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Stats {
    /// Number of observations.
    pub count: u32,
    /// Running mean.
    pub mean: f32,
    /// Running standard deviation (0 until two observations are seen).
    pub stdev: f32,
    /// Smallest observation.
    pub min: f32,
    /// Largest observation.
    pub max: f32,
}

/// Online mean / standard deviation / min / max.
///
/// The deviation follows the incremental recurrence
/// `s²ₙ = (n−2)/(n−1) · s²ₙ₋₁ + δ²/n`, where `δ` is the distance of the new
/// value from the previous mean. This yields the sample (n−1) standard
/// deviation.
#[derive(Clone, Debug, Default)]
pub struct StatsAccumulator {
    data: Stats,
}

impl StatsAccumulator {
    pub const fn new() -> Self {
        StatsAccumulator {
            data: Stats {
                count: 0,
                mean: 0.0,
                stdev: 0.0,
                min: 0.0,
                max: 0.0,
            },
        }
    }

    /// Fold one observation into the running statistics.
    pub fn add(&mut self, value: f32) {
        let d = &mut self.data;
        d.count += 1;

        if d.count == 1 {
            d.mean = value;
            d.min = value;
            d.max = value;
            return;
        }

        if value < d.min {
            d.min = value;
        }
        if value > d.max {
            d.max = value;
        }

        let n = d.count as f32;
        let delta = value - d.mean;
        d.mean += delta / n;

        let variance = (n - 2.0) / (n - 1.0) * d.stdev * d.stdev + delta * delta / n;
        d.stdev = libm::sqrtf(variance);
    }

    /// Current statistics.
    pub fn get(&self) -> &Stats {
        &self.data
    }

    /// Forget every observation.
    pub fn reset(&mut self) {
        self.data = Stats::default();
    }
}
