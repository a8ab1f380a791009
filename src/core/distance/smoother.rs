use std::collections::VecDeque;

/// Number of raw samples kept for smoothing
pub const HISTORY_CAPACITY: usize = 5;

/// Minimum number of samples before the median is used
const MIN_SAMPLES_FOR_MEDIAN: usize = 3;

/// Bounded history of raw distance samples with a streaming median.
///
/// This is noise rejection, not precision averaging: a single spike in the
/// last five frames never reaches the output once three samples exist. For
/// even-sized windows the upper-middle element is returned, no averaging.
#[derive(Debug, Clone, Default)]
pub struct DistanceHistory {
    samples: VecDeque<f64>,
}

impl DistanceHistory {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Record `raw` and return the smoothed value.
    ///
    /// Non-positive samples are not recorded and are returned unchanged.
    pub fn smooth(&mut self, raw: f64) -> f64 {
        if !(raw > 0.0) {
            return raw;
        }

        if self.samples.len() >= HISTORY_CAPACITY {
            self.samples.pop_front();
        }
        self.samples.push_back(raw);

        if self.samples.len() < MIN_SAMPLES_FOR_MEDIAN {
            return raw;
        }

        let mut sorted: Vec<f64> = self.samples.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        sorted[sorted.len() / 2]
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples from oldest to newest
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
