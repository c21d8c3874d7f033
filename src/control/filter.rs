//! Gaussian kernel smoothing filter.
//!
//! Keeps the last `N` `(time, value)` samples in a fixed ring and returns
//! their Gaussian-weighted mean, with weights centred on the newest
//! sample.  Older samples fade out with a time constant of `sigma`
//! seconds, so irregular sample spacing is handled naturally.

use heapless::Deque;

/// Kernel filter over a window of `N` samples.
pub struct KernelFilter<const N: usize> {
    samples: Deque<(u64, f32), N>,
    sigma_secs: f32,
    value: Option<f32>,
}

impl<const N: usize> KernelFilter<N> {
    pub fn new(sigma_secs: f32) -> Self {
        Self {
            samples: Deque::new(),
            sigma_secs,
            value: None,
        }
    }

    /// Add a sample taken at `at_ms` and return the new filtered value.
    /// Non-finite values are ignored and the previous output returned.
    pub fn add_sample(&mut self, at_ms: u64, value: f32) -> f32 {
        if !value.is_finite() {
            return self.value.unwrap_or(0.0);
        }
        if self.samples.is_full() {
            self.samples.pop_front();
        }
        // Cannot fail: a slot was freed above when full.
        let _ = self.samples.push_back((at_ms, value));

        let two_sigma_sq = 2.0 * self.sigma_secs * self.sigma_secs;
        let mut weighted = 0.0f32;
        let mut total = 0.0f32;
        for &(t, v) in self.samples.iter() {
            let age_secs = at_ms.saturating_sub(t) as f32 * 1.0e-3;
            let w = (-(age_secs * age_secs) / two_sigma_sq).exp();
            weighted += w * v;
            total += w;
        }
        // The newest sample always has weight 1, so `total >= 1`.
        let out = weighted / total;
        self.value = Some(out);
        out
    }

    /// Last filtered value, if any sample has been accepted.
    pub fn value(&self) -> Option<f32> {
        self.value
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.value = None;
    }
}

/// Enclosure temperature filter (σ = 20 s over 20 samples).
pub type TempFilter = KernelFilter<20>;
/// Temperature-derivative filter (σ = 15 s over 15 samples).
pub type DTempFilter = KernelFilter<15>;

pub const TEMP_FILTER_SIGMA_SECS: f32 = 20.0;
pub const D_TEMP_FILTER_SIGMA_SECS: f32 = 15.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_passes_through() {
        let mut f = TempFilter::new(TEMP_FILTER_SIGMA_SECS);
        assert_eq!(f.add_sample(1000, 24.0), 24.0);
        assert_eq!(f.value(), Some(24.0));
    }

    #[test]
    fn constant_input_is_unchanged() {
        let mut f = TempFilter::new(TEMP_FILTER_SIGMA_SECS);
        let mut out = 0.0;
        for i in 0..50u64 {
            out = f.add_sample(i * 1000, 25.0);
        }
        assert!((out - 25.0).abs() < 1e-4);
    }

    #[test]
    fn window_is_bounded() {
        let mut f = DTempFilter::new(D_TEMP_FILTER_SIGMA_SECS);
        for i in 0..40u64 {
            f.add_sample(i * 1000, 0.0);
        }
        assert_eq!(f.len(), 15);
    }

    #[test]
    fn output_lies_between_extremes() {
        let mut f = TempFilter::new(TEMP_FILTER_SIGMA_SECS);
        f.add_sample(0, 20.0);
        let out = f.add_sample(1000, 30.0);
        assert!(out > 20.0 && out < 30.0);
        // Newest sample dominates.
        assert!(out > 25.0);
    }

    #[test]
    fn stale_samples_fade_out() {
        let mut f = TempFilter::new(TEMP_FILTER_SIGMA_SECS);
        f.add_sample(0, 10.0);
        let out = f.add_sample(600_000, 30.0);
        assert!((out - 30.0).abs() < 1e-3);
    }

    #[test]
    fn nan_is_ignored() {
        let mut f = TempFilter::new(TEMP_FILTER_SIGMA_SECS);
        f.add_sample(0, 22.0);
        assert_eq!(f.add_sample(1000, f32::NAN), 22.0);
        assert_eq!(f.len(), 1);
    }
}
