//! Threshold tables mapping a metric onto the discrete score scale

/// Ordered bands of `(upper bound, score)`
///
/// A value scores the first band whose bound it is strictly below; values at
/// or above the last bound score `top`. Bounds must be ascending.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    bands: &'static [(f64, i32)],
    top: i32,
}

impl Thresholds {
    pub const fn new(bands: &'static [(f64, i32)], top: i32) -> Self {
        Self { bands, top }
    }

    pub fn score(&self, value: f64) -> i32 {
        self.bands
            .iter()
            .find(|(bound, _)| value < *bound)
            .map_or(self.top, |(_, score)| *score)
    }
}
