// PixelPal — Combined Magnitude Filter
//
// Exponentially smoothed, gravity-compensated acceleration magnitude.
// Smoothing keeps single noisy FIFO samples from tripping the shake and
// sudden-acceleration thresholds.

use crate::config::{GRAVITY_MS2, MAGNITUDE_SMOOTHING};

#[derive(Debug, Clone, Copy, Default)]
pub struct MagnitudeFilter {
    smoothed: f32,
}

impl MagnitudeFilter {
    pub fn new() -> Self {
        Self { smoothed: 0.0 }
    }

    /// Feed one sample, returning the updated smoothed magnitude (m/s²).
    ///
    /// `s' = α·|‖a‖ − g| + (1 − α)·s`, which is non-negative by construction
    /// and converges geometrically toward the true dynamic magnitude under
    /// constant input.
    pub fn update(&mut self, x: f32, y: f32, z: f32) -> f32 {
        let raw = (x * x + y * y + z * z).sqrt();
        let dynamic = (raw - GRAVITY_MS2).abs();
        self.smoothed = MAGNITUDE_SMOOTHING * dynamic + (1.0 - MAGNITUDE_SMOOTHING) * self.smoothed;
        self.smoothed
    }

    pub fn value(&self) -> f32 {
        self.smoothed
    }
}
