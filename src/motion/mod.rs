// PixelPal — Motion Sensing & Classification
//
// Polls the accelerometer FIFO, smooths the gravity-compensated magnitude,
// and classifies shakes, taps, sudden acceleration, orientation, and
// inactivity into a set of motion flags the animation orchestrator consumes.

mod classifier;
mod filter;
mod flags;
mod rules;

pub use classifier::{DimRequest, MotionClassifier};
pub use filter::MagnitudeFilter;
pub use flags::{MotionFlags, MotionKind};
pub use rules::{interaction_for, Interaction};

/// One raw accelerometer reading in m/s².
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl SensorSample {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Tap source axis as reported by the sensor's interrupt registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapAxis {
    X,
    Y,
    /// Z-axis taps belong to the menu layer and are never classified as
    /// interaction.
    Z,
}

/// Hardware tap report for one poll, pre-decoded by the driver from the
/// interrupt line plus INT_SOURCE / ACT_TAP_STATUS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TapEvent {
    #[default]
    None,
    Single(TapAxis),
    Double(TapAxis),
}

/// Narrow accelerometer contract the classifier polls. The real driver sits
/// in `drivers::adxl345`; tests feed synthetic batches.
pub trait AccelSource {
    /// False once sensor init has failed for good; polling becomes a no-op.
    fn is_enabled(&self) -> bool;

    /// Number of FIFO samples ready (0–32).
    fn available_samples(&mut self) -> u8;

    /// Pop one FIFO sample. Disabled sensors read all-zero.
    fn read_sample(&mut self) -> SensorSample;

    /// Consume the pending tap interrupt report, if any.
    fn take_tap_event(&mut self) -> TapEvent;
}

/// Largest FIFO batch the hardware can hand us in one poll.
pub const MAX_FIFO_SAMPLES: usize = 32;
