// PixelPal — Motion State Flags
//
// Owned bitset replacing the classic global bool array: the classifier is the
// single writer, the orchestrator reads and explicitly clears one-shot flags.

/// Kinds of motion state the classifier tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MotionKind {
    Shaking = 0,
    Tapped,
    DoubleTapped,
    /// Display dimmed after sustained idling (not deep sleep).
    Sleep,
    /// Deep-sleep candidate after prolonged stillness.
    DeepSleep,
    UpsideDown,
    TiltedLeft,
    TiltedRight,
    HalfTiltedLeft,
    HalfTiltedRight,
    SuddenAcceleration,
}

impl MotionKind {
    #[inline]
    fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// Fixed-size set of motion flags. Cleared flags persist until explicitly
/// re-set by the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionFlags(u16);

/// One-shot interaction flags (shake/tap/double-tap/sudden-acceleration).
pub const INTERACTED: &[MotionKind] = &[
    MotionKind::Shaking,
    MotionKind::Tapped,
    MotionKind::DoubleTapped,
    MotionKind::SuddenAcceleration,
];

/// Non-standard orientation flags, full and half tilt included.
pub const ORIENTED: &[MotionKind] = &[
    MotionKind::TiltedLeft,
    MotionKind::TiltedRight,
    MotionKind::HalfTiltedLeft,
    MotionKind::HalfTiltedRight,
    MotionKind::UpsideDown,
];

impl MotionFlags {
    pub fn new() -> Self {
        Self(0)
    }

    #[inline]
    pub fn get(&self, kind: MotionKind) -> bool {
        self.0 & kind.bit() != 0
    }

    #[inline]
    pub fn set(&mut self, kind: MotionKind, value: bool) {
        if value {
            self.0 |= kind.bit();
        } else {
            self.0 &= !kind.bit();
        }
    }

    /// True if any flag in `kinds` is active.
    pub fn any(&self, kinds: &[MotionKind]) -> bool {
        kinds.iter().any(|k| self.get(*k))
    }

    /// Reset every flag to inactive.
    pub fn reset(&mut self) {
        self.0 = 0;
    }

    pub fn interacted(&self) -> bool {
        self.any(INTERACTED)
    }

    pub fn oriented(&self) -> bool {
        self.any(ORIENTED)
    }

    /// Full tilt or upside down — the orientations that trigger the crash
    /// sub-machine and abort playback.
    pub fn fully_oriented(&self) -> bool {
        self.get(MotionKind::TiltedLeft)
            || self.get(MotionKind::TiltedRight)
            || self.get(MotionKind::UpsideDown)
    }
}
