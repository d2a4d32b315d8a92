// PixelPal — Motion Classifier
//
// One classification pass per poll, in fixed priority order:
//   shake → tap/double-tap → sudden acceleration → orientation → inactivity.
// A tap arms a shake lockout; taps and shakes arm a sudden-acceleration
// lockout. Orientation is always computed from the batch average, never a
// single sample. All timing is wrapping-millisecond arithmetic.

use crate::clock::elapsed_ms;
use crate::config::{
    self, MotionTuning, ACCELERATION_CHANGE_THRESHOLD, ACCELERATION_THRESHOLD, FLIP_THRESHOLD,
    HALF_TILT_THRESHOLD, INACTIVITY_THRESHOLD, SHAKE_THRESHOLD, TILT_THRESHOLD,
};

use super::filter::MagnitudeFilter;
use super::flags::{MotionFlags, MotionKind};
use super::rules::{interaction_for, Interaction};
use super::{AccelSource, SensorSample, TapAxis, TapEvent, MAX_FIFO_SAMPLES};

/// Display brightness request derived from activity, forwarded by the caller
/// to the display layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimRequest {
    /// Activity detected — restore full brightness.
    Wake,
    /// Sustained idling — dim the panel.
    Dim,
}

pub struct MotionClassifier {
    tuning: MotionTuning,
    flags: MotionFlags,
    filter: MagnitudeFilter,

    // Sudden-acceleration tracking
    prev_magnitude: f32,
    accel_lockout_at: Option<u32>,

    // Shake-after-tap lockout
    tap_lockout_at: Option<u32>,

    // Deep-sleep inactivity tracking
    still_since: Option<u32>,
    deep_sleep_armed_at: Option<u32>,
    deep_sleep_fired: bool,
    pending_deep_sleep: bool,

    // Display dim / idle-sleep timers (separate from deep sleep)
    last_active_ms: u32,
    wake_debounced_at: u32,
    dimmed: bool,
    pending_dim: Option<DimRequest>,
}

impl MotionClassifier {
    pub fn new(tuning: MotionTuning) -> Self {
        Self {
            tuning,
            flags: MotionFlags::new(),
            filter: MagnitudeFilter::new(),
            prev_magnitude: 0.0,
            accel_lockout_at: None,
            tap_lockout_at: None,
            still_since: None,
            deep_sleep_armed_at: None,
            deep_sleep_fired: false,
            pending_deep_sleep: false,
            last_active_ms: 0,
            wake_debounced_at: 0,
            dimmed: false,
            pending_dim: None,
        }
    }

    // -----------------------------------------------------------------------
    // Polling
    // -----------------------------------------------------------------------

    /// One classification pass. Reads the FIFO batch once and runs every
    /// detector over it. Zero samples or a disabled sensor is a safe no-op:
    /// prior flags persist until the orchestrator clears them.
    pub fn poll(&mut self, source: &mut dyn AccelSource, now_ms: u32) {
        if !source.is_enabled() {
            return;
        }

        let count = (source.available_samples() as usize).min(MAX_FIFO_SAMPLES);
        if count == 0 {
            return;
        }

        let mut magnitude_sum = 0.0f32;
        let mut sum = SensorSample::default();
        for _ in 0..count {
            let s = source.read_sample();
            magnitude_sum += self.filter.update(s.x, s.y, s.z);
            sum.x += s.x;
            sum.y += s.y;
            sum.z += s.z;
        }
        let n = count as f32;
        let avg_magnitude = magnitude_sum / n;
        let avg_y = sum.y / n;
        let avg_z = sum.z / n;

        self.detect_shake(avg_magnitude, now_ms);
        if self.flags.get(MotionKind::Shaking) {
            // Shaking is unambiguous activity; taps and inactivity are
            // suppressed for the rest of this poll.
            self.reset_inactivity();
        } else {
            self.detect_tap(source.take_tap_event(), now_ms);
            self.monitor_inactivity(avg_magnitude, now_ms);
        }
        self.detect_sudden_acceleration(now_ms);
        self.detect_orientation(avg_y, avg_z);
        self.auto_dim(avg_magnitude, now_ms);
    }

    // -----------------------------------------------------------------------
    // Detectors
    // -----------------------------------------------------------------------

    fn detect_shake(&mut self, avg_magnitude: f32, now_ms: u32) {
        // A recent tap would otherwise read as a shake spike.
        if self.flags.get(MotionKind::Tapped) || self.flags.get(MotionKind::DoubleTapped) {
            self.tap_lockout_at = Some(now_ms);
            return;
        }
        if let Some(at) = self.tap_lockout_at {
            if elapsed_ms(now_ms, at) < self.tuning.tap_lockout_ms {
                return;
            }
            self.tap_lockout_at = None;
        }

        if avg_magnitude >= SHAKE_THRESHOLD {
            log::info!("shake detected (avg {:.2} m/s²)", avg_magnitude);
            self.flags.set(MotionKind::Shaking, true);
        }
    }

    fn detect_tap(&mut self, event: TapEvent, now_ms: u32) {
        match event {
            // Z-axis taps belong to the menu layer.
            TapEvent::Single(TapAxis::Z) | TapEvent::Double(TapAxis::Z) => {}
            TapEvent::Double(_) => {
                self.flags.set(MotionKind::DoubleTapped, true);
                self.tap_lockout_at = Some(now_ms);
            }
            TapEvent::Single(_) => {
                self.flags.set(MotionKind::Tapped, true);
                self.tap_lockout_at = Some(now_ms);
            }
            TapEvent::None => {}
        }
    }

    fn detect_sudden_acceleration(&mut self, now_ms: u32) {
        let current = self.filter.value();
        let change = (current - self.prev_magnitude).abs();
        self.prev_magnitude = current;

        // A tap or shake reads as a magnitude spike; hold off for a while.
        if self.flags.get(MotionKind::Tapped)
            || self.flags.get(MotionKind::DoubleTapped)
            || self.flags.get(MotionKind::Shaking)
        {
            self.accel_lockout_at = Some(now_ms);
            self.flags.set(MotionKind::SuddenAcceleration, false);
            return;
        }
        if let Some(at) = self.accel_lockout_at {
            if elapsed_ms(now_ms, at) < self.tuning.accel_lockout_ms {
                return;
            }
            self.accel_lockout_at = None;
        }

        if current >= ACCELERATION_THRESHOLD && change >= ACCELERATION_CHANGE_THRESHOLD {
            log::info!(
                "sudden acceleration (magnitude {:.2}, change {:.2})",
                current,
                change
            );
            self.flags.set(MotionKind::SuddenAcceleration, true);
        } else {
            self.flags.set(MotionKind::SuddenAcceleration, false);
        }
    }

    fn detect_orientation(&mut self, avg_y: f32, avg_z: f32) {
        // Orientation flags are mutually exclusive; recompute from scratch.
        self.flags.set(MotionKind::UpsideDown, false);
        self.flags.set(MotionKind::TiltedLeft, false);
        self.flags.set(MotionKind::TiltedRight, false);
        self.flags.set(MotionKind::HalfTiltedLeft, false);
        self.flags.set(MotionKind::HalfTiltedRight, false);

        if avg_z <= FLIP_THRESHOLD {
            self.flags.set(MotionKind::UpsideDown, true);
        } else if avg_y >= TILT_THRESHOLD {
            self.flags.set(MotionKind::TiltedRight, true);
        } else if avg_y <= -TILT_THRESHOLD {
            self.flags.set(MotionKind::TiltedLeft, true);
        } else if avg_y >= HALF_TILT_THRESHOLD {
            self.flags.set(MotionKind::HalfTiltedRight, true);
        } else if avg_y <= -HALF_TILT_THRESHOLD {
            self.flags.set(MotionKind::HalfTiltedLeft, true);
        }
    }

    fn monitor_inactivity(&mut self, avg_magnitude: f32, now_ms: u32) {
        if avg_magnitude >= INACTIVITY_THRESHOLD {
            self.reset_inactivity();
            return;
        }

        let since = *self.still_since.get_or_insert(now_ms);
        if elapsed_ms(now_ms, since) < self.tuning.inactivity_timeout_ms {
            return;
        }

        // The grace timer anchors to the timeout crossing, not the flag: the
        // orchestrator clears the candidate flag every tick after blanking.
        let armed = *self.deep_sleep_armed_at.get_or_insert_with(|| {
            log::info!("inactivity timeout — deep sleep candidate");
            now_ms
        });
        self.flags.set(MotionKind::DeepSleep, true);
        if elapsed_ms(now_ms, armed) >= self.tuning.deep_sleep_grace_ms && !self.deep_sleep_fired {
            log::info!("deep sleep grace elapsed — requesting power-down");
            self.deep_sleep_fired = true;
            self.pending_deep_sleep = true;
        }
    }

    fn reset_inactivity(&mut self) {
        self.still_since = None;
        self.deep_sleep_armed_at = None;
        self.deep_sleep_fired = false;
        self.flags.set(MotionKind::DeepSleep, false);
    }

    fn auto_dim(&mut self, avg_magnitude: f32, now_ms: u32) {
        if avg_magnitude > INACTIVITY_THRESHOLD {
            if elapsed_ms(now_ms, self.wake_debounced_at) >= config::DISPLAY_WAKE_DEBOUNCE_MS {
                self.pending_dim = Some(DimRequest::Wake);
                self.wake_debounced_at = now_ms;
            }
            self.last_active_ms = now_ms;
            self.dimmed = false;
            self.flags.set(MotionKind::Sleep, false);
            return;
        }

        let idle = elapsed_ms(now_ms, self.last_active_ms);
        if idle >= self.tuning.dim_timeout_ms && !self.dimmed {
            log::info!("idle for {} ms — dimming display", idle);
            self.pending_dim = Some(DimRequest::Dim);
            self.dimmed = true;
        }
        if idle >= self.tuning.idle_sleep_timeout_ms && !self.flags.get(MotionKind::Sleep) {
            log::info!("idle sleep threshold reached");
            self.flags.set(MotionKind::Sleep, true);
        }
    }

    // -----------------------------------------------------------------------
    // Outputs
    // -----------------------------------------------------------------------

    pub fn flags(&self) -> &MotionFlags {
        &self.flags
    }

    /// Orchestrator-side clear for one-shot flags (read-and-clear contract).
    pub fn set(&mut self, kind: MotionKind, value: bool) {
        self.flags.set(kind, value);
    }

    /// Reset every motion flag to inactive.
    pub fn reset_flags(&mut self) {
        self.flags.reset();
    }

    /// Highest-priority one-shot interaction currently flagged.
    pub fn interaction(&self) -> Option<Interaction> {
        interaction_for(&self.flags)
    }

    /// One-shot: true exactly once per inactivity episode, after the
    /// deep-sleep grace period has elapsed.
    pub fn take_deep_sleep_request(&mut self) -> bool {
        std::mem::take(&mut self.pending_deep_sleep)
    }

    /// Pending display brightness change, if any.
    pub fn take_dim_request(&mut self) -> Option<DimRequest> {
        self.pending_dim.take()
    }

    pub fn tapped(&self) -> bool {
        self.flags.get(MotionKind::Tapped)
    }

    pub fn double_tapped(&self) -> bool {
        self.flags.get(MotionKind::DoubleTapped)
    }

    pub fn shaking(&self) -> bool {
        self.flags.get(MotionKind::Shaking)
    }

    pub fn sudden_acceleration(&self) -> bool {
        self.flags.get(MotionKind::SuddenAcceleration)
    }

    pub fn upside_down(&self) -> bool {
        self.flags.get(MotionKind::UpsideDown)
    }

    pub fn tilted_left(&self) -> bool {
        self.flags.get(MotionKind::TiltedLeft)
    }

    pub fn tilted_right(&self) -> bool {
        self.flags.get(MotionKind::TiltedRight)
    }

    pub fn half_tilted_left(&self) -> bool {
        self.flags.get(MotionKind::HalfTiltedLeft)
    }

    pub fn half_tilted_right(&self) -> bool {
        self.flags.get(MotionKind::HalfTiltedRight)
    }

    pub fn sleep(&self) -> bool {
        self.flags.get(MotionKind::Sleep)
    }

    pub fn deep_sleep(&self) -> bool {
        self.flags.get(MotionKind::DeepSleep)
    }

    pub fn interacted(&self) -> bool {
        self.flags.interacted()
    }

    pub fn oriented(&self) -> bool {
        self.flags.oriented()
    }
}

impl Default for MotionClassifier {
    fn default() -> Self {
        Self::new(MotionTuning::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::SyntheticAccel;

    const G: f32 = crate::config::GRAVITY_MS2;

    fn classifier() -> MotionClassifier {
        MotionClassifier::default()
    }

    /// Sample whose smoothed dynamic magnitude settles at roughly `mag`.
    fn sample_with_magnitude(mag: f32) -> SensorSample {
        SensorSample::new(mag + G, 0.0, 0.0)
    }

    /// Drive the filter to steady state so batch averages sit at `mag`.
    fn settle(c: &mut MotionClassifier, accel: &mut SyntheticAccel, mag: f32, now: u32) {
        for i in 0..40 {
            accel.queue_repeated(sample_with_magnitude(mag), 4);
            c.poll(accel, now + i);
        }
    }

    #[test]
    fn shake_fires_on_high_average_batch() {
        let mut c = classifier();
        let mut accel = SyntheticAccel::new();
        settle(&mut c, &mut accel, 8.5, 0);
        assert!(c.shaking(), "scenario A: avg 8.5 m/s² must flag SHAKING");
    }

    #[test]
    fn shake_suppresses_tap_same_evaluation() {
        let mut c = classifier();
        let mut accel = SyntheticAccel::new();
        settle(&mut c, &mut accel, 8.5, 0);

        accel.tap = TapEvent::Single(TapAxis::X);
        accel.queue_repeated(sample_with_magnitude(8.5), 5);
        c.poll(&mut accel, 100);

        assert!(c.shaking());
        assert!(!c.tapped(), "tap must be suppressed while shaking");
    }

    #[test]
    fn tap_locks_out_shake_for_window() {
        let mut c = classifier();
        let mut accel = SyntheticAccel::new();

        accel.tap = TapEvent::Single(TapAxis::X);
        accel.queue_repeated(sample_with_magnitude(0.5), 4);
        c.poll(&mut accel, 0);
        assert!(c.tapped());

        // Orchestrator consumes the tap, then violent motion arrives within
        // the 500 ms lockout: shake must not fire.
        c.set(MotionKind::Tapped, false);
        let mut accel2 = SyntheticAccel::new();
        settle(&mut c, &mut accel2, 9.5, 10);
        assert!(!c.shaking());

        // After the lockout expires it fires normally.
        accel2.queue_repeated(sample_with_magnitude(9.5), 5);
        c.poll(&mut accel2, 700);
        assert!(c.shaking());
    }

    #[test]
    fn z_axis_taps_are_ignored() {
        let mut c = classifier();
        let mut accel = SyntheticAccel::new();
        accel.tap = TapEvent::Double(TapAxis::Z);
        accel.queue_repeated(sample_with_magnitude(0.2), 4);
        c.poll(&mut accel, 0);
        assert!(!c.tapped() && !c.double_tapped());

        accel.tap = TapEvent::Double(TapAxis::Y);
        accel.queue_repeated(sample_with_magnitude(0.2), 4);
        c.poll(&mut accel, 10);
        assert!(c.double_tapped());
    }

    #[test]
    fn sudden_acceleration_needs_magnitude_and_change() {
        let mut c = classifier();
        let mut accel = SyntheticAccel::new();
        // Rest, then a firm jerk: magnitude over 6 with a delta over 4, but
        // the batch average stays below the shake threshold.
        settle(&mut c, &mut accel, 0.3, 0);
        accel.queue_repeated(sample_with_magnitude(7.0), 20);
        c.poll(&mut accel, 1000);
        assert!(!c.shaking());
        assert!(c.sudden_acceleration());

        // Steady magnitude (delta ~0) must not re-fire once consumed.
        c.set(MotionKind::SuddenAcceleration, false);
        settle(&mut c, &mut accel, 7.0, 2000);
        accel.queue_repeated(sample_with_magnitude(7.0), 8);
        c.poll(&mut accel, 5000);
        assert!(!c.sudden_acceleration());
    }

    #[test]
    fn sudden_acceleration_locked_out_after_tap() {
        let mut c = classifier();
        let mut accel = SyntheticAccel::new();
        accel.tap = TapEvent::Single(TapAxis::Y);
        accel.queue_repeated(sample_with_magnitude(0.2), 4);
        c.poll(&mut accel, 0); // arms the 600 ms lockout
        c.set(MotionKind::Tapped, false);

        accel.queue_repeated(sample_with_magnitude(60.0), 8);
        c.poll(&mut accel, 300);
        assert!(!c.sudden_acceleration(), "within accel lockout");
    }

    #[test]
    fn tilt_monotonicity_boundaries() {
        let cases = [
            (4.1, false, false), // below half tilt
            (4.2, true, false),  // half-tilt boundary inclusive
            (8.9, true, false),  // still half tilt
            (9.0, false, true),  // full-tilt boundary inclusive
            (9.5, false, true),
        ];
        // Single-sample batches keep the average bit-exact at the boundary.
        for (y, half, full) in cases {
            let mut c = classifier();
            let mut accel = SyntheticAccel::new();
            accel.queue_batch(vec![SensorSample::new(0.0, y, 3.0)]);
            c.poll(&mut accel, 0);
            assert_eq!(c.half_tilted_right(), half, "y={y}");
            assert_eq!(c.tilted_right(), full, "y={y}");

            // Mirror image on the left side.
            let mut c = classifier();
            let mut accel = SyntheticAccel::new();
            accel.queue_batch(vec![SensorSample::new(0.0, -y, 3.0)]);
            c.poll(&mut accel, 0);
            assert_eq!(c.half_tilted_left(), half, "y=-{y}");
            assert_eq!(c.tilted_left(), full, "y=-{y}");
        }
    }

    #[test]
    fn upside_down_beats_tilt() {
        let mut c = classifier();
        let mut accel = SyntheticAccel::new();
        accel.queue_repeated(SensorSample::new(0.0, 9.5, -9.0), 5);
        c.poll(&mut accel, 0);
        assert!(c.upside_down());
        assert!(!c.tilted_right(), "orientation flags are exclusive");
    }

    #[test]
    fn orientation_clears_when_level() {
        let mut c = classifier();
        let mut accel = SyntheticAccel::new();
        accel.queue_repeated(SensorSample::new(0.0, 9.5, 3.0), 5);
        c.poll(&mut accel, 0);
        assert!(c.tilted_right());

        accel.queue_repeated(SensorSample::new(0.0, 0.0, G), 5);
        c.poll(&mut accel, 10);
        assert!(!c.oriented());
    }

    #[test]
    fn deep_sleep_candidate_then_one_shot_request() {
        let mut c = classifier();
        let mut accel = SyntheticAccel::new();
        let still = SensorSample::new(0.0, 0.0, G);

        // Scenario E: sustained stillness for 90 s.
        accel.queue_repeated(still, 4);
        c.poll(&mut accel, 0);
        assert!(!c.deep_sleep());

        accel.queue_repeated(still, 4);
        c.poll(&mut accel, 90_000);
        assert!(c.deep_sleep(), "candidate flag after 90 s");
        assert!(!c.take_deep_sleep_request(), "grace not yet elapsed");

        // +20 s grace → routine requested exactly once.
        accel.queue_repeated(still, 4);
        c.poll(&mut accel, 110_000);
        assert!(c.take_deep_sleep_request());

        accel.queue_repeated(still, 4);
        c.poll(&mut accel, 111_000);
        assert!(!c.take_deep_sleep_request(), "request is one-shot");
    }

    #[test]
    fn activity_resets_deep_sleep_tracking() {
        let mut c = classifier();
        let mut accel = SyntheticAccel::new();
        let still = SensorSample::new(0.0, 0.0, G);

        accel.queue_repeated(still, 4);
        c.poll(&mut accel, 0);
        accel.queue_repeated(still, 4);
        c.poll(&mut accel, 90_000);
        assert!(c.deep_sleep());

        // Movement clears the candidate and restarts the episode.
        settle(&mut c, &mut accel, 3.0, 90_100);
        assert!(!c.deep_sleep());
    }

    #[test]
    fn idle_timers_dim_then_sleep() {
        let mut c = classifier();
        let mut accel = SyntheticAccel::new();
        let still = SensorSample::new(0.0, 0.0, G);

        // Movement first, to anchor the activity timestamp.
        settle(&mut c, &mut accel, 3.0, 1_000);
        assert_eq!(c.take_dim_request(), Some(DimRequest::Wake));

        // Let the smoothed magnitude decay below the idle threshold right
        // after the burst, so the idle anchor stays at ~2 s.
        for i in 0..10 {
            accel.queue_repeated(still, 4);
            c.poll(&mut accel, 2_000 + i);
        }
        c.take_dim_request(); // drop any Wake raised during the decay tail

        accel.queue_repeated(still, 4);
        c.poll(&mut accel, 30 * 60 * 1000 + 3_000);
        assert_eq!(c.take_dim_request(), Some(DimRequest::Dim));
        assert!(!c.sleep(), "dim comes before idle sleep");

        accel.queue_repeated(still, 4);
        c.poll(&mut accel, 60 * 60 * 1000 + 3_000);
        assert!(c.sleep());

        // Movement wakes the display and clears SLEEP.
        settle(&mut c, &mut accel, 3.0, 60 * 60 * 1000 + 4_000);
        assert!(!c.sleep());
        assert_eq!(c.take_dim_request(), Some(DimRequest::Wake));
    }

    #[test]
    fn disabled_sensor_is_a_safe_noop() {
        let mut c = classifier();
        let mut accel = SyntheticAccel::new();
        accel.enabled = false;
        accel.tap = TapEvent::Single(TapAxis::X);
        accel.queue_repeated(sample_with_magnitude(20.0), 8);
        c.poll(&mut accel, 0);
        assert_eq!(*c.flags(), MotionFlags::new());
    }

    #[test]
    fn empty_fifo_preserves_prior_flags() {
        let mut c = classifier();
        let mut accel = SyntheticAccel::new();
        accel.tap = TapEvent::Single(TapAxis::X);
        accel.queue_repeated(sample_with_magnitude(0.2), 4);
        c.poll(&mut accel, 0);
        assert!(c.tapped());

        // No batches queued → available_samples() == 0 → no-op.
        c.poll(&mut accel, 10);
        assert!(c.tapped());
    }
}
