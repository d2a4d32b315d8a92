// PixelPal — Hardware & Tuning Configuration
// Target: ESP32-S3 mini board, ADXL345 accelerometer, SSD1351 display

// ---------------------------------------------------------------------------
// GPIO Pin Definitions
// ---------------------------------------------------------------------------
pub const PIN_ADXL_INT: i32 = 1; // D1 — ADXL345 INT1 (tap interrupts, level polled)
pub const PIN_I2C_SDA: i32 = 4;  // D4 — I2C data line
pub const PIN_I2C_SCL: i32 = 5;  // D5 — I2C clock line

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_ADDR_ADXL345: u8 = 0x53;
pub const I2C_ADDR_ADXL345_ALT: u8 = 0x1D;
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks

// ---------------------------------------------------------------------------
// Motion thresholds (m/s²)
// ---------------------------------------------------------------------------
pub const SHAKE_THRESHOLD: f32 = 8.0;
pub const INACTIVITY_THRESHOLD: f32 = 1.5;
pub const TILT_THRESHOLD: f32 = 9.0;
pub const HALF_TILT_THRESHOLD: f32 = 4.2; // about half of full tilt
pub const FLIP_THRESHOLD: f32 = -8.0;
pub const ACCELERATION_THRESHOLD: f32 = 6.0;
pub const ACCELERATION_CHANGE_THRESHOLD: f32 = 4.0; // change between readings

/// Gravity value the thresholds were tuned against.
pub const GRAVITY_MS2: f32 = 9.80665;
/// Exponential smoothing factor for the combined magnitude.
pub const MAGNITUDE_SMOOTHING: f32 = 0.1;

// ---------------------------------------------------------------------------
// Motion timing (milliseconds)
// ---------------------------------------------------------------------------
pub const TAP_LOCKOUT_MS: u32 = 500;   // tap suppresses shake for this long
pub const ACCEL_LOCKOUT_MS: u32 = 600; // tap/shake suppress sudden accel
pub const DOUBLE_TAP_WINDOW_MS: u32 = 250;
pub const DOUBLE_TAP_LATENCY_MS: u32 = 100;
pub const TAP_DURATION_MS: u32 = 30;

pub const INACTIVITY_TIMEOUT_MS: u32 = 90_000;   // stillness before DEEP_SLEEP flag
pub const DEEP_SLEEP_GRACE_MS: u32 = 20_000;     // further grace before sleep entry
pub const DISPLAY_DIM_TIMEOUT_MS: u32 = 30 * 60 * 1000; // 30 min → dim
pub const IDLE_SLEEP_TIMEOUT_MS: u32 = 60 * 60 * 1000;  // +30 min → SLEEP flag
pub const DISPLAY_WAKE_DEBOUNCE_MS: u32 = 200;

/// Empirically tuned lockout/window magnitudes, overridable for tests and
/// per-device tweaking. Defaults mirror the flat constants above.
#[derive(Debug, Clone, Copy)]
pub struct MotionTuning {
    pub tap_lockout_ms: u32,
    pub accel_lockout_ms: u32,
    pub inactivity_timeout_ms: u32,
    pub deep_sleep_grace_ms: u32,
    pub dim_timeout_ms: u32,
    pub idle_sleep_timeout_ms: u32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            tap_lockout_ms: TAP_LOCKOUT_MS,
            accel_lockout_ms: ACCEL_LOCKOUT_MS,
            inactivity_timeout_ms: INACTIVITY_TIMEOUT_MS,
            deep_sleep_grace_ms: DEEP_SLEEP_GRACE_MS,
            dim_timeout_ms: DISPLAY_DIM_TIMEOUT_MS,
            idle_sleep_timeout_ms: IDLE_SLEEP_TIMEOUT_MS,
        }
    }
}

// ---------------------------------------------------------------------------
// Playback timing
// ---------------------------------------------------------------------------
pub const FRAME_DELAY_MS: u32 = 62;            // native clip rate is 16 FPS
pub const INTERACTION_CHECK_MS: u32 = 10;      // re-poll interval inside playback
pub const PLAYBACK_WATCHDOG_MS: u32 = 10_000;  // force-abort stuck clips

// ---------------------------------------------------------------------------
// Animation sequence timing
// ---------------------------------------------------------------------------
pub const SEQUENCE_STATE_DELAY_MS: u32 = 3_000;  // dwell between cycle emotes
pub const SEQUENCE_IDLE_DELAY_MS: u32 = 20_000;  // rest dwell before restarting
pub const COMS_CHECK_INTERVAL_MS: u32 = 20_000;  // unpaired "searching" nudge

// ---------------------------------------------------------------------------
// Pairing protocol
// ---------------------------------------------------------------------------
/// Application signature; frames that don't carry it are dropped.
pub const APP_SIGNATURE: u32 = 0xCAFE_2025;

pub const STATUS_INTERVAL_MS: u32 = 6_000;
pub const MESSAGE_INTERVAL_MS: u32 = 4_000;
pub const DISCOVERY_INTERVAL_MS: u32 = 1_000;
pub const TOGGLE_DEBOUNCE_MS: u32 = 5_000;

pub const MAX_SEND_FAILURES: u32 = 4;
pub const MAX_BROADCAST_ATTEMPTS: u32 = 30;

/// Jitter applied before an active-sender conversation transmit.
pub const SEND_JITTER_MIN_MS: u32 = 100;
pub const SEND_JITTER_MAX_MS: u32 = 500;

/// Capacity of the radio callback → poll loop event channel. Callbacks only
/// ever `try_send`; overflow drops the event rather than blocking.
pub const RADIO_EVENT_QUEUE: usize = 8;

#[derive(Debug, Clone, Copy)]
pub struct ComsTuning {
    pub status_interval_ms: u32,
    pub message_interval_ms: u32,
    pub discovery_interval_ms: u32,
    pub toggle_debounce_ms: u32,
    pub max_send_failures: u32,
    pub max_broadcast_attempts: u32,
}

impl Default for ComsTuning {
    fn default() -> Self {
        Self {
            status_interval_ms: STATUS_INTERVAL_MS,
            message_interval_ms: MESSAGE_INTERVAL_MS,
            discovery_interval_ms: DISCOVERY_INTERVAL_MS,
            toggle_debounce_ms: TOGGLE_DEBOUNCE_MS,
            max_send_failures: MAX_SEND_FAILURES,
            max_broadcast_attempts: MAX_BROADCAST_ATTEMPTS,
        }
    }
}
