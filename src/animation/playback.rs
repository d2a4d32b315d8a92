// PixelPal — Paced Clip Playback
//
// Blocking frame loop around a `ClipPlayer`. Frames are paced to 16 FPS and
// the interruption callback runs every 10 ms so a clip never blinds the
// device to taps, shakes, or pairing toggles for longer than that.

use log::{debug, error, warn};

use crate::clock::{elapsed_ms, Clock};
use crate::config::{FRAME_DELAY_MS, INTERACTION_CHECK_MS, PLAYBACK_WATCHDOG_MS};

/// Frame-level clip renderer. The SPIFFS-backed driver implements this on
/// target; tests substitute scripted players.
pub trait ClipPlayer {
    fn is_ready(&self) -> bool;
    /// Open a clip by asset path. `false` means the asset is missing or the
    /// decoder rejected it.
    fn load(&mut self, path: &str) -> bool;
    /// Render the next frame. `false` once the clip is finished.
    fn step_frame(&mut self) -> bool;
    /// Release the open clip, if any.
    fn stop(&mut self);
}

/// Why a clip was cut short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    MenuActive,
    ConfigMode,
    PairingToggled,
    Interaction,
    Orientation,
}

/// Verdict from the interruption callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Abort(AbortReason),
}

/// Play one clip to completion, pacing frames and polling `on_tick` for
/// interruptions. Returns `false` only when the clip failed to load; an
/// aborted clip still counts as played.
pub fn run_clip(
    player: &mut dyn ClipPlayer,
    clock: &dyn Clock,
    path: &str,
    mut on_tick: impl FnMut(u32) -> Tick,
) -> bool {
    if !player.load(path) {
        error!("playback: failed to load {path}");
        return false;
    }

    let start = clock.now_ms();
    let mut last_frame = start;
    // First interruption check happens on the first frame.
    let mut last_check = start.wrapping_sub(INTERACTION_CHECK_MS);

    while player.step_frame() {
        let now = clock.now_ms();
        let since_frame = elapsed_ms(now, last_frame);
        if since_frame < FRAME_DELAY_MS {
            clock.sleep_ms(FRAME_DELAY_MS - since_frame);
        }
        let now = clock.now_ms();
        last_frame = now;

        if elapsed_ms(now, last_check) >= INTERACTION_CHECK_MS {
            last_check = now;
            if let Tick::Abort(reason) = on_tick(now) {
                debug!("playback: {path} aborted ({reason:?})");
                player.stop();
                return true;
            }
        }

        if elapsed_ms(now, start) > PLAYBACK_WATCHDOG_MS {
            warn!("playback: watchdog tripped on {path}");
            break;
        }
    }

    player.stop();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{EndlessPlayer, FakeClock, ScriptedPlayer};

    #[test]
    fn plays_all_frames_and_returns_true() {
        let clock = FakeClock::new();
        let mut player = ScriptedPlayer::new();
        player.frames_per_clip = 5;

        let mut ticks = 0;
        let ok = run_clip(&mut player, &clock, "/gifs/idle.gif", |_| {
            ticks += 1;
            Tick::Continue
        });

        assert!(ok);
        assert_eq!(player.played_paths(), vec!["/gifs/idle.gif"]);
        assert!(ticks > 0);
    }

    #[test]
    fn load_failure_returns_false() {
        let clock = FakeClock::new();
        let mut player = ScriptedPlayer::new();
        player.fail_load = true;

        let ok = run_clip(&mut player, &clock, "/gifs/idle.gif", |_| Tick::Continue);
        assert!(!ok);
    }

    #[test]
    fn abort_stops_playback_early() {
        let clock = FakeClock::new();
        let mut player = ScriptedPlayer::new();
        player.frames_per_clip = 100;

        let mut ticks = 0;
        let ok = run_clip(&mut player, &clock, "/gifs/idle.gif", |_| {
            ticks += 1;
            if ticks >= 2 {
                Tick::Abort(AbortReason::Interaction)
            } else {
                Tick::Continue
            }
        });

        assert!(ok);
        assert_eq!(ticks, 2);
    }

    #[test]
    fn watchdog_bounds_a_stuck_clip() {
        let clock = FakeClock::new();
        let mut player = EndlessPlayer;

        let ok = run_clip(&mut player, &clock, "/gifs/idle.gif", |_| Tick::Continue);

        assert!(ok);
        assert!(elapsed_ms(clock.now_ms(), 0) <= PLAYBACK_WATCHDOG_MS + FRAME_DELAY_MS);
        assert!(elapsed_ms(clock.now_ms(), 0) > PLAYBACK_WATCHDOG_MS);
    }
}
