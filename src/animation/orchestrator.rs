// PixelPal — Emote Orchestrator
//
// Single-threaded decision ladder run once per main-loop tick. Special
// states (pairing toggles, deep sleep, one-shot interactions, crash, sleep)
// preempt everything; a paired device renders the conversation; otherwise
// the rest/cycle/rest sequence fills the idle time.

use log::error;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use super::emotes;
use super::playback::{run_clip, AbortReason, ClipPlayer, Tick};
use super::pool::ShufflePool;
use crate::clock::{elapsed_ms, Clock};
use crate::config::{COMS_CHECK_INTERVAL_MS, SEQUENCE_IDLE_DELAY_MS, SEQUENCE_STATE_DELAY_MS};
use crate::motion::{AccelSource, Interaction, MotionClassifier, MotionKind};
use crate::pairing::{ComState, PairingProtocol};
use crate::{ModeControl, SystemMode};

/// Crash reaction to a sustained full tilt or flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashState {
    None,
    EnteringCrash,
    Crashed,
    Recovering,
}

/// Sleep reaction to long idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepState {
    None,
    Entering,
    Asleep,
    Waking,
}

/// Phase of the normal rest/cycle/rest sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencePhase {
    RestStart,
    AnimationCycle,
    RestEnd,
}

/// Collaborators the orchestrator works against for one tick.
pub struct Ctx<'a> {
    pub clock: &'a dyn Clock,
    pub player: &'a mut dyn ClipPlayer,
    pub accel: &'a mut dyn AccelSource,
    pub motion: &'a mut MotionClassifier,
    pub pairing: &'a mut PairingProtocol,
    pub mode: &'a dyn ModeControl,
}

pub struct Orchestrator {
    phase: SequencePhase,
    phase_started: u32,
    /// Alternates the cycle between the idle and active pools.
    idle_turn: bool,
    crash: CrashState,
    was_crashed: bool,
    sleep: SleepState,
    was_asleep: bool,
    idle_pool: ShufflePool,
    active_pool: ShufflePool,
    rng: SmallRng,
    last_coms_check: u32,
}

/// Play one clip, re-polling motion and checking for interruptions between
/// frames. Crash and shock clips keep playing through orientation changes so
/// the crash sequence can't cancel itself.
fn play_interruptible(ctx: &mut Ctx, path: &str) -> bool {
    let Ctx {
        clock,
        player,
        accel,
        motion,
        pairing,
        mode,
    } = ctx;
    let survives_orientation = matches!(
        path,
        emotes::CRASH_IMPACT | emotes::CRASH_LOOP | emotes::SHOCK
    );
    run_clip(&mut **player, *clock, path, |now| {
        motion.poll(&mut **accel, now);
        if mode.is_menu_active() {
            return Tick::Abort(AbortReason::MenuActive);
        }
        if mode.current_mode() == SystemMode::Config {
            return Tick::Abort(AbortReason::ConfigMode);
        }
        if pairing.toggled_state() {
            return Tick::Abort(AbortReason::PairingToggled);
        }
        if motion.interacted() {
            return Tick::Abort(AbortReason::Interaction);
        }
        if !survives_orientation && motion.flags().fully_oriented() {
            return Tick::Abort(AbortReason::Orientation);
        }
        Tick::Continue
    })
}

impl Orchestrator {
    pub fn new(seed: u64) -> Self {
        Self {
            phase: SequencePhase::RestStart,
            phase_started: 0,
            idle_turn: true,
            crash: CrashState::None,
            was_crashed: false,
            sleep: SleepState::None,
            was_asleep: false,
            idle_pool: ShufflePool::new(emotes::IDLE_EMOTES),
            active_pool: ShufflePool::new(emotes::ACTIVE_EMOTES),
            rng: SmallRng::seed_from_u64(seed),
            last_coms_check: 0,
        }
    }

    pub fn phase(&self) -> SequencePhase {
        self.phase
    }

    pub fn crash_state(&self) -> CrashState {
        self.crash
    }

    pub fn sleep_state(&self) -> SleepState {
        self.sleep
    }

    pub fn play_boot_animation(&mut self, ctx: &mut Ctx) {
        play_interruptible(ctx, emotes::STARTUP);
    }

    /// One orchestration tick: pick and play at most one clip.
    pub fn play_emotes(&mut self, ctx: &mut Ctx) {
        if ctx.mode.current_mode() == SystemMode::Config || ctx.mode.is_menu_active() {
            return;
        }
        if !ctx.player.is_ready() {
            error!("animation: clip player not ready");
            return;
        }
        if self.handle_special_states(ctx) {
            return;
        }

        // Periodic "searching" nudge while discoverable but unpaired.
        let now = ctx.clock.now_ms();
        if self.phase == SequencePhase::AnimationCycle
            && elapsed_ms(now, self.last_coms_check) >= COMS_CHECK_INTERVAL_MS
        {
            self.last_coms_check = now;
            if ctx.pairing.radio_on() && !ctx.pairing.is_paired() {
                play_interruptible(ctx, emotes::COMS_CONNECT);
                return;
            }
        }

        if ctx.pairing.is_paired() {
            match ctx.pairing.com_state() {
                ComState::Processing => {
                    if let Some(path) = ctx.pairing.current_clip() {
                        play_interruptible(ctx, path);
                        ctx.pairing.clip_played();
                    }
                }
                ComState::Waiting => {
                    play_interruptible(ctx, emotes::COMS_IDLE);
                }
                ComState::None => {}
            }
            return;
        }

        ctx.pairing.reset_animation_path();
        self.advance_sequence(ctx);
    }

    fn handle_special_states(&mut self, ctx: &mut Ctx) -> bool {
        if ctx.pairing.toggled_state() {
            ctx.pairing.reset_toggle();
            let clip = if ctx.pairing.radio_on() {
                emotes::COMS_CONNECT
            } else {
                emotes::COMS_DISCONNECT
            };
            play_interruptible(ctx, clip);
            return true;
        }

        if ctx.motion.deep_sleep() {
            // Power-down is handled by the main loop; just blank playback.
            ctx.motion.set(MotionKind::DeepSleep, false);
            ctx.player.stop();
            return true;
        }

        if let Some(interaction) = ctx.motion.interaction() {
            match interaction {
                Interaction::Shake => {
                    ctx.motion.set(MotionKind::Shaking, false);
                    play_interruptible(ctx, emotes::DIZZY);
                }
                Interaction::DoubleTap => {
                    ctx.motion.set(MotionKind::DoubleTapped, false);
                    play_interruptible(ctx, emotes::SHOCK);
                }
                Interaction::Tap => {
                    ctx.motion.set(MotionKind::Tapped, false);
                    play_interruptible(ctx, emotes::TAP);
                }
                Interaction::SuddenAcceleration => {
                    ctx.motion.set(MotionKind::SuddenAcceleration, false);
                    play_interruptible(ctx, emotes::STARTLED);
                }
                // Half tilt clears itself when the device levels out.
                Interaction::HalfTiltShock => {
                    play_interruptible(ctx, emotes::SHOCK);
                }
            }
            return true;
        }

        if self.check_crash(ctx) {
            return true;
        }
        if self.handle_sleep(ctx) {
            return true;
        }
        false
    }

    fn check_crash(&mut self, ctx: &mut Ctx) -> bool {
        if ctx.motion.flags().fully_oriented() {
            match self.crash {
                CrashState::None => {
                    self.crash = CrashState::EnteringCrash;
                    play_interruptible(ctx, emotes::CRASH_IMPACT);
                    self.crash = CrashState::Crashed;
                    self.was_crashed = true;
                    true
                }
                CrashState::Crashed => {
                    play_interruptible(ctx, emotes::CRASH_LOOP);
                    true
                }
                _ => false,
            }
        } else if self.was_crashed {
            self.crash = CrashState::Recovering;
            play_interruptible(ctx, emotes::CRASH_RECOVER);
            self.crash = CrashState::None;
            self.was_crashed = false;
            true
        } else {
            false
        }
    }

    fn handle_sleep(&mut self, ctx: &mut Ctx) -> bool {
        if ctx.motion.sleep() {
            match self.sleep {
                SleepState::None => {
                    self.sleep = SleepState::Entering;
                    play_interruptible(ctx, emotes::SLEEP_ENTER);
                    self.sleep = SleepState::Asleep;
                    self.was_asleep = true;
                    true
                }
                SleepState::Asleep => {
                    play_interruptible(ctx, emotes::SLEEP_LOOP);
                    true
                }
                _ => false,
            }
        } else if self.was_asleep {
            self.sleep = SleepState::Waking;
            play_interruptible(ctx, emotes::SLEEP_WAKE);
            self.sleep = SleepState::None;
            self.was_asleep = false;
            true
        } else {
            false
        }
    }

    fn advance_sequence(&mut self, ctx: &mut Ctx) {
        match self.phase {
            SequencePhase::RestStart => {
                play_interruptible(ctx, emotes::WINK);
                self.phase = SequencePhase::AnimationCycle;
                self.phase_started = ctx.clock.now_ms();
            }
            SequencePhase::AnimationCycle => {
                let now = ctx.clock.now_ms();
                if elapsed_ms(now, self.phase_started) >= SEQUENCE_STATE_DELAY_MS {
                    let path = if self.idle_turn {
                        self.idle_pool.draw(&mut self.rng)
                    } else {
                        self.active_pool.draw(&mut self.rng)
                    };
                    play_interruptible(ctx, path);
                    self.idle_turn = !self.idle_turn;
                    // One idle/active alternation per cycle, then rest.
                    if self.idle_turn {
                        self.phase = SequencePhase::RestEnd;
                        self.phase_started = ctx.clock.now_ms();
                    }
                }
            }
            SequencePhase::RestEnd => {
                play_interruptible(ctx, emotes::BLINK);
                if elapsed_ms(ctx.clock.now_ms(), self.phase_started) >= SEQUENCE_IDLE_DELAY_MS {
                    self.phase = SequencePhase::RestStart;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::sync_channel;

    use super::*;
    use crate::config::{ComsTuning, RADIO_EVENT_QUEUE};
    use crate::motion::{SensorSample, TapAxis, TapEvent};
    use crate::pairing::{Mac, Message, RadioEvent};
    use crate::pairing::ConversationType;
    use crate::testutil::{FakeClock, FakeRadio, FixedMode, ScriptedPlayer, SyntheticAccel};

    const OWN_MAC: Mac = [0x02, 0, 0, 0, 0, 0x09];
    const PEER_MAC: Mac = [0x01, 0, 0, 0, 0, 0x08];

    struct Harness {
        clock: FakeClock,
        player: ScriptedPlayer,
        accel: SyntheticAccel,
        motion: MotionClassifier,
        pairing: PairingProtocol,
        tx: std::sync::mpsc::SyncSender<RadioEvent>,
        mode: FixedMode,
    }

    impl Harness {
        fn new() -> Self {
            let (tx, rx) = sync_channel(RADIO_EVENT_QUEUE);
            let radio = FakeRadio::new(OWN_MAC);
            let pairing = PairingProtocol::new(Box::new(radio), rx, ComsTuning::default(), 9);
            Self {
                clock: FakeClock::new(),
                player: ScriptedPlayer::new(),
                accel: SyntheticAccel::new(),
                motion: MotionClassifier::default(),
                pairing,
                tx,
                mode: FixedMode::normal(),
            }
        }

        fn tick(&mut self, orch: &mut Orchestrator) {
            let mut ctx = Ctx {
                clock: &self.clock,
                player: &mut self.player,
                accel: &mut self.accel,
                motion: &mut self.motion,
                pairing: &mut self.pairing,
                mode: &self.mode,
            };
            orch.play_emotes(&mut ctx);
        }

        fn pair(&mut self) {
            self.pairing.start().unwrap();
            let wire = Message::new(PEER_MAC, "SEARCHING PEERS", ConversationType::Hello).encode();
            self.tx
                .send(RadioEvent::Received {
                    mac: PEER_MAC,
                    frame: crate::pairing::RadioFrame::from_slice(&wire),
                })
                .unwrap();
            self.pairing.handle_communication(&self.clock, false);
        }
    }

    #[test]
    fn shake_plays_dizzy_and_clears_the_flag() {
        let mut h = Harness::new();
        let mut orch = Orchestrator::new(1);
        h.motion.set(MotionKind::Shaking, true);

        h.tick(&mut orch);

        assert_eq!(h.player.played_paths(), vec![emotes::DIZZY]);
        assert!(!h.motion.shaking());
    }

    #[test]
    fn double_tap_outranks_tap_across_ticks() {
        let mut h = Harness::new();
        let mut orch = Orchestrator::new(1);
        h.motion.set(MotionKind::DoubleTapped, true);
        h.motion.set(MotionKind::Tapped, true);

        h.tick(&mut orch);
        h.tick(&mut orch);

        assert_eq!(h.player.played_paths(), vec![emotes::SHOCK, emotes::TAP]);
    }

    #[test]
    fn half_tilt_replays_shock_until_level() {
        let mut h = Harness::new();
        let mut orch = Orchestrator::new(1);
        h.motion.set(MotionKind::HalfTiltedLeft, true);

        h.tick(&mut orch);
        h.tick(&mut orch);
        assert_eq!(h.player.played_paths(), vec![emotes::SHOCK, emotes::SHOCK]);

        h.motion.set(MotionKind::HalfTiltedLeft, false);
        h.tick(&mut orch);
        assert_eq!(h.player.played_paths().len(), 3);
        assert_ne!(h.player.played_paths()[2], emotes::SHOCK);
    }

    #[test]
    fn crash_sequence_runs_impact_loop_recover() {
        let mut h = Harness::new();
        let mut orch = Orchestrator::new(1);
        h.motion.set(MotionKind::UpsideDown, true);

        h.tick(&mut orch);
        assert_eq!(orch.crash_state(), CrashState::Crashed);
        h.tick(&mut orch);

        h.motion.set(MotionKind::UpsideDown, false);
        h.tick(&mut orch);
        assert_eq!(orch.crash_state(), CrashState::None);

        assert_eq!(
            h.player.played_paths(),
            vec![emotes::CRASH_IMPACT, emotes::CRASH_LOOP, emotes::CRASH_RECOVER]
        );
    }

    #[test]
    fn sleep_sequence_runs_enter_loop_wake() {
        let mut h = Harness::new();
        let mut orch = Orchestrator::new(1);
        h.motion.set(MotionKind::Sleep, true);

        h.tick(&mut orch);
        h.tick(&mut orch);
        h.motion.set(MotionKind::Sleep, false);
        h.tick(&mut orch);

        assert_eq!(
            h.player.played_paths(),
            vec![emotes::SLEEP_ENTER, emotes::SLEEP_LOOP, emotes::SLEEP_WAKE]
        );
        assert_eq!(orch.sleep_state(), SleepState::None);
    }

    #[test]
    fn normal_sequence_alternates_pools_between_rests() {
        let mut h = Harness::new();
        let mut orch = Orchestrator::new(1);

        h.tick(&mut orch);
        assert_eq!(h.player.played_paths(), vec![emotes::WINK]);
        assert_eq!(orch.phase(), SequencePhase::AnimationCycle);

        // Dwell gate holds the next emote back.
        h.tick(&mut orch);
        assert_eq!(h.player.played_paths().len(), 1);

        h.clock.advance(3_000);
        h.tick(&mut orch);
        h.tick(&mut orch);
        let played = h.player.played_paths();
        assert!(emotes::IDLE_EMOTES.contains(&played[1].as_str()));
        assert!(emotes::ACTIVE_EMOTES.contains(&played[2].as_str()));
        assert_eq!(orch.phase(), SequencePhase::RestEnd);

        h.tick(&mut orch);
        assert_eq!(h.player.played_paths()[3], emotes::BLINK);
    }

    #[test]
    fn rest_end_holds_until_idle_delay_passes() {
        let mut h = Harness::new();
        let mut orch = Orchestrator::new(1);

        h.tick(&mut orch);
        h.clock.advance(3_000);
        h.tick(&mut orch);
        h.tick(&mut orch);
        assert_eq!(orch.phase(), SequencePhase::RestEnd);

        h.tick(&mut orch);
        assert_eq!(orch.phase(), SequencePhase::RestEnd);

        h.clock.advance(20_000);
        h.tick(&mut orch);
        assert_eq!(orch.phase(), SequencePhase::RestStart);
    }

    #[test]
    fn unpaired_radio_nudges_with_searching_clip() {
        let mut h = Harness::new();
        let mut orch = Orchestrator::new(1);
        h.pairing.start().unwrap();

        h.tick(&mut orch); // enters the cycle
        h.clock.advance(COMS_CHECK_INTERVAL_MS);
        h.tick(&mut orch);

        let played = h.player.played_paths();
        assert_eq!(played.last().unwrap(), emotes::COMS_CONNECT);
    }

    #[test]
    fn paired_device_renders_conversation_instead_of_cycle() {
        let mut h = Harness::new();
        let mut orch = Orchestrator::new(1);
        h.pair();
        assert!(h.pairing.is_paired());

        h.tick(&mut orch);
        assert_eq!(h.player.played_paths(), vec![emotes::COMS_HELLO]);
        assert_eq!(h.pairing.com_state(), ComState::Waiting);

        h.tick(&mut orch);
        assert_eq!(h.player.played_paths()[1], emotes::COMS_IDLE);
    }

    #[test]
    fn radio_toggle_plays_connect_and_disconnect_clips() {
        let mut h = Harness::new();
        let mut orch = Orchestrator::new(1);

        assert!(h.pairing.toggle(&h.clock));
        h.tick(&mut orch);
        assert_eq!(h.player.played_paths(), vec![emotes::COMS_CONNECT]);
        assert!(!h.pairing.toggled_state());

        h.clock.advance(6_000);
        assert!(h.pairing.toggle(&h.clock));
        h.tick(&mut orch);
        assert_eq!(h.player.played_paths()[1], emotes::COMS_DISCONNECT);
    }

    #[test]
    fn deep_sleep_flag_blanks_playback() {
        let mut h = Harness::new();
        let mut orch = Orchestrator::new(1);
        h.motion.set(MotionKind::DeepSleep, true);

        h.tick(&mut orch);

        assert!(h.player.played_paths().is_empty());
        assert!(!h.motion.deep_sleep());
    }

    #[test]
    fn deep_sleep_request_fires_while_emotes_keep_running() {
        let mut h = Harness::new();
        let mut orch = Orchestrator::new(1);
        let still = SensorSample::new(0.0, 0.0, crate::config::GRAVITY_MS2);

        // Cooperative loop shape: classify, render, then check for the
        // power-down request. Rendering clears the candidate flag every
        // tick, which must not restart the grace window.
        let mut fired = false;
        for _ in 0..30_000 {
            h.accel.queue_repeated(still, 1);
            let now = h.clock.now_ms();
            h.motion.poll(&mut h.accel, now);
            h.tick(&mut orch);
            if h.motion.take_deep_sleep_request() {
                fired = true;
                break;
            }
            h.clock.advance(10);
            if h.clock.now_ms() > 200_000 {
                break;
            }
        }

        assert!(fired, "power-down request must fire after 90 s + 20 s grace");
        assert!(h.clock.now_ms() >= 110_000);
    }

    #[test]
    fn config_mode_suppresses_all_animation() {
        let mut h = Harness::new();
        let mut orch = Orchestrator::new(1);
        h.mode.mode = SystemMode::Config;
        h.motion.set(MotionKind::Shaking, true);

        h.tick(&mut orch);

        assert!(h.player.played_paths().is_empty());
    }

    #[test]
    fn unready_player_plays_nothing() {
        let mut h = Harness::new();
        let mut orch = Orchestrator::new(1);
        h.player.ready = false;

        h.tick(&mut orch);

        assert!(h.player.played_paths().is_empty());
    }

    #[test]
    fn mid_clip_double_tap_aborts_and_wins_the_next_tick() {
        let mut h = Harness::new();
        let mut orch = Orchestrator::new(1);
        h.player.frames_per_clip = 500;
        h.accel.tap = TapEvent::Double(TapAxis::X);
        h.accel
            .queue_repeated(SensorSample::new(0.0, 0.0, 9.8), 4);

        h.tick(&mut orch);
        assert_eq!(h.player.played_paths(), vec![emotes::WINK]);
        assert!(h.motion.double_tapped());

        h.tick(&mut orch);
        assert_eq!(h.player.played_paths()[1], emotes::SHOCK);
    }
}
