// PixelPal — Animation Orchestration
//
// Turns motion flags, pairing state, and mode flags into exactly one clip at
// a time: special states preempt, crash and sleep run their own little
// machines, and the normal idle/active cycle fills the gaps.

pub mod emotes;
mod orchestrator;
mod playback;
mod pool;

pub use orchestrator::{Ctx, CrashState, Orchestrator, SequencePhase, SleepState};
pub use playback::{run_clip, AbortReason, ClipPlayer, Tick};
pub use pool::ShufflePool;
