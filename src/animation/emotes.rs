// PixelPal — Emote Asset Paths
//
// Clips live on the SPIFFS partition, 128x128 at 16 FPS.

pub const STARTUP: &str = "/gifs/startup.gif";

// One-shot interaction responses
pub const DIZZY: &str = "/gifs/dizzy.gif";
pub const SHOCK: &str = "/gifs/shock.gif";
pub const TAP: &str = "/gifs/tap.gif";
pub const STARTLED: &str = "/gifs/startled.gif";

// Crash sequence (sustained orientation)
pub const CRASH_IMPACT: &str = "/gifs/crash_01.gif";
pub const CRASH_LOOP: &str = "/gifs/crash_02.gif";
pub const CRASH_RECOVER: &str = "/gifs/crash_03.gif";

// Sleep sequence (idle dimming)
pub const SLEEP_ENTER: &str = "/gifs/sleep_01.gif";
pub const SLEEP_LOOP: &str = "/gifs/sleep_02.gif";
pub const SLEEP_WAKE: &str = "/gifs/sleep_03.gif";

// Normal cycle anchors
pub const WINK: &str = "/gifs/wink.gif";
pub const BLINK: &str = "/gifs/blink.gif";

/// Active emote pool, drawn shuffle-without-replacement.
pub const ACTIVE_EMOTES: &[&str] = &[
    "/gifs/wink_02.gif",
    "/gifs/zoned.gif",
    "/gifs/doubtful.gif",
    "/gifs/talk.gif",
    "/gifs/scan.gif",
    "/gifs/angry.gif",
    "/gifs/cry.gif",
    "/gifs/pixelated.gif",
    "/gifs/excited.gif",
    "/gifs/hearts.gif",
    "/gifs/uwu.gif",
    "/gifs/whistle.gif",
    "/gifs/glee.gif",
    "/gifs/mischief.gif",
    "/gifs/humsup.gif",
];

/// Idle emote pool.
pub const IDLE_EMOTES: &[&str] = &[
    "/gifs/rest.gif",
    "/gifs/idle.gif",
    "/gifs/look_down.gif",
    "/gifs/look_up.gif",
    "/gifs/look_left_right.gif",
];

// Pairing / conversation clips
pub const COMS_CONNECT: &str = "/gifs/coms_connect.gif";
pub const COMS_DISCONNECT: &str = "/gifs/coms_disconnect.gif";
pub const COMS_IDLE: &str = "/gifs/coms_idle.gif";
pub const COMS_HELLO: &str = "/gifs/coms_hello.gif";
pub const COMS_TALK_01: &str = "/gifs/coms_talk_01.gif";
pub const COMS_TALK_02: &str = "/gifs/coms_talk_02.gif";
pub const COMS_TALK_03: &str = "/gifs/coms_talk_03.gif";
pub const COMS_AGREE: &str = "/gifs/coms_agreed.gif";
pub const COMS_DISAGREE: &str = "/gifs/coms_disagree.gif";
pub const COMS_YELL: &str = "/gifs/coms_yell.gif";
pub const COMS_LAUGH: &str = "/gifs/coms_laugh.gif";
pub const COMS_WINK: &str = "/gifs/coms_wink.gif";
pub const COMS_ZONED: &str = "/gifs/coms_zoned.gif";
pub const COMS_SHOCK: &str = "/gifs/coms_shock.gif";
