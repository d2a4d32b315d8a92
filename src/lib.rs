// PixelPal — Interactive Toy Firmware Core
//
// The three coupled subsystems live here, hardware-free and host-testable:
//   - `motion`    classifies accelerometer batches into motion flags
//   - `animation` orchestrates clip playback around those flags
//   - `pairing`   runs peer discovery and the round-robin conversation
//
// Hardware bindings (I2C accelerometer, ESP-NOW radio, SPIFFS clip player)
// are confined to `drivers` and only build for the ESP-IDF target.

pub mod animation;
pub mod clock;
pub mod config;
pub mod motion;
pub mod pairing;

#[cfg(target_os = "espidf")]
pub mod drivers;

/// Operating mode reported by the outer application (menu/OTA layer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemMode {
    /// Normal interactive operation.
    Normal,
    /// Configuration / firmware-update mode; animations stand down.
    Config,
}

/// Narrow view of the mode/menu collaborator the core polls each tick.
pub trait ModeControl {
    fn current_mode(&self) -> SystemMode;
    fn is_menu_active(&self) -> bool;
}
