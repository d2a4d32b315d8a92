// PixelPal — Hardware Bindings (ESP-IDF)
//
// Everything that touches the ESP-IDF lives here: the ADXL345 register
// driver, the ESP-NOW radio binding, the SPIFFS clip player, and deep-sleep
// entry. The core modules only see these through their traits.

pub mod adxl345;
pub mod espnow;
pub mod playback;
pub mod power;
