// PixelPal — Firmware Entry Point
//
// Boot sequence:
//   1. Bring up logging, I2C, Wi-Fi (STA, for ESP-NOW) and SPIFFS.
//   2. Initialise the ADXL345 (3 retries, degrades to motion-disabled).
//   3. Start the pairing radio and play the startup clip.
//   4. Run the cooperative loop: communication → motion poll → emotes.
//
// The device enters deep sleep when the motion classifier reports the
// inactivity timeout; a tap on the case wakes it back up.

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    firmware::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    println!("pixelpal firmware targets ESP-IDF; run `cargo test` to exercise the core on the host");
}

#[cfg(target_os = "espidf")]
mod firmware {
    use std::sync::mpsc::sync_channel;
    use std::sync::Mutex;

    use esp_idf_hal::delay::FreeRtos;
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::prelude::*;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::{ClientConfiguration, Configuration, EspWifi};

    use pixelpal::animation::{Ctx, Orchestrator};
    use pixelpal::clock::Clock;
    use pixelpal::config::{ComsTuning, RADIO_EVENT_QUEUE};
    use pixelpal::drivers::adxl345::Adxl345;
    use pixelpal::drivers::espnow::EspNowRadio;
    use pixelpal::drivers::playback::SpiffsPlayer;
    use pixelpal::drivers::power;
    use pixelpal::motion::MotionClassifier;
    use pixelpal::pairing::PairingProtocol;
    use pixelpal::{ModeControl, SystemMode};

    // -----------------------------------------------------------------------
    // Clock over the esp timer (wraps at ~49 days, fine for timeouts)
    // -----------------------------------------------------------------------
    struct EspClock;

    impl Clock for EspClock {
        fn now_ms(&self) -> u32 {
            unsafe { (esp_idf_sys::esp_timer_get_time() / 1000) as u32 }
        }

        fn sleep_ms(&self, ms: u32) {
            FreeRtos::delay_ms(ms);
        }
    }

    /// Mode source until the menu/OTA layer lands; the toy runs in normal
    /// interactive mode the whole time.
    struct AlwaysNormal;

    impl ModeControl for AlwaysNormal {
        fn current_mode(&self) -> SystemMode {
            SystemMode::Normal
        }

        fn is_menu_active(&self) -> bool {
            false
        }
    }

    pub fn run() -> anyhow::Result<()> {
        esp_idf_svc::sys::link_patches();
        esp_idf_svc::log::EspLogger::initialize_default();
        log::info!("pixelpal firmware starting");
        power::log_wake_cause();

        let peripherals = Peripherals::take()?;
        let clock = EspClock;

        // ---- I2C bus (shared with the display driver) ---------------------
        let i2c_config = I2cConfig::new().baudrate(400u32.kHz().into());
        let i2c: I2cDriver<'static> = I2cDriver::new(
            peripherals.i2c0,
            peripherals.pins.gpio4, // SDA
            peripherals.pins.gpio5, // SCL
            &i2c_config,
        )?;
        let i2c_bus: &'static Mutex<I2cDriver<'static>> = Box::leak(Box::new(Mutex::new(i2c)));

        // ---- Wi-Fi in STA mode; ESP-NOW rides on the started driver -------
        let sysloop = EspSystemEventLoop::take()?;
        let nvs = EspDefaultNvsPartition::take()?;
        let mut wifi = EspWifi::new(peripherals.modem, sysloop, Some(nvs))?;
        wifi.set_configuration(&Configuration::Client(ClientConfiguration::default()))?;
        wifi.start()?;
        Box::leak(Box::new(wifi));

        // ---- Sensors and assets -------------------------------------------
        let mut accel = Adxl345::new(i2c_bus);
        accel.init(); // degrades to motion-disabled on failure
        let mut motion = MotionClassifier::default();

        let mut player = SpiffsPlayer::mount()?;

        let (radio_tx, radio_rx) = sync_channel(RADIO_EVENT_QUEUE);
        let radio = EspNowRadio::new(radio_tx);
        let seed = unsafe { esp_idf_sys::esp_random() } as u64;
        let mut pairing =
            PairingProtocol::new(Box::new(radio), radio_rx, ComsTuning::default(), seed);
        if let Err(err) = pairing.start() {
            log::error!("pairing radio unavailable: {err:#}");
        }

        let mut orch = Orchestrator::new(seed);
        let mode = AlwaysNormal;

        {
            let mut ctx = Ctx {
                clock: &clock,
                player: &mut player,
                accel: &mut accel,
                motion: &mut motion,
                pairing: &mut pairing,
                mode: &mode,
            };
            orch.play_boot_animation(&mut ctx);
        }
        log::info!("boot complete, entering main loop");

        // ---- Cooperative main loop ----------------------------------------
        loop {
            let oriented = motion.oriented();
            pairing.handle_communication(&clock, oriented);

            motion.poll(&mut accel, clock.now_ms());
            if let Some(request) = motion.take_dim_request() {
                // Forwarded to the display driver once it lands.
                log::debug!("display brightness request: {request:?}");
            }

            {
                let mut ctx = Ctx {
                    clock: &clock,
                    player: &mut player,
                    accel: &mut accel,
                    motion: &mut motion,
                    pairing: &mut pairing,
                    mode: &mode,
                };
                orch.play_emotes(&mut ctx);
            }

            if motion.take_deep_sleep_request() {
                log::info!("inactivity timeout, entering deep sleep");
                power::enter_deep_sleep(&accel);
            }

            clock.sleep_ms(10);
        }
    }
}
