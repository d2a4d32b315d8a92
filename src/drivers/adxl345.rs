// PixelPal — ADXL345 Accelerometer Driver
//
// Custom register-level driver over shared I2C bus.
// Avoids external crate version conflicts with esp-idf-hal.

use std::sync::Mutex;

use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::i2c::I2cDriver;

use crate::config::*;
use crate::motion::{AccelSource, SensorSample, TapAxis, TapEvent, MAX_FIFO_SAMPLES};

/// Thread-safe handle to a shared I2C bus.
pub type SharedBus = &'static Mutex<I2cDriver<'static>>;

// ADXL345 register addresses
const REG_DEVID: u8 = 0x00;
const REG_THRESH_TAP: u8 = 0x1D;
const REG_DUR: u8 = 0x21;
const REG_LATENT: u8 = 0x22;
const REG_WINDOW: u8 = 0x23;
const REG_TAP_AXES: u8 = 0x2A;
const REG_ACT_TAP_STATUS: u8 = 0x2B;
const REG_BW_RATE: u8 = 0x2C;
const REG_POWER_CTL: u8 = 0x2D;
const REG_INT_ENABLE: u8 = 0x2E;
const REG_INT_MAP: u8 = 0x2F;
const REG_INT_SOURCE: u8 = 0x30;
const REG_DATA_FORMAT: u8 = 0x31;
const REG_DATAX0: u8 = 0x32; // Start of 6-byte axis burst
const REG_FIFO_CTL: u8 = 0x38;
const REG_FIFO_STATUS: u8 = 0x39;

const DEVID_EXPECTED: u8 = 0xE5;

// INT_SOURCE bits
const INT_SINGLE_TAP: u8 = 0x40;
const INT_DOUBLE_TAP: u8 = 0x20;

// ACT_TAP_STATUS tap axis bits
const TAP_X: u8 = 0x04;
const TAP_Y: u8 = 0x02;

// Full-resolution mode: 4 mg/LSB on every range.
const LSB_TO_MS2: f32 = 0.004 * GRAVITY_MS2;

// Tap threshold 14 m/s² at 62.5 mg/LSB.
const THRESH_TAP_LSB: u8 = 23;
// DUR at 625 µs/LSB, LATENT/WINDOW at 1.25 ms/LSB.
const TAP_DUR_LSB: u8 = (TAP_DURATION_MS * 1000 / 625) as u8;
const TAP_LATENT_LSB: u8 = (DOUBLE_TAP_LATENCY_MS * 100 / 125) as u8;
const TAP_WINDOW_LSB: u8 = (DOUBLE_TAP_WINDOW_MS * 100 / 125) as u8;

pub struct Adxl345 {
    bus: SharedBus,
    addr: u8,
    enabled: bool,
}

impl Adxl345 {
    pub fn new(bus: SharedBus) -> Self {
        Self {
            bus,
            addr: I2C_ADDR_ADXL345,
            enabled: false,
        }
    }

    fn write_reg(&self, reg: u8, value: u8) -> anyhow::Result<()> {
        let mut bus = self.bus.lock().unwrap();
        bus.write(self.addr, &[reg, value], I2C_TIMEOUT_TICKS)?;
        Ok(())
    }

    fn read_reg(&self, reg: u8) -> anyhow::Result<u8> {
        let mut bus = self.bus.lock().unwrap();
        let mut buf = [0u8; 1];
        bus.write_read(self.addr, &[reg], &mut buf, I2C_TIMEOUT_TICKS)?;
        Ok(buf[0])
    }

    /// Look for the device ID at the configured address, then the alternate
    /// address (grounded vs floating SDO strap).
    fn probe(&mut self) -> bool {
        for addr in [I2C_ADDR_ADXL345, I2C_ADDR_ADXL345_ALT] {
            self.addr = addr;
            match self.read_reg(REG_DEVID) {
                Ok(DEVID_EXPECTED) => {
                    if addr != I2C_ADDR_ADXL345 {
                        log::warn!("ADXL345 found at alternate address {addr:#04x}, check wiring");
                    }
                    return true;
                }
                Ok(id) => log::warn!("unexpected device ID {id:#04x} at {addr:#04x}"),
                Err(_) => {}
            }
        }
        self.addr = I2C_ADDR_ADXL345;
        false
    }

    /// Initialize with retries. On failure the sensor stays disabled and
    /// every read degrades to a safe no-op.
    pub fn init(&mut self) -> bool {
        for attempt in 1..=3u8 {
            if self.probe() && self.configure().is_ok() {
                self.enabled = true;
                self.clear_interrupts();
                log::info!("ADXL345 initialised (±16g full-res, 100Hz, tap ints on INT1)");
                return true;
            }
            log::warn!("ADXL345 init attempt {attempt}/3 failed");
            FreeRtos::delay_ms(500);
        }
        log::error!("ADXL345 initialisation failed, motion detection disabled");
        self.enabled = false;
        false
    }

    fn configure(&self) -> anyhow::Result<()> {
        // 100 Hz output data rate
        self.write_reg(REG_BW_RATE, 0x0A)?;
        // Full resolution, ±16 g
        self.write_reg(REG_DATA_FORMAT, 0x0B)?;
        // Measurement mode
        self.write_reg(REG_POWER_CTL, 0x08)?;

        // Tap detection on all axes; interrupts masked while configuring.
        self.write_reg(REG_INT_ENABLE, 0x00)?;
        self.write_reg(REG_THRESH_TAP, THRESH_TAP_LSB)?;
        self.write_reg(REG_DUR, TAP_DUR_LSB)?;
        self.write_reg(REG_LATENT, TAP_LATENT_LSB)?;
        self.write_reg(REG_WINDOW, TAP_WINDOW_LSB)?;
        self.write_reg(REG_TAP_AXES, 0x0F)?;
        // Both tap interrupts on INT1
        self.write_reg(REG_INT_MAP, 0x00)?;
        self.write_reg(REG_INT_ENABLE, INT_SINGLE_TAP | INT_DOUBLE_TAP)?;

        // FIFO stream mode, watermark 16
        self.write_reg(REG_FIFO_CTL, 0x80 | 0x10)?;
        Ok(())
    }

    /// Read INT_SOURCE to drop any latched interrupts.
    pub fn clear_interrupts(&self) {
        if !self.enabled {
            return;
        }
        let _ = self.read_reg(REG_INT_SOURCE);
        let _ = self.read_reg(REG_INT_SOURCE);
    }
}

impl AccelSource for Adxl345 {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn available_samples(&mut self) -> u8 {
        if !self.enabled {
            return 0;
        }
        match self.read_reg(REG_FIFO_STATUS) {
            // Lower 6 bits hold the FIFO entry count.
            Ok(status) => (status & 0x3F).min(MAX_FIFO_SAMPLES as u8),
            Err(err) => {
                log::warn!("FIFO status read failed: {err:#}");
                0
            }
        }
    }

    fn read_sample(&mut self) -> SensorSample {
        if !self.enabled {
            return SensorSample::default();
        }
        let mut raw = [0u8; 6];
        let result = {
            let mut bus = self.bus.lock().unwrap();
            bus.write_read(self.addr, &[REG_DATAX0], &mut raw, I2C_TIMEOUT_TICKS)
        };
        if let Err(err) = result {
            log::warn!("sample read failed: {err:#}");
            return SensorSample::default();
        }
        SensorSample::new(
            i16::from_le_bytes([raw[0], raw[1]]) as f32 * LSB_TO_MS2,
            i16::from_le_bytes([raw[2], raw[3]]) as f32 * LSB_TO_MS2,
            i16::from_le_bytes([raw[4], raw[5]]) as f32 * LSB_TO_MS2,
        )
    }

    fn take_tap_event(&mut self) -> TapEvent {
        if !self.enabled {
            return TapEvent::None;
        }
        // Reading INT_SOURCE clears the latched tap bits.
        let source = match self.read_reg(REG_INT_SOURCE) {
            Ok(source) => source,
            Err(_) => return TapEvent::None,
        };
        if source & (INT_SINGLE_TAP | INT_DOUBLE_TAP) == 0 {
            return TapEvent::None;
        }
        let axis = match self.read_reg(REG_ACT_TAP_STATUS) {
            Ok(status) if status & TAP_X != 0 => TapAxis::X,
            Ok(status) if status & TAP_Y != 0 => TapAxis::Y,
            _ => TapAxis::Z,
        };
        if source & INT_DOUBLE_TAP != 0 {
            TapEvent::Double(axis)
        } else {
            TapEvent::Single(axis)
        }
    }
}
