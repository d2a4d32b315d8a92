// PixelPal — Deep-Sleep Entry
//
// The ADXL345 keeps its tap interrupt armed through deep sleep, so a tap on
// the case wakes the device back up via EXT0 on the interrupt pin.

use esp_idf_hal::delay::FreeRtos;

use super::adxl345::Adxl345;
use crate::config::PIN_ADXL_INT;

/// Log why we woke up, if a wake cause is recorded.
pub fn log_wake_cause() {
    let cause = unsafe { esp_idf_sys::esp_sleep_get_wakeup_cause() };
    if cause == esp_idf_sys::esp_sleep_source_t_ESP_SLEEP_WAKEUP_EXT0 {
        log::info!("woke from deep sleep on motion interrupt");
    }
}

/// Enter deep sleep with motion-interrupt wakeup. Does not return.
pub fn enter_deep_sleep(accel: &Adxl345) -> ! {
    // Drop latched interrupts so a stale tap can't wake us immediately.
    accel.clear_interrupts();
    FreeRtos::delay_ms(100);

    unsafe {
        // Keep RTC peripherals powered so the interrupt line stays readable.
        esp_idf_sys::esp_sleep_pd_config(
            esp_idf_sys::esp_sleep_pd_domain_t_ESP_PD_DOMAIN_RTC_PERIPH,
            esp_idf_sys::esp_sleep_pd_option_t_ESP_PD_OPTION_ON,
        );
        esp_idf_sys::esp_sleep_enable_ext0_wakeup(PIN_ADXL_INT, 1);
        esp_idf_sys::esp_deep_sleep_start();
    }
    unreachable!("esp_deep_sleep_start never returns");
}
