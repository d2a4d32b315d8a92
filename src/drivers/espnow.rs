// PixelPal — ESP-NOW Radio Binding
//
// Thin adapter from the ESP-NOW callback API to the bounded event channel
// the protocol drains. Callbacks only copy a fixed-size frame and try_send;
// overflow drops the event instead of blocking the Wi-Fi task.

use std::sync::mpsc::SyncSender;

use esp_idf_svc::espnow::{EspNow, PeerInfo, SendStatus};

use crate::pairing::{Mac, Radio, RadioEvent, RadioFrame};

pub struct EspNowRadio {
    tx: SyncSender<RadioEvent>,
    espnow: Option<EspNow<'static>>,
}

impl EspNowRadio {
    pub fn new(tx: SyncSender<RadioEvent>) -> Self {
        Self { tx, espnow: None }
    }
}

impl Radio for EspNowRadio {
    fn init(&mut self) -> anyhow::Result<()> {
        let espnow = EspNow::take()?;

        let recv_tx = self.tx.clone();
        espnow.register_recv_cb(move |mac, data| {
            if mac.len() != 6 {
                return;
            }
            let mut addr: Mac = [0; 6];
            addr.copy_from_slice(mac);
            let _ = recv_tx.try_send(RadioEvent::Received {
                mac: addr,
                frame: RadioFrame::from_slice(data),
            });
        })?;

        let send_tx = self.tx.clone();
        espnow.register_send_cb(move |_mac, status| {
            let ok = matches!(status, SendStatus::SUCCESS);
            let _ = send_tx.try_send(RadioEvent::SendStatus { ok });
        })?;

        self.espnow = Some(espnow);
        Ok(())
    }

    fn deinit(&mut self) {
        // Dropping EspNow unregisters the callbacks and releases the driver.
        self.espnow = None;
    }

    fn own_mac(&self) -> Mac {
        let mut mac: Mac = [0; 6];
        unsafe {
            esp_idf_sys::esp_read_mac(
                mac.as_mut_ptr(),
                esp_idf_sys::esp_mac_type_t_ESP_MAC_WIFI_STA,
            );
        }
        mac
    }

    fn add_peer(&mut self, mac: &Mac) -> bool {
        let Some(espnow) = self.espnow.as_ref() else {
            return false;
        };
        let peer = PeerInfo {
            peer_addr: *mac,
            channel: 0,
            ifidx: esp_idf_sys::wifi_interface_t_WIFI_IF_STA,
            encrypt: false,
            ..Default::default()
        };
        match espnow.add_peer(peer) {
            Ok(()) => true,
            Err(err) => {
                log::error!("espnow: add_peer {mac:02x?} failed: {err}");
                false
            }
        }
    }

    fn remove_peer(&mut self, mac: &Mac) {
        if let Some(espnow) = self.espnow.as_ref() {
            let _ = espnow.del_peer(*mac);
        }
    }

    fn has_peer(&self, mac: &Mac) -> bool {
        self.espnow
            .as_ref()
            .map_or(false, |espnow| espnow.get_peer(*mac).is_ok())
    }

    fn send(&mut self, mac: &Mac, payload: &[u8]) -> bool {
        let Some(espnow) = self.espnow.as_ref() else {
            return false;
        };
        match espnow.send(*mac, payload) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("espnow: send to {mac:02x?} failed: {err}");
                false
            }
        }
    }
}
