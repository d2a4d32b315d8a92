// PixelPal — Device Pairing
//
// Two toys find each other over a connectionless broadcast radio, elect
// roles from their MAC addresses, and then take strict turns walking a
// scripted conversation. The radio driver surfaces its callbacks as events
// on a bounded channel; all protocol state lives on the main loop side.

mod conversation;
mod message;
mod protocol;

pub use conversation::{clip_for, ConversationType, CONVERSATION_ORDER};
pub use message::{Message, WIRE_SIZE};
pub use protocol::{ComState, ComStatus, DeviceRole, PairingProtocol};

/// Radio hardware address.
pub type Mac = [u8; 6];

/// Destination for discovery broadcasts.
pub const BROADCAST_MAC: Mac = [0xFF; 6];

/// Fixed-capacity copy of a received payload, sized for the wire format with
/// headroom. Built inside the receive callback without allocating.
#[derive(Debug, Clone, Copy)]
pub struct RadioFrame {
    bytes: [u8; 64],
    len: usize,
}

impl RadioFrame {
    /// Copies up to capacity; longer payloads are invalid on this protocol
    /// and get rejected later by length validation.
    pub fn from_slice(data: &[u8]) -> Self {
        let mut bytes = [0u8; 64];
        let len = data.len().min(bytes.len());
        bytes[..len].copy_from_slice(&data[..len]);
        Self { bytes, len }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

/// Radio callback surfaced to the main loop.
#[derive(Debug, Clone, Copy)]
pub enum RadioEvent {
    /// Delivery confirmation for the last unicast or broadcast.
    SendStatus { ok: bool },
    /// Payload received from `mac`.
    Received { mac: Mac, frame: RadioFrame },
}

/// Connectionless peer-to-peer radio. The ESP-NOW driver implements this on
/// target; tests substitute a scripted radio.
pub trait Radio {
    fn init(&mut self) -> anyhow::Result<()>;
    fn deinit(&mut self);
    fn own_mac(&self) -> Mac;
    fn add_peer(&mut self, mac: &Mac) -> bool;
    fn remove_peer(&mut self, mac: &Mac);
    fn has_peer(&self, mac: &Mac) -> bool;
    /// Queue a payload for transmission. The delivery result arrives later
    /// as a `SendStatus` event; `false` means the radio rejected it outright.
    fn send(&mut self, mac: &Mac, payload: &[u8]) -> bool;
}
