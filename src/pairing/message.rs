// PixelPal — Pairing Wire Format
//
// Fixed 46-byte little-endian frame:
//   signature  u32      application tag, rejects foreign traffic
//   mac        [u8; 6]  sender hardware address
//   text       [u8; 32] NUL-padded label ("SEARCHING PEERS", "CONVERSE", ..)
//   kind       i32      conversation type discriminant

use log::debug;

use super::conversation::ConversationType;
use super::Mac;
use crate::config::APP_SIGNATURE;

/// Exact on-air frame length. Anything else is dropped.
pub const WIRE_SIZE: usize = 46;

const TEXT_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    pub signature: u32,
    pub mac: Mac,
    pub text: [u8; TEXT_LEN],
    pub kind: ConversationType,
}

impl Message {
    /// Build an outgoing message. `text` is truncated to fit and NUL-padded.
    pub fn new(mac: Mac, text: &str, kind: ConversationType) -> Self {
        let mut buf = [0u8; TEXT_LEN];
        let take = text.len().min(TEXT_LEN - 1);
        buf[..take].copy_from_slice(&text.as_bytes()[..take]);
        Self {
            signature: APP_SIGNATURE,
            mac,
            text: buf,
            kind,
        }
    }

    pub fn encode(&self) -> [u8; WIRE_SIZE] {
        let mut out = [0u8; WIRE_SIZE];
        out[0..4].copy_from_slice(&self.signature.to_le_bytes());
        out[4..10].copy_from_slice(&self.mac);
        out[10..42].copy_from_slice(&self.text);
        out[42..46].copy_from_slice(&(self.kind as i32).to_le_bytes());
        out
    }

    /// Validate and decode a received frame. Wrong length, wrong signature,
    /// or an unknown conversation discriminant all reject the frame.
    pub fn decode(bytes: &[u8]) -> Option<Message> {
        if bytes.len() != WIRE_SIZE {
            debug!("pairing: dropped frame with length {}", bytes.len());
            return None;
        }
        let signature = u32::from_le_bytes(bytes[0..4].try_into().ok()?);
        if signature != APP_SIGNATURE {
            debug!("pairing: dropped frame with signature {signature:#010x}");
            return None;
        }
        let mut mac = [0u8; 6];
        mac.copy_from_slice(&bytes[4..10]);
        let mut text = [0u8; TEXT_LEN];
        text.copy_from_slice(&bytes[10..42]);
        let raw_kind = i32::from_le_bytes(bytes[42..46].try_into().ok()?);
        let kind = ConversationType::from_i32(raw_kind)?;
        Some(Message {
            signature,
            mac,
            text,
            kind,
        })
    }

    /// Text label with NUL padding trimmed.
    pub fn text_str(&self) -> &str {
        let end = self
            .text
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(TEXT_LEN);
        core::str::from_utf8(&self.text[..end]).unwrap_or("")
    }
}
