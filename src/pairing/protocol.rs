// PixelPal — Pairing Protocol
//
// Discovery broadcasts until a signed message arrives from any peer, then
// both sides derive the same role assignment from their MAC addresses and
// run the scripted conversation in strict turn order. Link loss is inferred
// from consecutive delivery failures; the lost peer is cached so the next
// discovery round tries a direct reconnect first.

use std::sync::mpsc::Receiver;

use log::{debug, error, info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::conversation::{clip_for, ConversationType, CONVERSATION_ORDER};
use super::message::Message;
use super::{Mac, Radio, RadioEvent, BROADCAST_MAC};
use crate::clock::{elapsed_ms, Clock};
use crate::config::{ComsTuning, SEND_JITTER_MAX_MS, SEND_JITTER_MIN_MS};

/// Link status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComStatus {
    Discovery,
    Paired,
}

/// Conversation turn state the orchestrator renders from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComState {
    None,
    /// Idle between turns.
    Waiting,
    /// A conversation clip is pending playback.
    Processing,
}

/// Role derived from byte-wise MAC comparison; the larger address initiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRole {
    Unknown,
    Initiator,
    Responder,
}

pub struct PairingProtocol {
    tuning: ComsTuning,
    radio: Box<dyn Radio>,
    events: Receiver<RadioEvent>,
    rng: SmallRng,

    radio_on: bool,
    status: ComStatus,
    com_state: ComState,
    role: DeviceRole,
    peer: Option<Mac>,
    last_known_peer: Option<Mac>,
    current_clip: Option<&'static str>,
    toggled: bool,

    sequence_index: usize,
    orientation_triggered: bool,
    consecutive_failures: u32,
    broadcast_attempts: u32,

    last_status_ms: Option<u32>,
    last_message_ms: Option<u32>,
    last_broadcast_ms: Option<u32>,
    last_conversation_ms: Option<u32>,
    last_toggle_ms: Option<u32>,
}

fn due(now: u32, last: Option<u32>, interval_ms: u32) -> bool {
    last.map_or(true, |t| elapsed_ms(now, t) >= interval_ms)
}

impl PairingProtocol {
    pub fn new(
        radio: Box<dyn Radio>,
        events: Receiver<RadioEvent>,
        tuning: ComsTuning,
        seed: u64,
    ) -> Self {
        Self {
            tuning,
            radio,
            events,
            rng: SmallRng::seed_from_u64(seed),
            radio_on: false,
            status: ComStatus::Discovery,
            com_state: ComState::None,
            role: DeviceRole::Unknown,
            peer: None,
            last_known_peer: None,
            current_clip: None,
            toggled: false,
            sequence_index: 0,
            orientation_triggered: false,
            consecutive_failures: 0,
            broadcast_attempts: 0,
            last_status_ms: None,
            last_message_ms: None,
            last_broadcast_ms: None,
            last_conversation_ms: None,
            last_toggle_ms: None,
        }
    }

    /// Bring the radio up and enter discovery.
    pub fn start(&mut self) -> anyhow::Result<()> {
        self.radio.init()?;
        self.radio_on = true;
        self.status = ComStatus::Discovery;
        self.broadcast_attempts = 0;
        self.last_broadcast_ms = None;
        if !self.radio.add_peer(&BROADCAST_MAC) {
            warn!("pairing: failed to register broadcast peer");
        }
        info!("pairing: radio on, discovering");
        Ok(())
    }

    /// One cooperative protocol tick: drain radio events, then advance
    /// discovery or the conversation. `oriented` preempts the script with
    /// the orientation exchange.
    pub fn handle_communication(&mut self, clock: &dyn Clock, oriented: bool) {
        let now = clock.now_ms();
        self.process_events(now);
        if !self.radio_on {
            return;
        }
        match self.status {
            ComStatus::Discovery => self.send_discovery(now),
            ComStatus::Paired => {
                if due(now, self.last_status_ms, self.tuning.status_interval_ms) {
                    self.last_status_ms = Some(now);
                    self.sequential_conversation(clock, oriented);
                }
            }
        }
    }

    /// User toggle with debounce. Returns `true` when the toggle took
    /// effect; a debounced or failed toggle leaves the radio untouched.
    pub fn toggle(&mut self, clock: &dyn Clock) -> bool {
        let now = clock.now_ms();
        if !due(now, self.last_toggle_ms, self.tuning.toggle_debounce_ms) {
            debug!("pairing: toggle debounced");
            return false;
        }
        self.last_toggle_ms = Some(now);
        if self.radio_on {
            self.handle_connection_lost();
            self.radio.deinit();
            self.radio_on = false;
            self.toggled = true;
            info!("pairing: radio off");
            true
        } else {
            match self.start() {
                Ok(()) => {
                    self.toggled = true;
                    true
                }
                Err(err) => {
                    error!("pairing: radio start failed: {err:#}");
                    false
                }
            }
        }
    }

    fn process_events(&mut self, now: u32) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                RadioEvent::SendStatus { ok: true } => self.consecutive_failures = 0,
                RadioEvent::SendStatus { ok: false } => {
                    self.consecutive_failures += 1;
                    warn!(
                        "pairing: delivery failed ({}/{})",
                        self.consecutive_failures, self.tuning.max_send_failures
                    );
                    if self.consecutive_failures >= self.tuning.max_send_failures {
                        self.handle_connection_lost();
                    }
                }
                RadioEvent::Received { mac, frame } => {
                    let Some(msg) = Message::decode(frame.as_slice()) else {
                        continue;
                    };
                    if self.status == ComStatus::Discovery {
                        self.complete_pairing(mac, now);
                    }
                    debug!(
                        "pairing: '{}' ({:?}) from {mac:02x?}",
                        msg.text_str(),
                        msg.kind
                    );
                    self.current_clip = Some(clip_for(msg.kind));
                    self.com_state = ComState::Processing;
                }
            }
        }
    }

    fn complete_pairing(&mut self, mac: Mac, now: u32) {
        if self.peer == Some(mac) {
            return;
        }
        if let Some(last) = self.last_known_peer {
            if last != mac {
                self.radio.remove_peer(&last);
                self.last_known_peer = None;
            }
        }
        if !self.radio.has_peer(&mac) && !self.radio.add_peer(&mac) {
            error!("pairing: failed to register peer {mac:02x?}");
            return;
        }
        self.peer = Some(mac);
        self.status = ComStatus::Paired;
        self.broadcast_attempts = 0;
        self.consecutive_failures = 0;
        self.sequence_index = 0;
        // First scripted turn waits a full status interval so the handshake
        // clip gets rendered before the conversation starts.
        self.last_status_ms = Some(now);
        self.last_conversation_ms = Some(now);
        self.role = if self.radio.own_mac() > mac {
            DeviceRole::Initiator
        } else {
            DeviceRole::Responder
        };
        info!("pairing: paired with {mac:02x?} as {:?}", self.role);
    }

    fn send_discovery(&mut self, now: u32) {
        if !due(now, self.last_broadcast_ms, self.tuning.discovery_interval_ms) {
            return;
        }
        self.last_broadcast_ms = Some(now);

        // Try the cached peer directly before falling back to broadcast.
        if self.broadcast_attempts == 0 {
            if let Some(peer) = self.last_known_peer {
                if !self.radio.has_peer(&peer) {
                    self.radio.add_peer(&peer);
                }
                let msg = Message::new(self.radio.own_mac(), "RECONNECT", ConversationType::Hello);
                self.radio.send(&peer, &msg.encode());
                self.broadcast_attempts += 1;
                info!("pairing: reconnect attempt to {peer:02x?}");
                return;
            }
        }

        if self.broadcast_attempts >= self.tuning.max_broadcast_attempts {
            warn!("pairing: discovery exhausted, restarting");
            self.last_known_peer = None;
            self.handle_connection_lost();
            return;
        }

        self.broadcast_attempts += 1;
        let msg = Message::new(
            self.radio.own_mac(),
            "SEARCHING PEERS",
            ConversationType::Hello,
        );
        self.radio.send(&BROADCAST_MAC, &msg.encode());
    }

    fn sequential_conversation(&mut self, clock: &dyn Clock, oriented: bool) {
        let now = clock.now_ms();
        if !due(now, self.last_conversation_ms, self.tuning.message_interval_ms) {
            return;
        }

        if oriented {
            let sent = if !self.orientation_triggered {
                self.send_data_message(clock, "ORIENTATION_CHANGE", ConversationType::Shock)
            } else {
                self.send_data_message(clock, "ORIENTATION_ZONED", ConversationType::Zone)
            };
            if sent {
                self.orientation_triggered = !self.orientation_triggered;
                self.last_conversation_ms = Some(now);
            }
            return;
        }
        self.orientation_triggered = false;

        let my_turn = match self.role {
            DeviceRole::Initiator => self.sequence_index % 2 == 0,
            DeviceRole::Responder => self.sequence_index % 2 == 1,
            DeviceRole::Unknown => false,
        };
        self.com_state = ComState::Waiting;
        if my_turn {
            let kind = CONVERSATION_ORDER[self.sequence_index % CONVERSATION_ORDER.len()];
            // Desynchronize the two transmitters.
            let jitter = self.rng.gen_range(SEND_JITTER_MIN_MS..=SEND_JITTER_MAX_MS);
            clock.sleep_ms(jitter);
            if self.send_data_message(clock, "CONVERSE", kind) {
                self.last_conversation_ms = Some(now);
            }
        }
        // The index runs monotonically; reducing it modulo the script length
        // here would flip the turn parity at every pass over the odd-length
        // script and let one side send twice in a row.
        self.sequence_index = self.sequence_index.wrapping_add(1);
    }

    fn send_data_message(&mut self, clock: &dyn Clock, text: &str, kind: ConversationType) -> bool {
        let Some(peer) = self.peer else {
            return false;
        };
        let now = clock.now_ms();
        if !due(now, self.last_message_ms, self.tuning.message_interval_ms) {
            return false;
        }
        self.last_message_ms = Some(now);
        let msg = Message::new(self.radio.own_mac(), text, kind);
        if !self.radio.send(&peer, &msg.encode()) {
            warn!("pairing: radio rejected send to {peer:02x?}");
            return false;
        }
        // Show our own half of the exchange while the send is in flight.
        self.current_clip = Some(clip_for(kind));
        self.com_state = ComState::Processing;
        debug!("pairing: sent '{text}' ({kind:?})");
        true
    }

    fn handle_connection_lost(&mut self) {
        if let Some(peer) = self.peer.take() {
            self.last_known_peer = Some(peer);
            self.radio.remove_peer(&peer);
            info!("pairing: link to {peer:02x?} lost");
        }
        self.status = ComStatus::Discovery;
        self.role = DeviceRole::Unknown;
        self.com_state = ComState::None;
        self.current_clip = None;
        self.sequence_index = 0;
        self.orientation_triggered = false;
        self.consecutive_failures = 0;
        self.broadcast_attempts = 0;
        self.last_broadcast_ms = None;
    }

    // -----------------------------------------------------------------------
    // Accessors for the orchestrator
    // -----------------------------------------------------------------------

    pub fn radio_on(&self) -> bool {
        self.radio_on
    }

    pub fn is_paired(&self) -> bool {
        self.radio_on && self.status == ComStatus::Paired
    }

    pub fn status(&self) -> ComStatus {
        self.status
    }

    pub fn role(&self) -> DeviceRole {
        self.role
    }

    pub fn com_state(&self) -> ComState {
        self.com_state
    }

    pub fn current_clip(&self) -> Option<&'static str> {
        self.current_clip
    }

    /// Mark the pending conversation clip as rendered.
    pub fn clip_played(&mut self) {
        self.current_clip = None;
        if self.com_state == ComState::Processing {
            self.com_state = ComState::Waiting;
        }
    }

    pub fn toggled_state(&self) -> bool {
        self.toggled
    }

    pub fn reset_toggle(&mut self) {
        self.toggled = false;
    }

    /// Clear any pending conversation rendering state.
    pub fn reset_animation_path(&mut self) {
        self.current_clip = None;
        self.com_state = ComState::None;
    }
}
