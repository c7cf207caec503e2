//! Connection lifecycle: connect, join, and fixed-delay reconnection.
//!
//! The manager owns the state machine only. Socket callbacks are routed in by
//! the caller (`handle_open`, `handle_text`, `handle_close`, `handle_error`) and
//! reconnection delays are handed back so the caller can arm a timer.

use std::collections::HashMap;

use crate::error::{JoinRejected, TransportError};
use crate::protocol::{Avatar, ClientCommand, JoinAccepted, PlayerPatch, PlayerState, ServerMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    AwaitingJoin,
    Joined,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "Disconnected - reconnecting...",
            ConnectionState::Connecting => "Connecting...",
            ConnectionState::Connected => "Connected",
            ConnectionState::AwaitingJoin => "Joining...",
            ConnectionState::Joined => "Online",
        }
    }
}

/// Persistent bidirectional text link.
pub trait Transport {
    fn open(&mut self, url: &str) -> Result<(), TransportError>;
    fn is_open(&self) -> bool;
    fn send_text(&self, text: &str) -> Result<(), TransportError>;
}

/// Where outbound gameplay commands go.
pub trait CommandSink {
    fn can_send(&self) -> bool;
    fn submit(&mut self, command: ClientCommand);
}

/// Decoded, state-checked inbound event.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    Joined(JoinAccepted),
    JoinRejected(String),
    PlayersMoved(HashMap<String, PlayerPatch>),
    PlayerJoined { player: PlayerState, avatar: Avatar },
    PlayerLeft(String),
}

pub struct ConnectionManager<T: Transport> {
    transport: T,
    url: String,
    username: String,
    reconnect_delay: u32,
    state: ConnectionState,
    reconnect_pending: bool,
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(transport: T, url: String, username: String, reconnect_delay: u32) -> Self {
        Self {
            transport,
            url,
            username,
            reconnect_delay,
            state: ConnectionState::Disconnected,
            reconnect_pending: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    #[cfg(test)]
    pub(crate) fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Start a connection attempt. No-op while an attempt or a live link exists.
    /// Returns a reconnect delay when the attempt failed synchronously.
    pub fn connect(&mut self) -> Option<u32> {
        if self.state != ConnectionState::Disconnected || self.transport.is_open() {
            return None;
        }
        self.state = ConnectionState::Connecting;
        log::info!("connecting to {}", self.url);
        match self.transport.open(&self.url) {
            Ok(()) => None,
            Err(e) => {
                log::warn!("{}", e);
                self.link_lost()
            }
        }
    }

    /// Timer callback for a scheduled reconnect.
    pub fn reconnect(&mut self) -> Option<u32> {
        self.reconnect_pending = false;
        self.connect()
    }

    pub fn handle_open(&mut self) {
        if self.state != ConnectionState::Connecting {
            log::debug!("open event in state {:?}", self.state);
        }
        self.state = ConnectionState::Connected;
        log::info!("connected, joining as {}", self.username);
        self.send(ClientCommand::JoinGame { username: self.username.clone() });
        self.state = ConnectionState::AwaitingJoin;
    }

    pub fn handle_close(&mut self) -> Option<u32> {
        log::info!("connection closed");
        self.link_lost()
    }

    pub fn handle_error(&mut self, reason: &str) -> Option<u32> {
        log::warn!("connection error: {}", reason);
        self.link_lost()
    }

    fn link_lost(&mut self) -> Option<u32> {
        self.state = ConnectionState::Disconnected;
        if self.reconnect_pending {
            return None;
        }
        self.reconnect_pending = true;
        Some(self.reconnect_delay)
    }

    /// Decode one inbound payload. Malformed payloads and events that are not
    /// valid in the current state are logged and dropped.
    pub fn handle_text(&mut self, text: &str) -> Option<InboundEvent> {
        let msg = match ServerMessage::decode(text) {
            Ok(msg) => msg,
            Err(e) => {
                log::warn!("{}", e);
                return None;
            }
        };

        match msg {
            ServerMessage::JoinGame(ack) => {
                if !matches!(self.state, ConnectionState::Connected | ConnectionState::AwaitingJoin) {
                    log::debug!("join_game ack in state {:?} dropped", self.state);
                    return None;
                }
                match ack.outcome() {
                    Ok(Ok(accepted)) => {
                        log::info!("joined as {}", accepted.player_id);
                        self.state = ConnectionState::Joined;
                        Some(InboundEvent::Joined(accepted))
                    }
                    Ok(Err(JoinRejected(reason))) => {
                        log::warn!("join rejected: {}", reason);
                        // link stays open; reconnection only follows a link-level close
                        self.state = ConnectionState::Disconnected;
                        Some(InboundEvent::JoinRejected(reason))
                    }
                    Err(e) => {
                        log::warn!("{}", e);
                        None
                    }
                }
            }
            other if self.state != ConnectionState::Joined => {
                log::debug!("{} before join dropped", other.action());
                None
            }
            ServerMessage::PlayersMoved { players } => Some(InboundEvent::PlayersMoved(players)),
            ServerMessage::PlayerJoined { player, avatar } => {
                Some(InboundEvent::PlayerJoined { player, avatar })
            }
            ServerMessage::PlayerLeft { player_id } => Some(InboundEvent::PlayerLeft(player_id)),
        }
    }

    /// Silently dropped unless the link is open. Nothing is queued.
    pub fn send(&self, command: ClientCommand) {
        if !self.transport.is_open() {
            return;
        }
        if let Err(e) = self.transport.send_text(&command.encode()) {
            log::warn!("{}", e);
        }
    }
}

impl<T: Transport> CommandSink for ConnectionManager<T> {
    fn can_send(&self) -> bool {
        self.state == ConnectionState::Joined
    }

    fn submit(&mut self, command: ClientCommand) {
        self.send(command);
    }
}
