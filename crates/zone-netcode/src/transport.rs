//! Transport traits for network communication
//!
//! The netcode never opens sockets. Time-sync messages leave through a
//! [`ProbeTransport`] that the host implements on top of its RPC layer, or
//! through [`PacketLink`], which frames them as [`NetPacket`]s over any
//! byte-oriented [`Connection`].

use crate::clock_sync::{TimeEcho, TimeProbe};
use crate::prediction::WireMove;
use crate::replication::VitalsUpdate;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use zone_core::Seconds;

/// Delivery of time-sync messages
///
/// Both calls are expected to be reliable. Ordering relative to other traffic
/// is not required.
pub trait ProbeTransport {
    /// Error type for this transport
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send a probe to the authority
    fn send_probe(&mut self, probe: TimeProbe) -> std::result::Result<(), Self::Error>;

    /// Send an echo back to the client that probed
    fn send_echo(&mut self, echo: TimeEcho) -> std::result::Result<(), Self::Error>;
}

/// Connection-oriented byte transport (e.g., TCP, WebSocket, reliable UDP)
pub trait Connection {
    /// Error type for this connection
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send data reliably (guaranteed delivery)
    fn send_reliable(&self, data: &[u8]) -> std::result::Result<(), Self::Error>;

    /// Send data unreliably (best effort, may be reordered or lost)
    ///
    /// For transports that don't support unreliable sends, this falls back to reliable.
    fn send_unreliable(&self, data: &[u8]) -> std::result::Result<(), Self::Error> {
        self.send_reliable(data)
    }

    /// Check if the connection is still alive
    fn is_connected(&self) -> bool;
}

/// Packet types for the netcode protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NetPacket {
    /// Time-sync request from client to authority
    TimeProbe(TimeProbe),
    /// Time-sync reply from authority to client
    TimeEcho(TimeEcho),
    /// Compacted predicted moves from client to authority
    Moves(Vec<WireMove>),
    /// Authority has processed every move up to this client timestamp
    MoveAck {
        /// Timestamp of the newest processed move
        timestamp: Seconds,
    },
    /// Replicated health and attachment state
    Vitals(VitalsUpdate),
}

impl NetPacket {
    /// Serialize to bytes
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Whether this packet must arrive
    ///
    /// Move batches are resent until acknowledged, so they can go unreliable.
    pub fn is_reliable(&self) -> bool {
        !matches!(self, NetPacket::Moves(_))
    }
}

/// Sends [`NetPacket`]s over a [`Connection`]
#[derive(Debug)]
pub struct PacketLink<C: Connection> {
    connection: C,
}

impl<C: Connection> PacketLink<C> {
    /// Wrap a connection
    pub fn new(connection: C) -> Self {
        Self { connection }
    }

    /// Encode and send a packet on the channel its kind calls for
    pub fn send(&self, packet: &NetPacket) -> Result<()> {
        if !self.connection.is_connected() {
            return Err(Error::Transport("connection closed".to_string()));
        }

        let data = packet.encode()?;
        let sent = if packet.is_reliable() {
            self.connection.send_reliable(&data)
        } else {
            self.connection.send_unreliable(&data)
        };
        sent.map_err(|e| Error::Transport(e.to_string()))
    }

    /// Get the underlying connection
    pub fn connection(&self) -> &C {
        &self.connection
    }
}

impl<C: Connection> ProbeTransport for PacketLink<C> {
    type Error = Error;

    fn send_probe(&mut self, probe: TimeProbe) -> Result<()> {
        self.send(&NetPacket::TimeProbe(probe))
    }

    fn send_echo(&mut self, echo: TimeEcho) -> Result<()> {
        self.send(&NetPacket::TimeEcho(echo))
    }
}
