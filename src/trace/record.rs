use serde::Serialize;

use crate::hci::{Direction, PacketType};

/// Packet tag carried by each emitted record.
///
/// Data packets carry their direction in the tag; commands and events do
/// not, since their direction follows from the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TracePacketType {
    HciCmd,
    HciEvt,
    HciAclRx,
    HciAclTx,
    HciScoRx,
    HciScoTx,
    HciIsoRx,
    HciIsoTx,
}

impl TracePacketType {
    /// Maps an HCI packet type and direction to its tag.
    pub const fn from_hci(packet_type: PacketType, direction: Direction) -> Self {
        match (packet_type, direction) {
            (PacketType::Cmd, _) => Self::HciCmd,
            (PacketType::Evt, _) => Self::HciEvt,
            (PacketType::Acl, Direction::Incoming) => Self::HciAclRx,
            (PacketType::Acl, Direction::Outgoing) => Self::HciAclTx,
            (PacketType::Sco, Direction::Incoming) => Self::HciScoRx,
            (PacketType::Sco, Direction::Outgoing) => Self::HciScoTx,
            (PacketType::Iso, Direction::Incoming) => Self::HciIsoRx,
            (PacketType::Iso, Direction::Outgoing) => Self::HciIsoTx,
        }
    }

    /// Returns the canonical tag name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HciCmd => "HCI_CMD",
            Self::HciEvt => "HCI_EVT",
            Self::HciAclRx => "HCI_ACL_RX",
            Self::HciAclTx => "HCI_ACL_TX",
            Self::HciScoRx => "HCI_SCO_RX",
            Self::HciScoTx => "HCI_SCO_TX",
            Self::HciIsoRx => "HCI_ISO_RX",
            Self::HciIsoTx => "HCI_ISO_TX",
        }
    }
}

/// Summary of one bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BluetoothTraceEvent {
    pub packet_type: TracePacketType,
    pub count: u32,
    /// Total bytes across all packets in the bundle.
    pub length: u64,
    /// Nanoseconds between the first and last packet.
    pub duration: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_code: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subevent_code: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_handle: Option<u16>,
}

/// One record handed to a trace sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TracePacket {
    /// Boot-time nanoseconds of the first packet in the bundle.
    pub timestamp: u64,
    pub bluetooth_trace_event: BluetoothTraceEvent,
}
