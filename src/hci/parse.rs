//! Classification of raw HCI packets.
//!
//! Decodes only the header fields that identify a packet for bundling:
//! the opcode of a command, the event (and subevent) code of an event, and
//! the connection handle of ACL, SCO and ISO data. Payloads are never read.

use thiserror::Error;

use crate::bundle::{BundleKey, Classification, DataKind};

use super::{event_code, ConnectionHandle, Direction, PacketType};

/// Errors that can occur while classifying a packet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{packet_type} packet too short: {len} bytes, need {min}")]
    Truncated {
        packet_type: PacketType,
        len: usize,
        min: usize,
    },
}

/// Returns true for events that are never traced.
///
/// Command Complete, Command Status and Number Of Completed Packets carry no
/// behavioural information of their own and dominate event volume on busy
/// links.
pub fn should_skip(data: &[u8], packet_type: PacketType) -> bool {
    if packet_type != PacketType::Evt {
        return false;
    }

    matches!(
        data.first().copied(),
        Some(
            event_code::NUMBER_OF_COMPLETED_PACKETS
                | event_code::COMMAND_COMPLETE
                | event_code::COMMAND_STATUS
        )
    )
}

/// Minimum number of bytes `extract_key` reads for this packet.
///
/// For events the answer depends on the event code, so an empty event
/// reports the single byte needed to read it.
pub fn min_packet_len(data: &[u8], packet_type: PacketType) -> usize {
    match packet_type {
        PacketType::Cmd | PacketType::Acl | PacketType::Sco | PacketType::Iso => 2,
        PacketType::Evt => match data.first() {
            Some(&code) if event_code::has_subevent(code) => 3,
            _ => 1,
        },
    }
}

/// Builds the bundle key for a packet.
///
/// The caller guarantees the packet is at least [`min_packet_len`] bytes
/// long; framing is the transport's responsibility. A shorter slice panics.
/// Use [`classify`] for input that has not been framed.
pub fn extract_key(data: &[u8], direction: Direction, packet_type: PacketType) -> BundleKey {
    let class = match packet_type {
        PacketType::Cmd => Classification::Command {
            op_code: read_u16_le(data, 0),
        },
        PacketType::Evt => {
            let code = data[0];
            let subevent_code = if event_code::has_subevent(code) {
                // Offset 1 is the parameter length.
                Some(data[2])
            } else {
                None
            };
            Classification::Event {
                event_code: code,
                subevent_code,
            }
        }
        PacketType::Acl => data_class(DataKind::Acl, data),
        PacketType::Sco => data_class(DataKind::Sco, data),
        PacketType::Iso => data_class(DataKind::Iso, data),
    };

    BundleKey { direction, class }
}

/// Checked variant of [`extract_key`] for unframed input.
pub fn classify(
    data: &[u8],
    direction: Direction,
    packet_type: PacketType,
) -> Result<BundleKey, ParseError> {
    let min = min_packet_len(data, packet_type);
    if data.len() < min {
        return Err(ParseError::Truncated {
            packet_type,
            len: data.len(),
            min,
        });
    }

    Ok(extract_key(data, direction, packet_type))
}

fn data_class(kind: DataKind, data: &[u8]) -> Classification {
    Classification::Data {
        kind,
        handle: ConnectionHandle::from_raw(read_u16_le(data, 0)),
    }
}

#[inline(always)]
fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}
