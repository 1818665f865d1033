//! Replays a textual HCI capture through a data source instance.
//!
//! One packet per line:
//!
//! ```text
//! <timestamp_ns> <rx|tx> <cmd|evt|acl|sco|iso> <hex bytes...>
//! ```
//!
//! Hex bytes may be split across any number of tokens (`030c00` or
//! `03 0c 00`). Blank lines and everything after `#` are ignored.

use std::io::BufRead;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::hci::{Direction, PacketType};
use crate::sink::TraceSink;
use crate::source::{HciTracing, InstanceId, SourceError, StatsSnapshot};

/// Errors raised while reading a capture.
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("missing {field}")]
    MissingField { field: &'static str },

    #[error("invalid timestamp {value:?}")]
    InvalidTimestamp { value: String },

    #[error("unknown direction {value:?}")]
    UnknownDirection { value: String },

    #[error("unknown packet type {value:?}")]
    UnknownPacketType { value: String },

    #[error("invalid hex {value:?}")]
    InvalidHex { value: String },

    #[error("timestamp {timestamp} is before previous packet at {previous}")]
    OutOfOrder { timestamp: u64, previous: u64 },

    #[error("reading input: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// One packet read from a capture line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayPacket {
    pub timestamp_ns: u64,
    pub direction: Direction,
    pub packet_type: PacketType,
    pub data: Vec<u8>,
}

/// Totals for one replay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub lines: u64,
    pub packets: u64,
    pub rejected_lines: u64,
    pub stats: StatsSnapshot,
}

/// Parses one capture line. Returns `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<ReplayPacket>, ReplayError> {
    let line = match line.split_once('#') {
        Some((before, _)) => before,
        None => line,
    };

    let mut fields = line.split_whitespace();
    let Some(timestamp) = fields.next() else {
        return Ok(None);
    };

    let timestamp_ns = timestamp
        .parse::<u64>()
        .map_err(|_| ReplayError::InvalidTimestamp {
            value: timestamp.to_string(),
        })?;

    let direction = fields.next().ok_or(ReplayError::MissingField {
        field: "direction",
    })?;
    let direction = Direction::from_name(direction).ok_or_else(|| ReplayError::UnknownDirection {
        value: direction.to_string(),
    })?;

    let packet_type = fields.next().ok_or(ReplayError::MissingField {
        field: "packet type",
    })?;
    let packet_type =
        PacketType::from_name(packet_type).ok_or_else(|| ReplayError::UnknownPacketType {
            value: packet_type.to_string(),
        })?;

    let mut data = Vec::with_capacity(64);
    for token in fields {
        decode_hex_into(token, &mut data)?;
    }
    if data.is_empty() {
        return Err(ReplayError::MissingField {
            field: "packet bytes",
        });
    }

    Ok(Some(ReplayPacket {
        timestamp_ns,
        direction,
        packet_type,
        data,
    }))
}

fn decode_hex_into(token: &str, out: &mut Vec<u8>) -> Result<(), ReplayError> {
    let invalid = || ReplayError::InvalidHex {
        value: token.to_string(),
    };

    if token.len() % 2 != 0 || !token.is_ascii() {
        return Err(invalid());
    }

    for pair in token.as_bytes().chunks_exact(2) {
        let pair = std::str::from_utf8(pair).map_err(|_| invalid())?;
        out.push(u8::from_str_radix(pair, 16).map_err(|_| invalid())?);
    }

    Ok(())
}

/// Replays `input` into a fresh instance writing to `sink`.
///
/// Lines that fail to parse, or whose timestamp goes backwards, are logged
/// and skipped. At end of input the instance is flushed and then stopped.
///
/// The instance is stopped on every exit. When reading fails partway
/// through, its pending bundles are discarded and the read error returned.
pub fn run<R: BufRead>(
    tracing: &HciTracing,
    input: R,
    sink: Arc<dyn TraceSink>,
) -> Result<ReplaySummary, ReplayError> {
    let id = tracing.setup(sink);
    let fed = tracing
        .start(id)
        .map_err(ReplayError::from)
        .and_then(|()| feed(tracing, id, input));
    let stopped = tracing.stop(id);

    let mut summary = fed?;
    stopped?;
    summary.stats = tracing.stats().snapshot();
    Ok(summary)
}

fn feed<R: BufRead>(
    tracing: &HciTracing,
    id: InstanceId,
    input: R,
) -> Result<ReplaySummary, ReplayError> {
    let mut summary = ReplaySummary::default();
    let mut last_ts = 0u64;

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        summary.lines += 1;

        let packet = match parse_line(&line) {
            Ok(Some(packet)) => packet,
            Ok(None) => continue,
            Err(err) => {
                summary.rejected_lines += 1;
                warn!(line = line_no, error = %err, "skipping malformed input line");
                continue;
            }
        };

        if packet.timestamp_ns < last_ts {
            summary.rejected_lines += 1;
            let err = ReplayError::OutOfOrder {
                timestamp: packet.timestamp_ns,
                previous: last_ts,
            };
            warn!(line = line_no, error = %err, "skipping out-of-order packet");
            continue;
        }
        last_ts = packet.timestamp_ns;

        tracing.trace_packet_at(
            &packet.data,
            packet.direction,
            packet.packet_type,
            packet.timestamp_ns,
        );
        summary.packets += 1;
    }

    debug!(instance = %id, packets = summary.packets, "end of input, flushing");
    tracing.flush_at(id, last_ts)?;
    Ok(summary)
}
