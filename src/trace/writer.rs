use crate::bundle::{BundleDetails, BundleKey};

use super::record::{BluetoothTraceEvent, TracePacket, TracePacketType};

/// Destination for finished trace packets.
///
/// Implemented by the scoped per-instance context of the lifecycle adapter;
/// each call publishes one record atomically. Implementations must not
/// block and must not report failure back into the aggregator.
pub trait TraceWriter {
    fn new_trace_packet(&mut self, packet: TracePacket);
}

impl TraceWriter for Vec<TracePacket> {
    fn new_trace_packet(&mut self, packet: TracePacket) {
        self.push(packet);
    }
}

/// Builds the record for one bundle.
pub fn bundle_to_packet(key: &BundleKey, details: &BundleDetails) -> TracePacket {
    TracePacket {
        timestamp: details.start_ts,
        bluetooth_trace_event: BluetoothTraceEvent {
            packet_type: TracePacketType::from_hci(key.packet_type(), key.direction),
            count: details.count,
            length: details.total_length,
            duration: details.duration_ns(),
            op_code: key.op_code(),
            event_code: key.event_code(),
            subevent_code: key.subevent_code(),
            connection_handle: key.handle(),
        },
    }
}

/// Writes one bundle to the given context.
pub fn write_bundle<W>(writer: &mut W, key: &BundleKey, details: &BundleDetails)
where
    W: TraceWriter + ?Sized,
{
    writer.new_trace_packet(bundle_to_packet(key, details));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::DataKind;
    use crate::hci::{ConnectionHandle, Direction};

    fn details(count: u32, total_length: u64, start_ts: u64, end_ts: u64) -> BundleDetails {
        BundleDetails {
            count,
            total_length,
            start_ts,
            end_ts,
        }
    }

    #[test]
    fn test_command_bundle_record() {
        let key = BundleKey::command(Direction::Outgoing, 0x0C03);
        let mut out: Vec<TracePacket> = Vec::new();

        write_bundle(&mut out, &key, &details(2, 6, 1_000_000, 2_000_000));

        assert_eq!(out.len(), 1);
        let packet = &out[0];
        assert_eq!(packet.timestamp, 1_000_000);
        let event = &packet.bluetooth_trace_event;
        assert_eq!(event.packet_type, TracePacketType::HciCmd);
        assert_eq!(event.count, 2);
        assert_eq!(event.length, 6);
        assert_eq!(event.duration, 1_000_000);
        assert_eq!(event.op_code, Some(0x0C03));
        assert_eq!(event.event_code, None);
        assert_eq!(event.subevent_code, None);
        assert_eq!(event.connection_handle, None);
    }

    #[test]
    fn test_le_meta_bundle_record() {
        let key = BundleKey::event(Direction::Incoming, 0x3E, Some(0x0A));
        let packet = bundle_to_packet(&key, &details(1, 33, 50, 50));

        let event = &packet.bluetooth_trace_event;
        assert_eq!(event.packet_type, TracePacketType::HciEvt);
        assert_eq!(event.event_code, Some(0x3E));
        assert_eq!(event.subevent_code, Some(0x0A));
        assert_eq!(event.op_code, None);
        assert_eq!(event.duration, 0);
    }

    #[test]
    fn test_data_bundle_record_carries_direction_in_tag() {
        let handle = ConnectionHandle::from_raw(0x02A);
        let rx = BundleKey::data(Direction::Incoming, DataKind::Acl, handle);
        let tx = BundleKey::data(Direction::Outgoing, DataKind::Acl, handle);

        let rx_packet = bundle_to_packet(&rx, &details(1, 8, 5, 5));
        let tx_packet = bundle_to_packet(&tx, &details(1, 8, 6, 6));

        assert_eq!(
            rx_packet.bluetooth_trace_event.packet_type,
            TracePacketType::HciAclRx
        );
        assert_eq!(
            tx_packet.bluetooth_trace_event.packet_type,
            TracePacketType::HciAclTx
        );
        assert_eq!(
            rx_packet.bluetooth_trace_event.connection_handle,
            Some(0x02A)
        );
        assert_eq!(
            tx_packet.bluetooth_trace_event.connection_handle,
            Some(0x02A)
        );
    }
}
