use std::sync::Arc;

use hcitrace::config::TracingConfig;
use hcitrace::hci::{Direction, PacketType};
use hcitrace::sink::MemorySink;
use hcitrace::source;

// One test per binary: the registration is process-wide.
#[test]
fn global_source_initializes_once() {
    assert!(source::instance().is_none());
    // Before initialization this must be a harmless no-op.
    hcitrace::trace_packet(&[0x03, 0x0C, 0x00], Direction::Outgoing, PacketType::Cmd);

    let first = source::initialize(&TracingConfig::default());
    let other = TracingConfig {
        data_source_name: "ignored".to_string(),
        ..Default::default()
    };
    let second = source::initialize(&other);
    assert!(std::ptr::eq(first, second));
    assert_eq!(second.descriptor().name, source::DATA_SOURCE_NAME);
    assert!(source::instance().is_some_and(|s| std::ptr::eq(s, first)));

    let sink = Arc::new(MemorySink::new("global"));
    let id = first.setup(sink.clone());
    first.start(id).expect("start");

    hcitrace::trace_packet(&[0x03, 0x0C, 0x00], Direction::Outgoing, PacketType::Cmd);
    hcitrace::trace_packet(&[0x03, 0x0C, 0x00], Direction::Outgoing, PacketType::Cmd);
    first.flush(id).expect("flush");

    // Boot time is far past the first window, so the first packet flushes
    // on arrival and the second waits for the explicit flush.
    let packets = sink.take();
    assert_eq!(packets.len(), 2);
    let total: u32 = packets.iter().map(|p| p.bluetooth_trace_event.count).sum();
    assert_eq!(total, 2);
    assert!(
        packets.iter().all(|p| p.timestamp > 0),
        "boot clock feeds timestamps"
    );

    let snap = first.stats().snapshot();
    assert_eq!(snap.packets_seen, 2);
}
