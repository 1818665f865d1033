use std::alloc::System;
use std::hint::black_box;
use std::sync::Arc;

use hcitrace::bundle::BundleAggregator;
use hcitrace::config::TracingConfig;
use hcitrace::hci::parse::{classify, extract_key};
use hcitrace::hci::{Direction, PacketType};
use hcitrace::sink::MemorySink;
use hcitrace::source::HciTracing;
use hcitrace::trace::TracePacket;
use serial_test::serial;
use stats_alloc::{Region, StatsAlloc, INSTRUMENTED_SYSTEM};

#[global_allocator]
static GLOBAL: &StatsAlloc<System> = &INSTRUMENTED_SYSTEM;

const RESET: [u8; 3] = [0x03, 0x0C, 0x00];

fn acl_payload(handle: u16) -> Vec<u8> {
    let mut data = Vec::with_capacity(64);
    data.extend_from_slice(&(handle | 0x2000).to_le_bytes());
    data.extend_from_slice(&27u16.to_le_bytes());
    data.extend_from_slice(&[0xA5; 27]);
    data
}

fn le_meta_payload(subevent: u8) -> Vec<u8> {
    let mut data = vec![0x3E, 0x0C, subevent];
    data.extend_from_slice(&[0u8; 11]);
    data
}

fn measure_alloc_counts<T>(f: impl FnOnce() -> T) -> (T, usize, usize) {
    // Calibrate for ambient allocator activity in the test harness process.
    let idle_region = Region::new(&GLOBAL);
    black_box(());
    let idle = idle_region.change();

    let region = Region::new(&GLOBAL);
    let output = f();
    let used = region.change();

    let allocations = used.allocations.saturating_sub(idle.allocations);
    let deallocations = used.deallocations.saturating_sub(idle.deallocations);
    (output, allocations, deallocations)
}

#[test]
#[serial]
fn extract_key_allocates_zero() {
    let acl = acl_payload(0x040);
    let meta = le_meta_payload(0x02);

    let (_, allocations, deallocations) = measure_alloc_counts(|| {
        for _ in 0..1_024 {
            black_box(extract_key(&RESET, Direction::Outgoing, PacketType::Cmd));
            black_box(extract_key(&acl, Direction::Incoming, PacketType::Acl));
            let meta_key = classify(&meta, Direction::Incoming, PacketType::Evt);
            black_box(meta_key.expect("classify"));
        }
    });

    assert_eq!(allocations, 0, "key extraction allocated");
    assert_eq!(deallocations, 0, "key extraction deallocated");
}

#[test]
#[serial]
fn record_existing_key_allocates_zero() {
    let mut agg = BundleAggregator::new();
    let mut out: Vec<TracePacket> = Vec::new();
    let acl = acl_payload(0x040);

    // Warm the map so every measured call updates an existing bundle.
    agg.record(&mut out, &RESET, Direction::Outgoing, PacketType::Cmd, 1);
    agg.record(&mut out, &acl, Direction::Incoming, PacketType::Acl, 1);

    let (_, allocations, deallocations) = measure_alloc_counts(|| {
        for i in 0..4_096u64 {
            let now = 2 + i;
            let cmd = agg.record(&mut out, &RESET, Direction::Outgoing, PacketType::Cmd, now);
            black_box(cmd);
            let data = agg.record(&mut out, &acl, Direction::Incoming, PacketType::Acl, now);
            black_box(data);
        }
    });

    assert_eq!(allocations, 0, "steady-state record allocated");
    assert_eq!(deallocations, 0, "steady-state record deallocated");
    assert!(out.is_empty());
    assert_eq!(agg.len(), 2);
}

#[test]
#[serial]
fn trace_packet_hot_path_allocation_budget() {
    let tracing = HciTracing::new(TracingConfig::default());
    let sink = Arc::new(MemorySink::new("alloc"));
    let id = tracing.setup(sink.clone());
    tracing.start(id).expect("start");

    let acl = acl_payload(0x001);
    tracing.trace_packet_at(&acl, Direction::Outgoing, PacketType::Acl, 1);

    let (_, allocations, _deallocations) = measure_alloc_counts(|| {
        for i in 0..4_096u64 {
            tracing.trace_packet_at(&acl, Direction::Outgoing, PacketType::Acl, 2 + i);
        }
    });

    assert!(
        allocations <= 8,
        "trace_packet allocation budget exceeded: {}",
        allocations
    );
    assert!(sink.is_empty());
}

#[test]
#[serial]
fn flush_reuses_map_capacity() {
    let mut agg = BundleAggregator::new();
    let mut out: Vec<TracePacket> = Vec::with_capacity(256);

    for handle in 0..64u16 {
        agg.record(
            &mut out,
            &handle.to_le_bytes(),
            Direction::Incoming,
            PacketType::Iso,
            1,
        );
    }
    agg.flush(&mut out, 2);
    out.clear();

    let (_, allocations, _deallocations) = measure_alloc_counts(|| {
        for handle in 0..64u16 {
            agg.record(
                &mut out,
                &handle.to_le_bytes(),
                Direction::Incoming,
                PacketType::Iso,
                3,
            );
        }
        agg.flush(&mut out, 4)
    });

    assert_eq!(allocations, 0, "refilling a drained map allocated");
    assert_eq!(out.len(), 64);
}
