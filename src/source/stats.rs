use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free pipeline counters shared by every instance of a data source.
///
/// Producers bump counters with relaxed increments; `snapshot()` reads
/// without resetting, `take()` reads and resets.
#[derive(Debug, Default)]
pub struct TraceStats {
    packets_seen: AtomicU64,
    packets_skipped: AtomicU64,
    packets_malformed: AtomicU64,
    packets_recorded: AtomicU64,
    packets_inactive: AtomicU64,
    flushes: AtomicU64,
    records_written: AtomicU64,
    records_dropped: AtomicU64,
}

/// Point-in-time copy of [`TraceStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Packets handed to `trace_packet`.
    pub packets_seen: u64,
    /// Noise events dropped by the skip filter.
    pub packets_skipped: u64,
    /// Packets too short to classify.
    pub packets_malformed: u64,
    /// Packet recordings, counted once per started instance.
    pub packets_recorded: u64,
    /// Packets seen while no instance was started.
    pub packets_inactive: u64,
    /// Flushes that emitted at least one record.
    pub flushes: u64,
    pub records_written: u64,
    /// Records a sink refused.
    pub records_dropped: u64,
}

impl TraceStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn packet_seen(&self) {
        self.packets_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn packet_skipped(&self) {
        self.packets_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn packet_malformed(&self) {
        self.packets_malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn packet_recorded(&self) {
        self.packets_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn packet_inactive(&self) {
        self.packets_inactive.fetch_add(1, Ordering::Relaxed);
    }

    pub fn flushed(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_written(&self) {
        self.records_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.records_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            packets_seen: self.packets_seen.load(Ordering::Relaxed),
            packets_skipped: self.packets_skipped.load(Ordering::Relaxed),
            packets_malformed: self.packets_malformed.load(Ordering::Relaxed),
            packets_recorded: self.packets_recorded.load(Ordering::Relaxed),
            packets_inactive: self.packets_inactive.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
        }
    }

    /// Atomically reads and resets every counter, suitable for periodic
    /// reporting without contention.
    pub fn take(&self) -> StatsSnapshot {
        StatsSnapshot {
            packets_seen: self.packets_seen.swap(0, Ordering::Relaxed),
            packets_skipped: self.packets_skipped.swap(0, Ordering::Relaxed),
            packets_malformed: self.packets_malformed.swap(0, Ordering::Relaxed),
            packets_recorded: self.packets_recorded.swap(0, Ordering::Relaxed),
            packets_inactive: self.packets_inactive.swap(0, Ordering::Relaxed),
            flushes: self.flushes.swap(0, Ordering::Relaxed),
            records_written: self.records_written.swap(0, Ordering::Relaxed),
            records_dropped: self.records_dropped.swap(0, Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot() {
        let stats = TraceStats::new();
        stats.packet_seen();
        stats.packet_seen();
        stats.packet_skipped();
        stats.record_written();

        let snap = stats.snapshot();
        assert_eq!(snap.packets_seen, 2);
        assert_eq!(snap.packets_skipped, 1);
        assert_eq!(snap.records_written, 1);
        assert_eq!(snap.records_dropped, 0);

        // snapshot() does not reset.
        assert_eq!(stats.snapshot(), snap);
    }

    #[test]
    fn test_take_resets_counters() {
        let stats = TraceStats::new();
        stats.flushed();
        stats.record_dropped();

        let first = stats.take();
        assert_eq!(first.flushes, 1);
        assert_eq!(first.records_dropped, 1);

        assert_eq!(stats.take(), StatsSnapshot::default());
    }
}
