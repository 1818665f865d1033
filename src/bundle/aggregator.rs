use std::collections::HashMap;

use crate::hci::parse::{extract_key, should_skip};
use crate::hci::{Direction, PacketType};
use crate::trace::{write_bundle, TraceWriter};

use super::details::BundleDetails;
use super::key::BundleKey;

/// Minimum interval between two window flushes, in nanoseconds.
pub const FLUSH_WINDOW_NS: u64 = 100 * 1000 * 1000;

/// What a single `record` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The packet is a noise event and was not recorded.
    Skipped,
    /// The packet was folded into a bundle; nothing was emitted.
    Aggregated,
    /// The packet was folded in and `bundles` records were emitted.
    Flushed { bundles: usize },
}

/// Folds packets sharing a [`BundleKey`] into bundles and emits one record
/// per bundle once the flush window has elapsed.
///
/// The map and the last flush timestamp change together; callers serialise
/// access (the lifecycle adapter holds one lock per instance around every
/// call).
#[derive(Debug)]
pub struct BundleAggregator {
    flush_window_ns: u64,
    /// Emit-and-reset before the map would grow past this many bundles.
    max_bundles: Option<usize>,
    last_flush_ns: u64,
    bundles: HashMap<BundleKey, BundleDetails>,
}

impl BundleAggregator {
    /// Creates an aggregator with the default 100ms window and no bundle cap.
    pub fn new() -> Self {
        Self::with_limits(FLUSH_WINDOW_NS, None)
    }

    pub fn with_limits(flush_window_ns: u64, max_bundles: Option<usize>) -> Self {
        Self {
            flush_window_ns,
            max_bundles,
            last_flush_ns: 0,
            bundles: HashMap::with_capacity(32),
        }
    }

    /// Records one HCI packet observed at `now_ns`.
    ///
    /// `data` must be a framed packet of `packet_type` (see
    /// [`crate::hci::parse::min_packet_len`]); `now_ns` must not go
    /// backwards between calls.
    pub fn record<W>(
        &mut self,
        writer: &mut W,
        data: &[u8],
        direction: Direction,
        packet_type: PacketType,
        now_ns: u64,
    ) -> RecordOutcome
    where
        W: TraceWriter + ?Sized,
    {
        if should_skip(data, packet_type) {
            return RecordOutcome::Skipped;
        }

        let key = extract_key(data, direction, packet_type);
        self.record_key(writer, key, data.len(), now_ns)
    }

    /// Records a packet whose key has already been extracted.
    pub fn record_key<W>(
        &mut self,
        writer: &mut W,
        key: BundleKey,
        len: usize,
        now_ns: u64,
    ) -> RecordOutcome
    where
        W: TraceWriter + ?Sized,
    {
        let mut emitted = 0;

        if let Some(cap) = self.max_bundles {
            if self.bundles.len() >= cap && !self.bundles.contains_key(&key) {
                emitted += self.flush(writer, now_ns);
            }
        }

        self.bundles.entry(key).or_default().add(len, now_ns);

        if self.last_flush_ns.saturating_add(self.flush_window_ns) < now_ns {
            emitted += self.flush(writer, now_ns);
        }

        if emitted > 0 {
            RecordOutcome::Flushed { bundles: emitted }
        } else {
            RecordOutcome::Aggregated
        }
    }

    /// Writes every pending bundle, clears the map and restarts the window
    /// at `now_ns`. Returns the number of records written.
    ///
    /// On an empty map nothing is written.
    pub fn flush<W>(&mut self, writer: &mut W, now_ns: u64) -> usize
    where
        W: TraceWriter + ?Sized,
    {
        let emitted = self.bundles.len();
        for (key, details) in self.bundles.drain() {
            write_bundle(writer, &key, &details);
        }
        self.last_flush_ns = now_ns;
        emitted
    }

    /// Drops every pending bundle without writing it.
    /// Returns the number of bundles lost.
    pub fn discard(&mut self) -> usize {
        let lost = self.bundles.len();
        self.bundles.clear();
        lost
    }

    pub fn get(&self, key: &BundleKey) -> Option<&BundleDetails> {
        self.bundles.get(key)
    }

    /// Iterates pending bundles in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&BundleKey, &BundleDetails)> {
        self.bundles.iter()
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    pub fn last_flush_ns(&self) -> u64 {
        self.last_flush_ns
    }

    pub fn flush_window_ns(&self) -> u64 {
        self.flush_window_ns
    }
}

impl Default for BundleAggregator {
    fn default() -> Self {
        Self::new()
    }
}
