/// Running totals for one bundle.
///
/// Not synchronised; the owning aggregator is always accessed under its
/// instance lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleDetails {
    /// Packets folded into this bundle.
    pub count: u32,
    /// Sum of packet sizes in bytes.
    pub total_length: u64,
    /// Earliest packet timestamp in nanoseconds.
    pub start_ts: u64,
    /// Latest packet timestamp in nanoseconds.
    pub end_ts: u64,
}

impl BundleDetails {
    /// Creates an empty bundle with start at MAX and end at MIN.
    pub const fn new() -> Self {
        Self {
            count: 0,
            total_length: 0,
            start_ts: u64::MAX,
            end_ts: u64::MIN,
        }
    }

    /// Folds one packet of `len` bytes observed at `timestamp_ns`.
    pub fn add(&mut self, len: usize, timestamp_ns: u64) {
        self.count = self.count.saturating_add(1);
        self.total_length = self.total_length.saturating_add(len as u64);
        self.start_ts = self.start_ts.min(timestamp_ns);
        self.end_ts = self.end_ts.max(timestamp_ns);
    }

    /// Time between the first and last packet, zero for an empty bundle.
    pub fn duration_ns(&self) -> u64 {
        self.end_ts.saturating_sub(self.start_ts)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Default for BundleDetails {
    fn default() -> Self {
        Self::new()
    }
}
