//! Bundle keys, per-bundle totals and the windowed aggregator.

pub mod aggregator;
pub mod details;
pub mod key;

pub use self::aggregator::{BundleAggregator, RecordOutcome, FLUSH_WINDOW_NS};
pub use self::details::BundleDetails;
pub use self::key::{BundleKey, Classification, DataKind};
