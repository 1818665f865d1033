use tracing::{debug, info, warn};

use crate::bundle::{BundleAggregator, BundleKey, RecordOutcome};
use crate::sink::TraceSink;
use crate::trace::{TracePacket, TraceWriter};

use super::stats::TraceStats;
use super::{DataSource, FlushArgs, InstanceId, SetupArgs, StartArgs, StopArgs};

/// Scoped write context for one instance, valid while its lock is held.
///
/// Hands each record to the instance's sink. A record the sink refuses is
/// dropped and counted; the aggregator never sees the failure.
pub struct TraceContext<'a> {
    instance: InstanceId,
    sink: &'a dyn TraceSink,
    stats: &'a TraceStats,
}

impl<'a> TraceContext<'a> {
    pub fn new(instance: InstanceId, sink: &'a dyn TraceSink, stats: &'a TraceStats) -> Self {
        Self {
            instance,
            sink,
            stats,
        }
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn stats(&self) -> &TraceStats {
        self.stats
    }

    /// Flushes the underlying sink, logging failures.
    pub fn flush_sink(&self) {
        if let Err(err) = self.sink.flush() {
            warn!(
                instance = %self.instance,
                sink = self.sink.name(),
                error = %err,
                "sink flush failed"
            );
        }
    }
}

impl TraceWriter for TraceContext<'_> {
    fn new_trace_packet(&mut self, packet: TracePacket) {
        match self.sink.write_packet(packet) {
            Ok(()) => self.stats.record_written(),
            Err(err) => {
                self.stats.record_dropped();
                debug!(
                    instance = %self.instance,
                    sink = self.sink.name(),
                    error = %err,
                    "dropping trace record"
                );
            }
        }
    }
}

/// Per-instance HCI data source. Owns the bundle aggregator for one
/// tracing session.
#[derive(Debug, Default)]
pub struct HciTraceSource {
    aggregator: BundleAggregator,
}

impl HciTraceSource {
    pub fn new(aggregator: BundleAggregator) -> Self {
        Self { aggregator }
    }

    pub fn aggregator(&self) -> &BundleAggregator {
        &self.aggregator
    }

    /// Folds one classified packet into this instance's bundles.
    pub fn record(
        &mut self,
        ctx: &mut TraceContext<'_>,
        key: BundleKey,
        len: usize,
        now_ns: u64,
    ) -> RecordOutcome {
        let outcome = self.aggregator.record_key(ctx, key, len, now_ns);
        ctx.stats().packet_recorded();
        if let RecordOutcome::Flushed { bundles } = outcome {
            ctx.stats().flushed();
            tracing::trace!(instance = %ctx.instance(), bundles, "window flush");
        }
        outcome
    }

    /// Emits every pending bundle. Returns the number of records written.
    pub fn flush(&mut self, ctx: &mut TraceContext<'_>, now_ns: u64) -> usize {
        let emitted = self.aggregator.flush(ctx, now_ns);
        if emitted > 0 {
            ctx.stats().flushed();
        }
        emitted
    }
}

impl DataSource for HciTraceSource {
    fn on_setup(&mut self, args: &SetupArgs<'_>) {
        self.aggregator = BundleAggregator::with_limits(
            args.config.flush_window_ns(),
            args.config.max_bundles,
        );
        debug!(
            instance = %args.instance,
            flush_window_ns = self.aggregator.flush_window_ns(),
            max_bundles = ?args.config.max_bundles,
            "data source instance set up"
        );
    }

    fn on_start(&mut self, args: &StartArgs) {
        debug!(instance = %args.instance, "data source instance started");
    }

    fn on_stop(&mut self, args: &StopArgs) {
        let discarded = self.aggregator.discard();
        info!(
            instance = %args.instance,
            discarded,
            "data source instance stopped"
        );
    }

    fn on_flush(&mut self, ctx: &mut TraceContext<'_>, args: &FlushArgs) {
        let emitted = self.flush(ctx, args.now_ns);
        ctx.flush_sink();
        debug!(instance = %args.instance, emitted, "data source instance flushed");
    }
}
