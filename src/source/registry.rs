use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::clock;
use crate::config::TracingConfig;
use crate::hci::parse::{classify, should_skip};
use crate::hci::{Direction, PacketType};
use crate::sink::TraceSink;

use super::instance::{HciTraceSource, TraceContext};
use super::stats::TraceStats;
use super::{
    DataSource, DataSourceDescriptor, FlushArgs, InstanceId, SetupArgs, SourceError, StartArgs,
    StopArgs,
};

/// One tracing session bound to a sink.
struct Instance {
    id: InstanceId,
    sink: Arc<dyn TraceSink>,
    source: HciTraceSource,
    started: bool,
}

type SharedInstance = Arc<Mutex<Instance>>;

/// The registered HCI data source type and its live instances.
///
/// Producers only read the started set, which is swapped wholesale on
/// start and stop so the hot path never takes a registry-wide lock.
pub struct HciTracing {
    descriptor: DataSourceDescriptor,
    config: TracingConfig,
    stats: TraceStats,
    next_id: AtomicU64,
    instances: Mutex<HashMap<InstanceId, SharedInstance>>,
    active: ArcSwap<Vec<SharedInstance>>,
}

impl HciTracing {
    /// Registers the data source under `config.data_source_name`.
    pub fn new(config: TracingConfig) -> Self {
        let descriptor = DataSourceDescriptor {
            name: config.data_source_name.clone(),
        };
        info!(
            name = %descriptor.name,
            flush_window = ?config.flush_window,
            "registered data source"
        );

        Self {
            descriptor,
            config,
            stats: TraceStats::new(),
            next_id: AtomicU64::new(1),
            instances: Mutex::new(HashMap::with_capacity(4)),
            active: ArcSwap::from_pointee(Vec::new()),
        }
    }

    pub fn descriptor(&self) -> &DataSourceDescriptor {
        &self.descriptor
    }

    pub fn config(&self) -> &TracingConfig {
        &self.config
    }

    pub fn stats(&self) -> &TraceStats {
        &self.stats
    }

    /// Number of started instances.
    pub fn active_instances(&self) -> usize {
        self.active.load().len()
    }

    /// Creates a new, not yet started instance writing to `sink`.
    pub fn setup(&self, sink: Arc<dyn TraceSink>) -> InstanceId {
        let id = InstanceId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut source = HciTraceSource::default();
        source.on_setup(&SetupArgs {
            instance: id,
            config: &self.config,
        });

        debug!(instance = %id, sink = sink.name(), "set up data source instance");
        let instance = Arc::new(Mutex::new(Instance {
            id,
            sink,
            source,
            started: false,
        }));
        self.instances.lock().insert(id, instance);
        id
    }

    /// Starts recording into the instance. Starting twice is a no-op.
    pub fn start(&self, id: InstanceId) -> Result<(), SourceError> {
        let instance = self.lookup(id)?;
        {
            let mut guard = instance.lock();
            if guard.started {
                return Ok(());
            }
            guard.source.on_start(&StartArgs { instance: id });
            guard.started = true;
        }

        self.active.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(Arc::clone(&instance));
            next
        });
        info!(instance = %id, "started data source instance");
        Ok(())
    }

    /// Stops and removes the instance. Pending bundles are discarded.
    pub fn stop(&self, id: InstanceId) -> Result<(), SourceError> {
        let instance = self
            .instances
            .lock()
            .remove(&id)
            .ok_or(SourceError::UnknownInstance(id))?;

        self.active.rcu(|current| {
            current
                .iter()
                .filter(|other| !Arc::ptr_eq(other, &instance))
                .cloned()
                .collect::<Vec<_>>()
        });

        // A producer that loaded the started set before the swap may still
        // reach this lock; the cleared flag turns its call into a no-op.
        let mut guard = instance.lock();
        guard.started = false;
        guard.source.on_stop(&StopArgs { instance: id });
        Ok(())
    }

    /// Emits the instance's pending bundles and flushes its sink.
    pub fn flush(&self, id: InstanceId) -> Result<(), SourceError> {
        self.flush_with(id, clock::boot_time_ns)
    }

    pub fn flush_at(&self, id: InstanceId, now_ns: u64) -> Result<(), SourceError> {
        self.flush_with(id, || now_ns)
    }

    /// Like [`flush`](Self::flush), reading `now` after the instance lock
    /// is taken.
    fn flush_with<C>(&self, id: InstanceId, now: C) -> Result<(), SourceError>
    where
        C: FnOnce() -> u64,
    {
        let instance = self.lookup(id)?;
        let mut guard = instance.lock();
        let Instance {
            id, sink, source, ..
        } = &mut *guard;
        let mut ctx = TraceContext::new(*id, sink.as_ref(), &self.stats);
        let args = FlushArgs {
            instance: *id,
            now_ns: now(),
        };
        source.on_flush(&mut ctx, &args);
        Ok(())
    }

    /// Runs `f` once for every started instance, holding that instance's
    /// lock for the duration of the call. Returns how many instances ran.
    pub fn trace<F>(&self, mut f: F) -> usize
    where
        F: FnMut(&mut TraceContext<'_>, &mut HciTraceSource),
    {
        let active = self.active.load_full();
        let mut traced = 0;

        for instance in active.iter() {
            let mut guard = instance.lock();
            let Instance {
                id,
                sink,
                source,
                started,
            } = &mut *guard;
            if !*started {
                continue;
            }

            let mut ctx = TraceContext::new(*id, sink.as_ref(), &self.stats);
            f(&mut ctx, source);
            traced += 1;
        }

        traced
    }

    /// Records one HCI packet at the current boot time.
    ///
    /// The clock is read under each instance's lock, so every aggregator
    /// sees non-decreasing timestamps even with concurrent producers.
    pub fn trace_packet(&self, data: &[u8], direction: Direction, packet_type: PacketType) {
        self.trace_packet_with(data, direction, packet_type, clock::boot_time_ns);
    }

    /// Records one HCI packet observed at `now_ns`.
    ///
    /// For single-producer and deterministic callers; the caller keeps
    /// `now_ns` non-decreasing.
    pub fn trace_packet_at(
        &self,
        data: &[u8],
        direction: Direction,
        packet_type: PacketType,
        now_ns: u64,
    ) {
        self.trace_packet_with(data, direction, packet_type, || now_ns);
    }

    /// Records one HCI packet, reading `now` once per started instance
    /// while that instance's lock is held.
    ///
    /// Noise events, malformed packets and packets arriving while no
    /// instance is started are counted and otherwise ignored.
    pub fn trace_packet_with<C>(
        &self,
        data: &[u8],
        direction: Direction,
        packet_type: PacketType,
        mut now: C,
    ) where
        C: FnMut() -> u64,
    {
        self.stats.packet_seen();

        if should_skip(data, packet_type) {
            self.stats.packet_skipped();
            return;
        }

        let key = match classify(data, direction, packet_type) {
            Ok(key) => key,
            Err(err) => {
                self.stats.packet_malformed();
                tracing::trace!(error = %err, "dropping malformed packet");
                return;
            }
        };

        let traced = self.trace(|ctx, source| {
            source.record(ctx, key, data.len(), now());
        });
        if traced == 0 {
            self.stats.packet_inactive();
        }
    }

    fn lookup(&self, id: InstanceId) -> Result<SharedInstance, SourceError> {
        self.instances
            .lock()
            .get(&id)
            .cloned()
            .ok_or(SourceError::UnknownInstance(id))
    }
}

impl std::fmt::Debug for HciTracing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HciTracing")
            .field("name", &self.descriptor.name)
            .field("active_instances", &self.active_instances())
            .finish()
    }
}
