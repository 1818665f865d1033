//! Data source lifecycle: instance setup, start, stop and flush, and the
//! process-wide packet entry point.

mod instance;
mod registry;
pub mod stats;

use std::fmt;
use std::sync::OnceLock;

use thiserror::Error;

use crate::config::TracingConfig;
use crate::hci::{Direction, PacketType};

pub use self::instance::{HciTraceSource, TraceContext};
pub use self::registry::HciTracing;
pub use self::stats::{StatsSnapshot, TraceStats};

/// Name the HCI data source registers under by default.
pub const DATA_SOURCE_NAME: &str = "android.bluetooth_tracing";

/// Identifies one tracing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Registration record for a data source type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceDescriptor {
    pub name: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("unknown data source instance {0}")]
    UnknownInstance(InstanceId),
}

pub struct SetupArgs<'a> {
    pub instance: InstanceId,
    pub config: &'a TracingConfig,
}

pub struct StartArgs {
    pub instance: InstanceId,
}

pub struct StopArgs {
    pub instance: InstanceId,
}

pub struct FlushArgs {
    pub instance: InstanceId,
    /// Boot-time nanoseconds the flush restarts the window at.
    pub now_ns: u64,
}

/// Host-driven lifecycle callbacks of one data source instance.
///
/// Every callback runs with the instance lock held. All default to no-ops.
pub trait DataSource {
    fn on_setup(&mut self, _args: &SetupArgs<'_>) {}

    fn on_start(&mut self, _args: &StartArgs) {}

    fn on_stop(&mut self, _args: &StopArgs) {}

    fn on_flush(&mut self, _ctx: &mut TraceContext<'_>, _args: &FlushArgs) {}
}

static GLOBAL: OnceLock<HciTracing> = OnceLock::new();

/// Registers the process-wide data source. Later calls return the
/// already-registered one and ignore `config`.
pub fn initialize(config: &TracingConfig) -> &'static HciTracing {
    GLOBAL.get_or_init(|| HciTracing::new(config.clone()))
}

/// Returns the process-wide data source if [`initialize`] has run.
pub fn instance() -> Option<&'static HciTracing> {
    GLOBAL.get()
}

/// Records one HCI packet on the process-wide data source.
/// Does nothing before [`initialize`].
pub fn trace_packet(data: &[u8], direction: Direction, packet_type: PacketType) {
    if let Some(tracing) = GLOBAL.get() {
        tracing.trace_packet(data, direction, packet_type);
    }
}
