use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::{SinkError, TraceSink};
use crate::trace::TracePacket;

/// Collects records in memory. Used by tests and embedders that inspect
/// output directly.
pub struct MemorySink {
    name: String,
    packets: Mutex<Vec<TracePacket>>,
    closed: AtomicBool,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            packets: Mutex::new(Vec::with_capacity(64)),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns a copy of every record written so far.
    pub fn packets(&self) -> Vec<TracePacket> {
        self.packets.lock().clone()
    }

    /// Removes and returns every record written so far.
    pub fn take(&self) -> Vec<TracePacket> {
        std::mem::take(&mut *self.packets.lock())
    }

    pub fn len(&self) -> usize {
        self.packets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.lock().is_empty()
    }

    /// Rejects all later writes with [`SinkError::Closed`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

impl TraceSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_packet(&self, packet: TracePacket) -> Result<(), SinkError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SinkError::Closed {
                name: self.name.clone(),
            });
        }
        self.packets.lock().push(packet);
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }
}
