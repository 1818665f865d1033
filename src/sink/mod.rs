mod memory;
mod ndjson;

use thiserror::Error;

use crate::trace::TracePacket;

pub use self::memory::MemorySink;
pub use self::ndjson::NdjsonSink;

/// Errors a sink can report for a single write or flush.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("writing trace record: {0}")]
    Io(#[from] std::io::Error),

    #[error("serializing trace record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("sink {name} is closed")]
    Closed { name: String },
}

/// TraceSink consumes finished trace packets.
///
/// Writes happen while the producing instance holds its lock, so
/// implementations must return promptly. A failed write loses that one
/// record; callers never retry.
pub trait TraceSink: Send + Sync {
    /// Returns the sink's name for logging.
    fn name(&self) -> &str;

    /// Publish one record.
    fn write_packet(&self, packet: TracePacket) -> Result<(), SinkError>;

    /// Push any buffered records to their destination.
    fn flush(&self) -> Result<(), SinkError>;
}
