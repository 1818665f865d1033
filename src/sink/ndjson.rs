use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use parking_lot::Mutex;

use super::{SinkError, TraceSink};
use crate::trace::TracePacket;

/// Writes records as newline-delimited JSON.
///
/// With `pretty` set each record spans several lines. That output is for
/// people reading a terminal and is no longer line-delimited; parse it as a
/// stream of concatenated JSON values.
pub struct NdjsonSink {
    name: String,
    pretty: bool,
    out: Mutex<Output>,
}

struct Output {
    writer: BufWriter<Box<dyn Write + Send>>,
    // Each record is encoded here first so a serialization error never
    // leaves half a record in the writer.
    scratch: Vec<u8>,
}

impl NdjsonSink {
    pub fn new(name: impl Into<String>, writer: Box<dyn Write + Send>, pretty: bool) -> Self {
        Self {
            name: name.into(),
            pretty,
            out: Mutex::new(Output {
                writer: BufWriter::with_capacity(64 * 1024, writer),
                scratch: Vec::with_capacity(512),
            }),
        }
    }

    /// Creates (or truncates) `path` and writes records to it.
    pub fn create(path: &Path, pretty: bool) -> Result<Self, SinkError> {
        let file = File::create(path)?;
        let name = path.display().to_string();
        Ok(Self::new(name, Box::new(file), pretty))
    }

    pub fn stdout(pretty: bool) -> Self {
        Self::new("stdout", Box::new(std::io::stdout()), pretty)
    }
}

impl TraceSink for NdjsonSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_packet(&self, packet: TracePacket) -> Result<(), SinkError> {
        let mut out = self.out.lock();
        let Output { writer, scratch } = &mut *out;
        encode(scratch, &packet, self.pretty)?;
        writer.write_all(scratch)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        self.out.lock().writer.flush()?;
        Ok(())
    }
}

/// Replaces the contents of `scratch` with one newline-terminated record.
fn encode(scratch: &mut Vec<u8>, packet: &TracePacket, pretty: bool) -> Result<(), SinkError> {
    scratch.clear();
    if pretty {
        serde_json::to_writer_pretty(&mut *scratch, packet)?;
    } else {
        serde_json::to_writer(&mut *scratch, packet)?;
    }
    scratch.push(b'\n');
    Ok(())
}
