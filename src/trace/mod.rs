pub mod record;
pub mod writer;

pub use self::record::{BluetoothTraceEvent, TracePacket, TracePacketType};
pub use self::writer::{bundle_to_packet, write_bundle, TraceWriter};
