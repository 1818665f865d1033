//! Bundling tracer for Bluetooth HCI traffic.
//!
//! Packets sharing a direction, type and identifying header field are
//! folded into one bundle; once the flush window has elapsed every pending
//! bundle is written as a single summary record.

pub mod bundle;
pub mod clock;
pub mod config;
pub mod hci;
pub mod replay;
pub mod sink;
pub mod source;
pub mod trace;

pub use crate::source::trace_packet;
