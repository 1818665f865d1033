pub mod parse;

use std::fmt;

/// PacketType identifies the HCI packet class, with the H4 framing byte
/// already stripped by the transport.
/// Discriminants match the H4 packet indicator values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    Cmd = 1,
    Acl = 2,
    Sco = 3,
    Evt = 4,
    Iso = 5,
}

impl PacketType {
    /// Returns the canonical lowercase label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cmd => "cmd",
            Self::Acl => "acl",
            Self::Sco => "sco",
            Self::Evt => "evt",
            Self::Iso => "iso",
        }
    }

    /// Convert from an H4 packet indicator.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Cmd),
            2 => Some(Self::Acl),
            3 => Some(Self::Sco),
            4 => Some(Self::Evt),
            5 => Some(Self::Iso),
            _ => None,
        }
    }

    /// Convert from the canonical label.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "cmd" => Some(Self::Cmd),
            "acl" => Some(Self::Acl),
            "sco" => Some(Self::Sco),
            "evt" => Some(Self::Evt),
            "iso" => Some(Self::Iso),
            _ => None,
        }
    }

    /// Whether this packet type carries a connection handle in its header.
    pub const fn is_data(self) -> bool {
        matches!(self, Self::Acl | Self::Sco | Self::Iso)
    }

    /// Return all packet types in numeric order.
    pub fn all() -> &'static [Self] {
        &[Self::Cmd, Self::Acl, Self::Sco, Self::Evt, Self::Iso]
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a packet relative to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    /// Controller to host.
    Incoming = 0,
    /// Host to controller.
    Outgoing = 1,
}

impl Direction {
    /// Returns the canonical label ("rx" for incoming, "tx" for outgoing).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Incoming => "rx",
            Self::Outgoing => "tx",
        }
    }

    /// Convert from a label. Accepts both rx/tx and in/out spellings.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "rx" | "in" | "incoming" => Some(Self::Incoming),
            "tx" | "out" | "outgoing" => Some(Self::Outgoing),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HCI event codes the tracer treats specially.
/// Values from the Bluetooth Core Specification, Vol 4, Part E, 7.7.
pub mod event_code {
    pub const COMMAND_COMPLETE: u8 = 0x0E;
    pub const COMMAND_STATUS: u8 = 0x0F;
    pub const NUMBER_OF_COMPLETED_PACKETS: u8 = 0x13;
    pub const LE_META_EVENT: u8 = 0x3E;
    pub const VENDOR_SPECIFIC: u8 = 0xFF;

    /// Whether the event carries a subevent code at offset 2.
    pub const fn has_subevent(code: u8) -> bool {
        code == LE_META_EVENT || code == VENDOR_SPECIFIC
    }
}

/// 12-bit connection handle carried in ACL, SCO and ISO headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionHandle(u16);

impl ConnectionHandle {
    /// Mask selecting the handle bits; the upper four bits are
    /// packet-boundary and broadcast flags.
    pub const MASK: u16 = 0x0FFF;

    /// Builds a handle from a raw header word, discarding the flag bits.
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw & Self::MASK)
    }

    pub const fn value(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#05x}", self.0)
    }
}
