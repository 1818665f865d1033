use crate::hci::{ConnectionHandle, Direction, PacketType};

/// Data packet class, the three HCI packet types that carry a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Acl,
    Sco,
    Iso,
}

impl DataKind {
    pub const fn packet_type(self) -> PacketType {
        match self {
            Self::Acl => PacketType::Acl,
            Self::Sco => PacketType::Sco,
            Self::Iso => PacketType::Iso,
        }
    }
}

/// The type-specific part of a bundle key.
/// Each variant holds exactly the fields that are meaningful for its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Command {
        op_code: u16,
    },
    Event {
        event_code: u8,
        /// Present only for LE Meta and Vendor Specific events.
        subevent_code: Option<u8>,
    },
    Data {
        kind: DataKind,
        handle: ConnectionHandle,
    },
}

/// Grouping key for packets folded into one bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BundleKey {
    pub direction: Direction,
    pub class: Classification,
}

impl BundleKey {
    pub const fn command(direction: Direction, op_code: u16) -> Self {
        Self {
            direction,
            class: Classification::Command { op_code },
        }
    }

    pub const fn event(direction: Direction, event_code: u8, subevent_code: Option<u8>) -> Self {
        Self {
            direction,
            class: Classification::Event {
                event_code,
                subevent_code,
            },
        }
    }

    pub const fn data(direction: Direction, kind: DataKind, handle: ConnectionHandle) -> Self {
        Self {
            direction,
            class: Classification::Data { kind, handle },
        }
    }

    pub const fn packet_type(&self) -> PacketType {
        match self.class {
            Classification::Command { .. } => PacketType::Cmd,
            Classification::Event { .. } => PacketType::Evt,
            Classification::Data { kind, .. } => kind.packet_type(),
        }
    }

    pub const fn op_code(&self) -> Option<u16> {
        match self.class {
            Classification::Command { op_code } => Some(op_code),
            _ => None,
        }
    }

    pub const fn event_code(&self) -> Option<u8> {
        match self.class {
            Classification::Event { event_code, .. } => Some(event_code),
            _ => None,
        }
    }

    pub const fn subevent_code(&self) -> Option<u8> {
        match self.class {
            Classification::Event { subevent_code, .. } => subevent_code,
            _ => None,
        }
    }

    /// Connection handle value, without flag bits.
    pub const fn handle(&self) -> Option<u16> {
        match self.class {
            Classification::Data { handle, .. } => Some(handle.value()),
            _ => None,
        }
    }
}
