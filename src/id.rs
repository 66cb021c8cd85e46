use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt::{self, Debug, Display};
use strum::EnumString;

/// First ID of the server-allocated namespace. Everything below it belongs to
/// the client.
pub const SERVER_ID_START: u32 = 0xff00_0000;

/// Hard cap on the number of slots a single namespace may hold.
pub const MAX_OBJECTS: u32 = 0x00f0_0000;

/// Which peer a table belongs to. The discriminants are the values used on
/// the wire and by the bootstrap code.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    TryFromPrimitive,
    IntoPrimitive,
    EnumString,
    strum::Display,
)]
#[repr(u32)]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    Server = 0,
    Client = 1,
}

impl Side {
    /// The namespace this side allocates new IDs in.
    pub fn own_namespace(self) -> Namespace {
        match self {
            Side::Client => Namespace::Low,
            Side::Server => Namespace::High,
        }
    }

    /// The namespace the peer allocates in. A side may only pre-register
    /// IDs here.
    pub fn peer_namespace(self) -> Namespace {
        self.own_namespace().other()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Namespace {
    /// Client-allocated IDs, starting at 0.
    Low,
    /// Server-allocated IDs, starting at [`SERVER_ID_START`].
    High,
}

impl Namespace {
    pub fn base(self) -> u32 {
        match self {
            Namespace::Low => 0,
            Namespace::High => SERVER_ID_START,
        }
    }

    pub fn other(self) -> Namespace {
        match self {
            Namespace::Low => Namespace::High,
            Namespace::High => Namespace::Low,
        }
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            Namespace::Low => 0,
            Namespace::High => 1,
        }
    }
}

/// A protocol object ID.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u32);

impl ObjectId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Rebuilds an ID from a namespace and an index inside it. Returns `None`
    /// for indices past [`MAX_OBJECTS`].
    pub fn from_parts(namespace: Namespace, index: u32) -> Option<Self> {
        if index >= MAX_OBJECTS {
            return None;
        }
        namespace.base().checked_add(index).map(Self)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub fn namespace(self) -> Namespace {
        if self.0 < SERVER_ID_START {
            Namespace::Low
        } else {
            Namespace::High
        }
    }

    /// Index of this ID inside its namespace.
    pub fn index(self) -> u32 {
        self.0 - self.namespace().base()
    }

    pub fn split(self) -> (Namespace, u32) {
        (self.namespace(), self.index())
    }
}

impl From<u32> for ObjectId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<ObjectId> for u32 {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({:#x})", self.0)
    }
}
