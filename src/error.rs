use crate::id::{Namespace, ObjectId};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    #[error("No room for another object in the {namespace} namespace")]
    #[diagnostic(help("a peer that keeps allocating IDs should be disconnected"))]
    AllocationFailed { namespace: Namespace },
    #[error("Invalid object id {id}: {reason}")]
    InvalidId { id: ObjectId, reason: InvalidIdReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum InvalidIdReason {
    #[strum(serialize = "belongs to this side's own namespace")]
    WrongNamespace,
    #[strum(serialize = "slot is already occupied")]
    Occupied,
    #[strum(serialize = "skips ahead of the next free index")]
    SkipsAhead,
    #[strum(serialize = "index is past the slot limit")]
    OutOfRange,
}

impl TableError {
    pub(crate) fn invalid(id: ObjectId, reason: InvalidIdReason) -> Self {
        TableError::InvalidId { id, reason }
    }
}
