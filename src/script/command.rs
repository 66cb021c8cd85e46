use crate::{
    id::{Namespace, ObjectId, Side},
    source::SourceSpan,
};
use strum::{EnumString, EnumVariantNames};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum CommandName {
    New,
    InsertNew,
    InsertAt,
    ReserveNew,
    Remove,
    Vacate,
    Lookup,
    LookupFlags,
    ForEach,
    Len,
    Clear,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandKind {
    New { side: Side, limit: Option<u32> },
    InsertNew { flag: bool, name: String },
    InsertAt { flag: bool, id: ObjectId, name: String },
    ReserveNew { id: ObjectId },
    Remove { id: ObjectId },
    Vacate { id: ObjectId },
    Lookup { id: ObjectId },
    LookupFlags { id: ObjectId },
    ForEach { stop_at: Option<String> },
    Len { namespace: Namespace },
    Clear,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub kind: CommandKind,
    pub span: SourceSpan,
}

#[derive(Debug, Default)]
pub struct Script {
    pub commands: Vec<Command>,
}
