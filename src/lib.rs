//! Object ID tables for a client/server wire protocol.
//!
//! Both peers of a connection allocate object IDs: the client below
//! [`SERVER_ID_START`], the server from it upwards. An [`ObjectTable`] keeps
//! the objects of both ranges for one side of the connection, recycles freed
//! IDs and caps how many IDs a peer can make it track.

mod error;
mod id;
mod iter;
mod object_table;
mod slots;
pub mod script;
mod source;
mod source_reference;

pub use error::{InvalidIdReason, TableError};
pub use id::{Namespace, ObjectId, Side, MAX_OBJECTS, SERVER_ID_START};
pub use iter::{Iter, IterControl};
pub use object_table::{ObjectTable, TableOpts};
pub use source::{SourceOffset, SourceSpan};
pub use source_reference::SourceReference;
