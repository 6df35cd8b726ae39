//! Domain event pipeline: handle, writer, and persistent store.

mod event;
mod handle;
mod sqlite;
mod store;
mod writer;

pub use event::*;
pub use handle::*;
pub use sqlite::*;
pub use store::*;
pub use writer::*;
