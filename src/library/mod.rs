//! Record store and CSV synchronization, split across logical submodules.

mod error;
mod schema;
mod store;
mod sync;

pub use error::{LibraryError, Result};
pub use schema::{match_field, Column, ColumnKind, Header, SchemaIssue};
pub use store::{LoadReport, RecordStore, SortSpec};
pub use sync::{
    import_from_path, load_from_path, read_library, save_to_path, write_library, LoadedLibrary,
};
