//! Core library surface for the Tome Todo List reading log.
//!
//! The binary only wires these pieces together: `library` owns the records and
//! the CSV file, `ui` draws them, `config` and `logging` set up the process.
pub mod config;
pub mod library;
pub mod logging;
pub mod models;
pub mod ui;

/// Loading and saving the library file.
pub use library::{
    import_from_path, load_from_path, save_to_path, LibraryError, LoadReport, LoadedLibrary,
    RecordStore,
};

/// The record types other layers manipulate.
pub use models::{BookChanges, BookDraft, BookRecord, Field, Rating, RecordId};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
