//! Ratatui front-end for the reading log. The table, its forms and dialogs
//! live in submodules; only the app state and the event loop are public.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
