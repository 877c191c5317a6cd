//! Binary entry point: resolve paths, start file logging, load or import the
//! library, then hand control to the Ratatui event loop.
use anyhow::Context;
use clap::Parser;
use log::info;

use tome_todo_list::config::{Cli, Config, DEFAULT_IMPORT_SUGGESTION};
use tome_todo_list::logging::init_logging;
use tome_todo_list::{import_from_path, load_from_path, run_app, save_to_path, App};

fn main() -> anyhow::Result<()> {
    let config = Config::from_cli(Cli::parse())?;

    // Keep the handle alive so buffered log lines are flushed on exit.
    let _logger = match init_logging(&config.log_level, &config.log_dir) {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("warning: file logging disabled: {err:#}");
            None
        }
    };

    if let Some(parent) = config.library_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create library directory `{}`", parent.display())
            })?;
        }
    }

    let library_exists = config
        .library_path
        .try_exists()
        .with_context(|| format!("cannot access `{}`", config.library_path.display()))?;

    let mut app = if library_exists {
        let loaded = load_from_path(&config.library_path)?;
        let mut app = App::new(loaded.store, config.library_path.clone());
        app.report_load(&loaded.report);
        app
    } else if let Some(import_path) = &config.import_path {
        let loaded = import_from_path(import_path)?;
        save_to_path(&config.library_path, &loaded.store)?;
        info!(
            "event=library_create path={} source={}",
            config.library_path.display(),
            import_path.display()
        );
        let mut app = App::new(loaded.store, config.library_path.clone());
        app.report_load(&loaded.report);
        app
    } else {
        App::first_run(config.library_path.clone(), DEFAULT_IMPORT_SUGGESTION)
    };

    run_app(&mut app)
}
