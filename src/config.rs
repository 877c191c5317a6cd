//! Command-line options and the paths derived from them.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use clap::Parser;
use directories::BaseDirs;

use crate::logging::default_log_level;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".tome-todo-list";
/// Library file stored inside the application data directory.
const LIBRARY_FILE_NAME: &str = "my_library.csv";
/// Log folder inside the application data directory.
const LOG_DIR_NAME: &str = "logs";
/// Path suggested by the first-run import prompt.
pub const DEFAULT_IMPORT_SUGGESTION: &str = "goodreads_library_export.csv";

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Terminal reading log backed by a CSV file", long_about = None)]
pub struct Cli {
    /// Library CSV to open (default: ~/.tome-todo-list/my_library.csv)
    #[arg(long)]
    pub library: Option<PathBuf>,
    /// CSV export to import when the library file does not exist yet
    #[arg(long)]
    pub import: Option<PathBuf>,
    /// trace|debug|info|warn|error
    #[arg(long)]
    pub log_level: Option<String>,
    /// Directory for rotating log files
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub library_path: PathBuf,
    pub import_path: Option<PathBuf>,
    pub log_level: String,
    pub log_dir: PathBuf,
}

impl Config {
    /// Resolve options against the user's home directory.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        Ok(Self::resolve(cli, &data_dir()?))
    }

    /// Fill every option the user left out with a default under `data_dir`.
    pub fn resolve(cli: Cli, data_dir: &Path) -> Self {
        Self {
            library_path: cli
                .library
                .unwrap_or_else(|| data_dir.join(LIBRARY_FILE_NAME)),
            import_path: cli.import,
            log_level: cli
                .log_level
                .unwrap_or_else(|| default_log_level().to_string()),
            log_dir: cli.log_dir.unwrap_or_else(|| data_dir.join(LOG_DIR_NAME)),
        }
    }
}

/// Resolve the application data directory inside the user's home.
fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_live_under_the_data_dir() {
        let config = Config::resolve(Cli::default(), Path::new("/home/reader/.tome-todo-list"));

        assert_eq!(
            config.library_path,
            PathBuf::from("/home/reader/.tome-todo-list/my_library.csv")
        );
        assert_eq!(config.log_dir, PathBuf::from("/home/reader/.tome-todo-list/logs"));
        assert_eq!(config.import_path, None);
        assert_eq!(config.log_level, default_log_level());
    }

    #[test]
    fn explicit_options_win() {
        let cli = Cli::parse_from([
            "tome-todo-list",
            "--library",
            "books.csv",
            "--import",
            "export.csv",
            "--log-level",
            "warn",
        ]);
        let config = Config::resolve(cli, Path::new("/unused"));

        assert_eq!(config.library_path, PathBuf::from("books.csv"));
        assert_eq!(config.import_path, Some(PathBuf::from("export.csv")));
        assert_eq!(config.log_level, "warn");
    }
}
