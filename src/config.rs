// ⚙️ Config - Where the ledger lives and how loud we log

use std::path::{Path, PathBuf};

const APP_DIR: &str = "expense-tracker";
const DB_FILE: &str = "ledger.db";

pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_level: String,
    /// `None` logs to stderr
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_file: None,
        }
    }
}

impl Config {
    /// Flags (or their env fallbacks) override the defaults
    pub fn resolve(db_path: Option<PathBuf>, log_level: Option<String>) -> Self {
        let defaults = Config::default();
        Self {
            db_path: db_path.unwrap_or(defaults.db_path),
            log_level: log_level
                .filter(|level| !level.trim().is_empty())
                .unwrap_or(defaults.log_level),
            log_file: None,
        }
    }

    /// Send logs to a file next to the database (TUI mode)
    pub fn with_log_beside_db(mut self) -> Self {
        self.log_file = Some(log_path_for(&self.db_path));
        self
    }
}

/// `<data dir>/expense-tracker/ledger.db`, or `./ledger.db` when the
/// platform has no data directory.
pub fn default_db_path() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join(APP_DIR).join(DB_FILE),
        None => PathBuf::from(DB_FILE),
    }
}

pub fn log_path_for(db_path: &Path) -> PathBuf {
    db_path.with_extension("log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_db_path_ends_with_ledger() {
        assert!(default_db_path().ends_with(DB_FILE));
    }

    #[test]
    fn test_resolve_prefers_flags() {
        let config = Config::resolve(Some(PathBuf::from("/tmp/x.db")), Some("debug".to_string()));
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn test_blank_level_falls_back() {
        let config = Config::resolve(None, Some("  ".to_string()));
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_tui_log_beside_db() {
        let config = Config::resolve(Some(PathBuf::from("/data/ledger.db")), None).with_log_beside_db();
        assert_eq!(config.log_file, Some(PathBuf::from("/data/ledger.log")));
    }
}
