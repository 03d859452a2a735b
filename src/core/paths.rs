use std::path::{Path, PathBuf};

const DEFAULT_DIR_NAME: &str = ".pkb";
const DATABASE_FILE: &str = "pkb.db";

/// On-disk locations used by the knowledge base
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub root: PathBuf,
    pub database: PathBuf,
}

impl DataPaths {
    /// `~/.pkb`, falling back to `./.pkb` when no home directory is known
    pub fn new() -> Self {
        let home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_root(home.join(DEFAULT_DIR_NAME))
    }

    pub fn from_root(root: PathBuf) -> Self {
        Self {
            database: root.join(DATABASE_FILE),
            root,
        }
    }

    /// Keep the root but point at a different database file
    pub fn with_database(mut self, database: &Path) -> Self {
        self.database = database.to_path_buf();
        self
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::new()
    }
}
