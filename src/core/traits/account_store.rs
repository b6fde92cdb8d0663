use std::path::PathBuf;

use crate::core::errors::Result;

/// Port for the directory holding one encrypted file per account.
pub trait AccountStore {
    /// Account names containing `filter` (case-insensitive), sorted.
    fn list(&self, filter: &str) -> Result<Vec<String>>;

    /// Location of the file backing account `name`.
    fn path_for(&self, name: &str) -> Result<PathBuf>;

    /// Create the file for `name`. Fails if it already exists.
    fn write_new(&self, name: &str, content: &[u8]) -> Result<PathBuf>;
}
