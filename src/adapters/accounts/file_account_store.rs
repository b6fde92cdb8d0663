use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::core::errors::{KeepError, Result};
use crate::core::traits::account_store::AccountStore;

/// Account store keeping one armored file per account in a directory.
///
/// The file name is the account name. New files are written to a
/// temporary file in the same directory and moved into place only if
/// nothing exists under that name yet, so an interrupted write never
/// leaves a truncated account behind.
#[derive(Clone)]
pub struct FileAccountStore {
    dir: PathBuf,
}

impl FileAccountStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn validate_name(name: &str) -> Result<()> {
        let invalid = |detail: &str| -> Result<()> {
            Err(KeepError::InvalidAccount {
                detail: format!("'{name}' {detail}"),
            })
        };
        if name.trim().is_empty() {
            return invalid("is empty");
        }
        if name == "." || name == ".." {
            return invalid("is not a valid file name");
        }
        if name.contains(['/', '\\', '\0']) {
            return invalid("must not contain path separators");
        }
        Ok(())
    }
}

impl AccountStore for FileAccountStore {
    fn list(&self, filter: &str) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => KeepError::FileNotFound {
                path: self.dir.clone(),
            },
            _ => KeepError::Io(e),
        })?;

        let filter = filter.to_lowercase();
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            // Names that are not UTF-8 cannot be typed back on the command line.
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.to_lowercase().contains(&filter) {
                names.push(name);
            }
        }
        names.sort();

        debug!(dir = %self.dir.display(), filter = %filter, found = names.len(), "listed accounts");
        Ok(names)
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        Self::validate_name(name)?;
        Ok(self.dir.join(name))
    }

    fn write_new(&self, name: &str, content: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(name)?;

        // tempfile creates the file with mode 0600 on unix.
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.as_file().sync_all()?;
        tmp.persist_noclobber(&path).map_err(|e| match e.error.kind() {
            std::io::ErrorKind::AlreadyExists => KeepError::AccountExists { path: path.clone() },
            _ => KeepError::Io(e.error),
        })?;

        debug!(path = %path.display(), "account written");
        Ok(path)
    }
}
