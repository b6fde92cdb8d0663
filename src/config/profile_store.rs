use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::errors::{KeepError, Result};
use crate::core::models::profile::Profile;

/// Directory under `$HOME` holding the profile store and, by default, the
/// account files.
pub const KEEP_DIR: &str = ".kip";

/// File name of the profile store.
pub const CONFIG_FILE: &str = "keep.conf";

/// Environment variable naming the user's own key, used by the default profile.
pub const DEFAULT_KEY_ENV_VAR: &str = "GPGKEY";

/// The list of profiles read from `keep.conf` (a JSON array).
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
    profiles: Vec<Profile>,
}

impl ProfileStore {
    /// `$HOME/.kip/keep.conf`.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| KeepError::InvalidConfig {
            detail: "cannot determine the home directory".into(),
        })?;
        Ok(home.join(KEEP_DIR).join(CONFIG_FILE))
    }

    /// Load the store at `path`, creating it with a default profile first
    /// when it does not exist.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if !path.exists() {
            let home = dirs::home_dir().ok_or_else(|| KeepError::InvalidConfig {
                detail: "cannot determine the home directory".into(),
            })?;
            let default_key = std::env::var(DEFAULT_KEY_ENV_VAR).unwrap_or_default();
            Self::init(path, default_profile(&home, &default_key))?;
        }
        Self::load(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => KeepError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => KeepError::Io(e),
        })?;
        let profiles: Vec<Profile> =
            serde_json::from_str(&content).map_err(|e| KeepError::InvalidConfig {
                detail: format!("Failed to parse {}: {e}", path.display()),
            })?;

        debug!(path = %path.display(), profiles = profiles.len(), "loaded profile store");
        Ok(Self {
            path: path.to_path_buf(),
            profiles,
        })
    }

    /// Write a new store holding `profile` and create its account directory.
    pub fn init(path: &Path, profile: Profile) -> Result<Self> {
        create_private_dir(Path::new(&profile.account_dir))?;
        if let Some(parent) = path.parent() {
            create_private_dir(parent)?;
        }

        let store = Self {
            path: path.to_path_buf(),
            profiles: vec![profile],
        };
        store.save()?;
        info!(path = %path.display(), "created profile store");
        Ok(store)
    }

    fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.profiles).map_err(|e| {
            KeepError::InvalidConfig {
                detail: format!("cannot serialize profiles: {e}"),
            }
        })?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    /// The profile named `name`, or the first one when no name is given.
    ///
    /// `$VAR` references in the stored paths are expanded against the
    /// process environment.
    pub fn select(&self, name: Option<&str>) -> Result<Profile> {
        let profile = match name {
            Some(name) => self.profiles.iter().find(|p| p.name == name).ok_or_else(|| {
                KeepError::ProfileNotFound {
                    name: name.to_string(),
                    available: self
                        .profiles
                        .iter()
                        .map(|p| p.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                }
            })?,
            None => self.profiles.first().ok_or_else(|| KeepError::InvalidConfig {
                detail: format!("{} holds no profile", self.path.display()),
            })?,
        };

        let lookup = |var: &str| std::env::var(var).ok();
        Ok(Profile {
            secring_dir: expand_vars(&profile.secring_dir, lookup),
            pubring_dir: expand_vars(&profile.pubring_dir, lookup),
            account_dir: expand_vars(&profile.account_dir, lookup),
            ..profile.clone()
        })
    }
}

/// The profile written to a fresh store.
pub fn default_profile(home: &Path, default_key: &str) -> Profile {
    let gnupg = home.join(".gnupg");
    Profile {
        name: "default".into(),
        secring_dir: gnupg.join("secring.gpg").display().to_string(),
        pubring_dir: gnupg.join("pubring.gpg").display().to_string(),
        account_dir: home
            .join(KEEP_DIR)
            .join("passwords")
            .display()
            .to_string(),
        recipient_key_ids: default_key.to_string(),
        signer_key_id: default_key.to_string(),
    }
}

/// Replace `$VAR` and `${VAR}` with their values; unknown variables expand
/// to nothing.
pub fn expand_vars(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        if name.is_empty() {
            out.push('$');
            rest = after;
            continue;
        }
        out.push_str(&lookup(name).unwrap_or_default());
        rest = &after[consumed..];
    }
    out.push_str(rest);
    out
}

fn create_private_dir(dir: &Path) -> Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, account_dir: &str) -> Profile {
        Profile {
            name: name.into(),
            secring_dir: "/k/secring.gpg".into(),
            pubring_dir: "/k/pubring.gpg".into(),
            account_dir: account_dir.into(),
            recipient_key_ids: "AAAA0001".into(),
            signer_key_id: String::new(),
        }
    }

    #[test]
    fn init_writes_store_and_account_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".kip").join(CONFIG_FILE);
        let accounts = dir.path().join(".kip").join("passwords");

        let store = ProfileStore::init(&path, default_profile(dir.path(), "DEADBEEF")).unwrap();

        assert_eq!(store.profiles().len(), 1);
        assert!(accounts.is_dir());
        let loaded = ProfileStore::load(&path).unwrap();
        let default = loaded.select(None).unwrap();
        assert_eq!(default.name, "default");
        assert_eq!(default.recipient_key_ids, "DEADBEEF");
        assert_eq!(default.signer_key_id, "DEADBEEF");
        assert_eq!(Path::new(&default.account_dir), accounts);
    }

    #[cfg(unix)]
    #[test]
    fn init_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let accounts = dir.path().join("passwords");
        ProfileStore::init(&path, profile("p", accounts.to_str().unwrap())).unwrap();

        let file_mode = std::fs::metadata(&path).unwrap().permissions().mode();
        let dir_mode = std::fs::metadata(&accounts).unwrap().permissions().mode();
        assert_eq!(file_mode & 0o777, 0o600);
        assert_eq!(dir_mode & 0o777, 0o700);
    }

    #[test]
    fn select_by_name_or_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let json = serde_json::to_string(&vec![profile("home", "/a"), profile("work", "/b")]).unwrap();
        std::fs::write(&path, json).unwrap();

        let store = ProfileStore::load(&path).unwrap();
        assert_eq!(store.select(None).unwrap().name, "home");
        assert_eq!(store.select(Some("work")).unwrap().account_dir, "/b");

        match store.select(Some("play")).unwrap_err() {
            KeepError::ProfileNotFound { available, .. } => assert_eq!(available, "home, work"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_store_has_no_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[]").unwrap();

        let err = ProfileStore::load(&path).unwrap().select(None).unwrap_err();
        assert!(matches!(err, KeepError::InvalidConfig { .. }));
    }

    #[test]
    fn malformed_store_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            ProfileStore::load(&path),
            Err(KeepError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn expands_plain_and_braced_variables() {
        let lookup = |name: &str| match name {
            "HOME" => Some("/home/alice".to_string()),
            "X" => Some("x".to_string()),
            _ => None,
        };
        assert_eq!(expand_vars("$HOME/.kip", lookup), "/home/alice/.kip");
        assert_eq!(expand_vars("${X}y/$MISSING/z", lookup), "xy//z");
        assert_eq!(expand_vars("cost $5 and $", lookup), "cost  and $");
        assert_eq!(expand_vars("no vars", lookup), "no vars");
    }
}
