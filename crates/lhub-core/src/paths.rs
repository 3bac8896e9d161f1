//! Config directory layout and store file naming

use crate::error::{Error, Result};
use lhub_crypto::KeyOptions;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the config directory
pub const CONFIG_DIR_ENV: &str = "LHUB_CONFIG_DIR";

/// Directory name under the home directory
pub const CONFIG_DIR_NAME: &str = ".logichub";

/// File name of the default credential store
pub const CREDENTIALS_FILE: &str = "credentials";

/// File name of the preferences file
pub const PREFERENCES_FILE: &str = "preferences";

const BACKUP_EXTENSION: &str = ".bak";
const TEMP_EXTENSION: &str = ".tmp";

/// `$LHUB_CONFIG_DIR` if set, otherwise `~/.logichub`
pub fn default_config_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME))
        .ok_or(Error::NoConfigDir)
}

/// Where one credential store lives and which keys protect it.
///
/// Every store and key pair is built from one of these; nothing is read from
/// process-wide state after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding the store file, its backups and the key pair
    pub root: PathBuf,
    /// Store file name inside `root`
    pub credentials_file: String,
    /// Key file names and key size
    pub keys: KeyOptions,
}

impl StoreConfig {
    /// Default store (`credentials`) in `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            credentials_file: CREDENTIALS_FILE.to_string(),
            keys: KeyOptions::default(),
        }
    }

    /// Switch to the alternate store `credentials-<suffix>`.
    ///
    /// `None` or an empty suffix keeps the default store.
    pub fn alternate(mut self, suffix: Option<&str>) -> Result<Self> {
        self.credentials_file = store_file_name(suffix)?;
        Ok(self)
    }

    /// Override key file names and size
    #[must_use]
    pub fn with_keys(mut self, keys: KeyOptions) -> Self {
        self.keys = keys;
        self
    }

    /// Full path of the store file
    #[must_use]
    pub fn credentials_path(&self) -> PathBuf {
        self.root.join(&self.credentials_file)
    }

    /// Full path of the preferences file
    #[must_use]
    pub fn preferences_path(&self) -> PathBuf {
        self.root.join(PREFERENCES_FILE)
    }

    /// Suffix of an alternate store, `None` for the default one
    #[must_use]
    pub fn suffix(&self) -> Option<&str> {
        self.credentials_file
            .strip_prefix(CREDENTIALS_FILE)
            .and_then(|rest| rest.strip_prefix('-'))
    }
}

fn store_file_name(suffix: Option<&str>) -> Result<String> {
    let suffix = match suffix.map(str::trim) {
        None | Some("") => return Ok(CREDENTIALS_FILE.to_string()),
        Some(s) => s,
    };

    if suffix.contains(['/', '\\']) || suffix == "." || suffix == ".." {
        return Err(Error::Validation(format!(
            "credentials file suffix {:?} must not contain path separators",
            suffix
        )));
    }
    if is_auxiliary(suffix) {
        return Err(Error::Validation(format!(
            "credentials file suffix {:?} must not end in {} or {}",
            suffix, BACKUP_EXTENSION, TEMP_EXTENSION
        )));
    }
    Ok(format!("{}-{}", CREDENTIALS_FILE, suffix))
}

fn is_auxiliary(name: &str) -> bool {
    name.ends_with(BACKUP_EXTENSION) || name.ends_with(TEMP_EXTENSION)
}

/// One credential store file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreFile {
    /// File name, e.g. `credentials-acme`
    pub file_name: String,
    /// Alternate store suffix, `None` for the default store
    pub suffix: Option<String>,
}

/// Every credential store in `dir`, default first, then alternates by name.
///
/// Backups and temporary files are skipped.
pub fn list_credential_files(dir: &Path) -> Result<Vec<StoreFile>> {
    if !dir.is_dir() {
        return Err(Error::PathNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(Error::io(dir))? {
        let entry = entry.map_err(Error::io(dir))?;
        if !entry.path().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if is_auxiliary(&name) {
            continue;
        }
        if name == CREDENTIALS_FILE {
            files.push(StoreFile {
                file_name: name,
                suffix: None,
            });
        } else if let Some(suffix) = name.strip_prefix(CREDENTIALS_FILE).and_then(|r| r.strip_prefix('-')) {
            if !suffix.is_empty() {
                files.push(StoreFile {
                    suffix: Some(suffix.to_string()),
                    file_name: name,
                });
            }
        }
    }

    files.sort_by(|a, b| a.suffix.cmp(&b.suffix));
    Ok(files)
}
