//! User preferences (`~/.logichub/preferences`)

use crate::credentials::write_atomic;
use crate::error::{Error, Result};
use crate::ini::{self, Document};
use crate::paths::PREFERENCES_FILE;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Instance used when a command is given no alias
pub const DEFAULT_INSTANCE: &str = "main.default_instance";

/// Table style for printed results
pub const TABLE_STYLE: &str = "commands.table_style";

/// Every key that can be set
pub const KNOWN_KEYS: [&str; 2] = [DEFAULT_INSTANCE, TABLE_STYLE];

/// Sections written into a fresh file
const SECTIONS: [&str; 2] = ["main", "commands"];

/// Preferences file contents
#[derive(Debug, Clone)]
pub struct Preferences {
    path: PathBuf,
    document: Document,
}

impl Preferences {
    /// Load the preferences in `dir`, creating the file with empty sections if missing
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::PathNotFound {
                path: dir.to_path_buf(),
            });
        }

        let path = dir.join(PREFERENCES_FILE);
        if !path.exists() {
            let mut prefs = Self {
                path,
                document: Document::new(),
            };
            for section in SECTIONS {
                prefs.document.entry(section);
            }
            prefs.save()?;
            info!(path = %prefs.path.display(), "Created preferences file");
            return Ok(prefs);
        }

        let text = std::fs::read_to_string(&path).map_err(Error::io(&path))?;
        let document = ini::parse(&text).map_err(|e| Error::Format {
            path: path.clone(),
            line: e.line,
            message: e.message,
        })?;
        Ok(Self { path, document })
    }

    /// Write the preferences back to disk
    pub fn save(&self) -> Result<()> {
        write_atomic(&self.path, &self.document.render())?;
        debug!(path = %self.path.display(), "Saved preferences");
        Ok(())
    }

    /// Path of the preferences file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value of a known key
    pub fn get(&self, key: &str) -> Result<Option<&str>> {
        let (section, field) = split_key(key)?;
        Ok(self
            .document
            .section(section)
            .and_then(|s| s.get(field))
            .filter(|v| !v.trim().is_empty()))
    }

    /// Set a known key. A blank value clears it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        if value.is_empty() {
            return self.unset(key);
        }
        ini::check_value(value).map_err(|e| Error::Validation(format!("{} {}", key, e)))?;
        let (section, field) = split_key(key)?;
        self.document.entry(section).set(field, value);
        Ok(())
    }

    /// Clear a known key
    pub fn unset(&mut self, key: &str) -> Result<()> {
        let (section, field) = split_key(key)?;
        if let Some(s) = self.document.section_mut(section) {
            s.remove(field);
        }
        Ok(())
    }

    /// Default instance alias, if one is set
    #[must_use]
    pub fn default_instance(&self) -> Option<&str> {
        self.get(DEFAULT_INSTANCE).ok().flatten()
    }

    /// Preferred table style name, if one is set
    #[must_use]
    pub fn table_style(&self) -> Option<&str> {
        self.get(TABLE_STYLE).ok().flatten()
    }

    /// All known keys with their current values
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, Option<String>)> {
        KNOWN_KEYS
            .iter()
            .map(|key| (*key, self.get(key).ok().flatten().map(str::to_string)))
            .collect()
    }
}

/// Map `section.field` (or the bare field name) to its parts
fn split_key(key: &str) -> Result<(&'static str, &'static str)> {
    let key = key.trim();
    KNOWN_KEYS
        .iter()
        .copied()
        .find(|known| *known == key || known.rsplit('.').next() == Some(key))
        .and_then(|known| known.split_once('.'))
        .ok_or_else(|| {
            Error::Validation(format!(
                "unknown preference {:?} (expected one of: {})",
                key,
                KNOWN_KEYS.join(", ")
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_created_with_empty_sections() {
        let temp_dir = TempDir::new().unwrap();
        let prefs = Preferences::load(temp_dir.path()).unwrap();

        assert_eq!(
            std::fs::read_to_string(prefs.path()).unwrap(),
            "[commands]\n\n[main]\n"
        );
        assert_eq!(prefs.default_instance(), None);
    }

    #[test]
    fn test_set_save_reload() {
        let temp_dir = TempDir::new().unwrap();
        let mut prefs = Preferences::load(temp_dir.path()).unwrap();
        prefs.set(DEFAULT_INSTANCE, "prod").unwrap();
        prefs.set("table_style", "grid").unwrap();
        prefs.save().unwrap();

        let reloaded = Preferences::load(temp_dir.path()).unwrap();
        assert_eq!(reloaded.default_instance(), Some("prod"));
        assert_eq!(reloaded.table_style(), Some("grid"));
    }

    #[test]
    fn test_blank_value_clears() {
        let temp_dir = TempDir::new().unwrap();
        let mut prefs = Preferences::load(temp_dir.path()).unwrap();
        prefs.set("default_instance", "prod").unwrap();
        prefs.set("default_instance", "  ").unwrap();
        assert_eq!(prefs.default_instance(), None);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut prefs = Preferences::load(temp_dir.path()).unwrap();
        let err = prefs.set("main.colour", "blue").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_unwritable_value_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut prefs = Preferences::load(temp_dir.path()).unwrap();
        for value in ["two\nlines", r#"a"""b'"#] {
            let err = prefs.set("main.default_instance", value).unwrap_err();
            assert!(matches!(err, Error::Validation(ref m) if m.starts_with("main.default_instance")));
        }
        assert_eq!(prefs.default_instance(), None);
    }
}
