//! Dated backups and atomic rewrites of store files

use crate::error::{Error, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// `<file>.<YYYY-MM-DD>.bak` next to `path`
pub(crate) fn backup_path(path: &Path, date: NaiveDate) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.bak", date.format("%Y-%m-%d")));
    path.with_file_name(name)
}

/// Copy `path` to its backup for `date` unless that backup already exists.
///
/// Returns the backup path when one was written.
pub(crate) fn backup_once_per_day(path: &Path, date: NaiveDate) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }

    let target = backup_path(path, date);
    if target.exists() {
        debug!(backup = %target.display(), "Backup for today already exists");
        return Ok(None);
    }

    std::fs::copy(path, &target).map_err(Error::io(&target))?;
    info!(backup = %target.display(), "Backed up credentials file");
    Ok(Some(target))
}

/// Replace `path` with `contents` through a temp file in the same directory
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let mut temp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    std::fs::write(&temp_path, contents).map_err(Error::io(&temp_path))?;
    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(Error::Io {
            path: path.to_path_buf(),
            source: e,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_backup_path() {
        assert_eq!(
            backup_path(Path::new("/x/credentials-acme"), day(5)),
            PathBuf::from("/x/credentials-acme.2024-03-05.bak")
        );
    }

    #[test]
    fn test_backup_not_overwritten_same_day() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("credentials");

        std::fs::write(&file, "first").unwrap();
        let written = backup_once_per_day(&file, day(1)).unwrap();
        assert!(written.is_some());

        std::fs::write(&file, "second").unwrap();
        assert!(backup_once_per_day(&file, day(1)).unwrap().is_none());
        assert_eq!(std::fs::read_to_string(backup_path(&file, day(1))).unwrap(), "first");

        assert!(backup_once_per_day(&file, day(2)).unwrap().is_some());
        assert_eq!(std::fs::read_to_string(backup_path(&file, day(2))).unwrap(), "second");
    }

    #[test]
    fn test_missing_file_has_no_backup() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("credentials");
        assert!(backup_once_per_day(&file, day(1)).unwrap().is_none());
    }

    #[test]
    fn test_write_atomic_leaves_no_temp() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("credentials");
        write_atomic(&file, "[a]\n").unwrap();
        write_atomic(&file, "[b]\n").unwrap();

        assert_eq!(std::fs::read_to_string(&file).unwrap(), "[b]\n");
        assert!(!temp_dir.path().join("credentials.tmp").exists());
    }
}
