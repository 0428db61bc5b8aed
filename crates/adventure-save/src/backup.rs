//! Save folder backups.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info, warn};

use crate::dirs::SaveDirs;
use crate::error::SaveError;

const TEMP_SUFFIX: &str = "_temp";

/// A backup that was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub path: PathBuf,
    /// Path relative to the root folder, for log output.
    pub relative: String,
}

/// Copy the save folder to `backups/<save>;<timestamp>[_temp]`.
///
/// Returns `None` if the save folder does not exist yet.
pub fn create_backup(dirs: &SaveDirs, save_name: &str, temporary: bool) -> Result<Option<BackupInfo>, SaveError> {
    let source = dirs.save_folder(save_name);
    if !source.is_dir() {
        info!(save = save_name, "Nothing to back up, save folder does not exist");
        return Ok(None);
    }
    dirs.ensure_backups_folder()?;

    let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let suffix = if temporary { TEMP_SUFFIX } else { "" };
    let base_name = format!("{save_name};{stamp}");
    let mut path = dirs.backups_folder().join(format!("{base_name}{suffix}"));
    let mut n = 1;
    while path.exists() {
        path = dirs.backups_folder().join(format!("{base_name}-{n}{suffix}"));
        n += 1;
    }

    copy_dir_recursive(&source, &path)?;

    let relative = path
        .strip_prefix(dirs.root())
        .unwrap_or(&path)
        .display()
        .to_string();
    info!(save = save_name, backup = %relative, temporary, "Made backup");
    Ok(Some(BackupInfo { path, relative }))
}

/// Delete a backup made by [`create_backup`]. Failures are only logged.
pub fn remove_backup(backup: &BackupInfo) {
    match fs::remove_dir_all(&backup.path) {
        Ok(()) => debug!(backup = %backup.relative, "Removed temporary backup"),
        Err(e) => warn!(backup = %backup.relative, error = %e, "Failed to remove temporary backup"),
    }
}

pub fn copy_dir_recursive(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
