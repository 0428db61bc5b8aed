//! Save folder layout.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use adventure_json::codec::SAVE_EXT;

use crate::error::SaveError;

pub const SAVES_FOLDER: &str = "saves";
pub const BACKUPS_FOLDER: &str = "backups";
pub const SAVE_FILE_NAME_DATA: &str = "data";
pub const DEFAULT_SAVE_NAME: &str = "save";

const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', ';'];

/// Paths of the saves and backups folders under a root folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveDirs {
    root: PathBuf,
}

impl SaveDirs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn saves_folder(&self) -> PathBuf {
        self.root.join(SAVES_FOLDER)
    }

    pub fn backups_folder(&self) -> PathBuf {
        self.root.join(BACKUPS_FOLDER)
    }

    pub fn save_folder(&self, save_name: &str) -> PathBuf {
        self.saves_folder().join(save_name)
    }

    pub fn data_file(&self, save_name: &str) -> PathBuf {
        self.save_folder(save_name)
            .join(format!("{SAVE_FILE_NAME_DATA}.{SAVE_EXT}"))
    }

    pub fn ensure_saves_folder(&self) -> io::Result<()> {
        fs::create_dir_all(self.saves_folder())
    }

    pub fn ensure_backups_folder(&self) -> io::Result<()> {
        fs::create_dir_all(self.backups_folder())
    }

    /// A folder name derived from `display_name` that no existing save uses.
    pub fn correct_save_name(&self, display_name: &str) -> String {
        let cleaned: String = display_name
            .chars()
            .filter(|c| !c.is_control() && !ILLEGAL_CHARS.contains(c))
            .collect();
        let cleaned = cleaned.trim().trim_end_matches('.').trim();
        let base = if cleaned.is_empty() {
            DEFAULT_SAVE_NAME.to_string()
        } else {
            cleaned.to_string()
        };

        let mut name = base.clone();
        let mut n = 1;
        while self.save_folder(&name).exists() {
            name = format!("{base}_{n}");
            n += 1;
        }
        name
    }
}

/// Reject names that would escape the saves folder.
pub fn validate_save_name(save_name: &str) -> Result<(), SaveError> {
    let invalid = save_name.is_empty()
        || save_name == "."
        || save_name == ".."
        || save_name.contains(&['/', '\\'][..])
        || save_name.chars().any(char::is_control);
    if invalid {
        return Err(SaveError::InvalidSaveName(save_name.to_string()));
    }
    Ok(())
}
