//! Reading save headers for the save picker.

use std::fs;

use adventure_json::codec;
use chrono::Local;
use tracing::error;

use crate::dirs::SaveDirs;
use crate::error::SaveError;
use crate::save_data::{DisplayData, DISPLAY_DOCUMENT};

const GREEN: (u8, u8, u8) = (0, 255, 0);
const RED: (u8, u8, u8) = (255, 0, 0);
const UNKNOWN_VERSION: &str = "[UNKNOWN VERSION]";

#[derive(Debug, Clone, PartialEq)]
pub enum SaveStatus {
    Readable(DisplayData),
    /// The header document could not be decoded.
    Corrupted,
    /// The header decoded, but not into save display data.
    Unparsable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveListing {
    pub save_name: String,
    pub status: SaveStatus,
}

impl SaveListing {
    pub fn is_corrupted(&self) -> bool {
        matches!(self.status, SaveStatus::Corrupted)
    }

    /// What is wrong with an unreadable save, for the save picker.
    pub fn problem(&self) -> Option<String> {
        match self.status {
            SaveStatus::Readable(_) => None,
            SaveStatus::Corrupted => Some(format!("\"{}\" is corrupted!", self.save_name)),
            SaveStatus::Unparsable => Some(format!("\"{}\" could not be parsed!", self.save_name)),
        }
    }

    /// Two-line summary for the save picker, or `None` if unreadable.
    pub fn display_text(&self) -> Option<String> {
        let SaveStatus::Readable(data) = &self.status else {
            return None;
        };
        let display_name = data.display_name.as_deref().unwrap_or(&self.save_name);
        let last_access = data.last_access.unwrap_or_else(Local::now);
        let version = data.save_version.as_deref().unwrap_or(UNKNOWN_VERSION);
        let color = if data.is_current_version() { GREEN } else { RED };
        Some(format!(
            "{display_name}: {}\nLast opened: {} {}{}",
            data.player_name,
            last_access.format("%Y.%m.%d"),
            last_access.format("%H:%M:%S"),
            stylized(&format!(" v.{version}"), color)
        ))
    }
}

fn stylized(text: &str, (r, g, b): (u8, u8, u8)) -> String {
    format!("\x1b[38;2;{r};{g};{b}m{text}\x1b[0m")
}

/// Names of folders under `saves/` that contain a data file, sorted.
pub fn save_folders(dirs: &SaveDirs) -> Result<Vec<String>, SaveError> {
    dirs.ensure_saves_folder()?;
    let mut folders = Vec::new();
    for entry in fs::read_dir(dirs.saves_folder())? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if dirs.data_file(&name).is_file() {
            folders.push(name);
        }
    }
    folders.sort();
    Ok(folders)
}

/// Every save with its header. Unreadable headers are logged and listed as
/// corrupted or unparsable.
pub fn list_saves(dirs: &SaveDirs) -> Result<Vec<SaveListing>, SaveError> {
    let listings = save_folders(dirs)?
        .into_iter()
        .map(|save_name| {
            let status = header_status(dirs, &save_name);
            SaveListing { save_name, status }
        })
        .collect();
    Ok(listings)
}

fn header_status(dirs: &SaveDirs, save_name: &str) -> SaveStatus {
    let json = match codec::read_document(&dirs.data_file(save_name), DISPLAY_DOCUMENT) {
        Ok(json) => json,
        Err(e) => {
            error!(save = save_name, error = %e, "Decode error, save is corrupted");
            return SaveStatus::Corrupted;
        }
    };
    match DisplayData::from_json(json) {
        Ok(data) => SaveStatus::Readable(data),
        Err(e) => {
            error!(save = save_name, error = %e, "Parse error, save header is unparsable");
            SaveStatus::Unparsable
        }
    }
}

/// `(save name, display text)` of every readable save.
pub fn processed_saves(listings: &[SaveListing]) -> Vec<(String, String)> {
    listings
        .iter()
        .filter_map(|listing| {
            listing
                .display_text()
                .map(|text| (listing.save_name.clone(), text))
        })
        .collect()
}
