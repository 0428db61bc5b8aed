//! Save and load transactions.

use std::fs;

use adventure_json::codec;
use adventure_json::{JsonConvertable, SaveVersion, CURRENT_SAVE_VERSION};
use adventure_world::CHUNKS_FOLDER;
use tracing::{debug, error, info, warn};

use crate::backup::{create_backup, remove_backup};
use crate::dirs::{validate_save_name, SaveDirs};
use crate::error::SaveError;
use crate::lock::{acquire, SaveLocks};
use crate::save_data::{MainData, MAIN_DOCUMENT};
use crate::session::SaveSession;

/// Asks whether a save with a mismatched version should be backed up first.
pub trait BackupPrompt {
    fn ask_backup(&mut self, save_name: &str, is_older: bool) -> bool;
}

impl<F: FnMut(&str, bool) -> bool> BackupPrompt for F {
    fn ask_backup(&mut self, save_name: &str, is_older: bool) -> bool {
        self(save_name, is_older)
    }
}

/// Never backs up. For non-interactive loads.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrompt;

impl BackupPrompt for NoPrompt {
    fn ask_backup(&mut self, _save_name: &str, _is_older: bool) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Let the prompt decide about backups of mismatched versions.
    pub backup_choice: bool,
    /// Back up every load. Only used when `backup_choice` is off.
    pub automatic_backup: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            backup_choice: true,
            automatic_backup: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStage {
    BackupTaken,
    DataFileWritten,
    ChunksWritten,
    BackupRemoved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    /// The temporary backup is still on disk.
    pub backup_kept: bool,
    pub chunks_written: usize,
}

/// Write the session to its save folder.
///
/// A temporary backup of the previous save is taken first and removed once
/// every file is written. If anything fails the backup is left in place.
pub fn make_save(session: &mut SaveSession, dirs: &SaveDirs, clear_chunks: bool) -> Result<SaveReport, SaveError> {
    let folder = session.save_folder(dirs);
    let lock = SaveLocks::global().folder_lock(&folder);
    let _guard = acquire(&lock);

    let backup = create_backup(dirs, &session.save_name, true)?;
    debug!(save = %session.save_name, stage = ?SaveStage::BackupTaken);

    let chunks_written = match write_save(session, dirs, clear_chunks) {
        Ok(written) => written,
        Err(e) => {
            match &backup {
                Some(backup) => error!(
                    save = %session.save_name,
                    backup = %backup.relative,
                    error = %e,
                    "Saving failed, backup kept"
                ),
                None => error!(save = %session.save_name, error = %e, "Saving failed"),
            }
            return Err(e);
        }
    };

    let mut backup_kept = false;
    if let Some(backup) = &backup {
        remove_backup(backup);
        backup_kept = backup.path.exists();
    }
    debug!(save = %session.save_name, stage = ?SaveStage::BackupRemoved);
    info!(save = %session.save_name, chunks_written, "Saved game");

    Ok(SaveReport {
        backup_kept,
        chunks_written,
    })
}

fn write_save(session: &mut SaveSession, dirs: &SaveDirs, clear_chunks: bool) -> Result<usize, SaveError> {
    let folder = session.save_folder(dirs);
    session.touch();

    let documents = [session.display_data().to_json(), session.main_data().to_json()];
    codec::write_documents(&dirs.data_file(&session.save_name), &documents)?;
    debug!(save = %session.save_name, stage = ?SaveStage::DataFileWritten);

    fs::create_dir_all(folder.join(CHUNKS_FOLDER))?;
    info!("Saving chunks");
    let written = session.world.save_all_chunks(&folder, clear_chunks)?;
    debug!(save = %session.save_name, stage = ?SaveStage::ChunksWritten);
    Ok(written)
}

/// Start a new game and write its first save.
pub fn create_new_save(
    display_name: &str,
    player_name: &str,
    seed: u64,
    dirs: &SaveDirs,
) -> Result<SaveSession, SaveError> {
    info!("Preparing game data");
    dirs.ensure_saves_folder()?;
    let mut session = SaveSession::new_game(display_name, player_name, seed, dirs);
    make_save(&mut session, dirs, false)?;
    Ok(session)
}

/// Open the save in `saves/<save_name>`.
///
/// Saves written by another version are corrected to the current layout.
/// Chunks are not read here; the world loads them on first access.
pub fn load_save(
    save_name: &str,
    dirs: &SaveDirs,
    options: LoadOptions,
    prompt: &mut dyn BackupPrompt,
) -> Result<SaveSession, SaveError> {
    validate_save_name(save_name)?;
    let folder = dirs.save_folder(save_name);
    if !folder.is_dir() {
        error!(folder = save_name, "Not a valid save folder");
        return Err(SaveError::NotFound {
            save_name: save_name.to_string(),
        });
    }
    let lock = SaveLocks::global().folder_lock(&folder);
    let _guard = acquire(&lock);

    let data = codec::read_document(&dirs.data_file(save_name), MAIN_DOCUMENT).map_err(|e| {
        error!(save = save_name, error = %e, "Save data unreadable");
        if e.is_not_found() {
            SaveError::NotFound {
                save_name: save_name.to_string(),
            }
        } else {
            SaveError::Unreadable {
                save_name: save_name.to_string(),
                source: e,
            }
        }
    });

    if !options.backup_choice && options.automatic_backup {
        create_backup(dirs, save_name, false)?;
    }

    let data = data?;
    let Some(version) = MainData::read_version(&data) else {
        error!(save = save_name, "Unknown save version");
        return Err(SaveError::UnknownVersion {
            save_name: save_name.to_string(),
        });
    };
    let label = version.label().to_string();

    if !version.is_current() {
        if version < SaveVersion::oldest() {
            error!(save = save_name, version = %label, "Save version can not be converted");
            return Err(SaveError::UnsupportedMigration {
                save_name: save_name.to_string(),
                version: label,
            });
        }
        let is_older = !version.is_up_to_date();
        warn!(
            save = save_name,
            "Trying to load save with an incorrect version: {label} -> {CURRENT_SAVE_VERSION}"
        );
        if !is_older {
            warn!(save = save_name, "Save is from a newer version, this build is not up to date");
        }
        if options.backup_choice && prompt.ask_backup(save_name, is_older) {
            create_backup(dirs, save_name, false)?;
        }
    }

    let parsed = MainData::from_json(Some(data), &version, ()).map_err(|e| SaveError::parse(save_name, e))?;
    if !parsed.complete {
        warn!(save = save_name, "Save loaded with missing or invalid data");
    }
    let main = parsed.value;
    info!(
        save = save_name,
        player = %main.player.name,
        last_saved = %main.last_access.format("%Y-%m-%d %H:%M:%S"),
        "Loaded save"
    );
    Ok(SaveSession::from_main_data(save_name, main))
}

/// Delete a save folder and everything in it.
pub fn delete_save(save_name: &str, dirs: &SaveDirs) -> Result<(), SaveError> {
    validate_save_name(save_name)?;
    let folder = dirs.save_folder(save_name);
    if !folder.is_dir() {
        return Err(SaveError::NotFound {
            save_name: save_name.to_string(),
        });
    }
    let lock = SaveLocks::global().folder_lock(&folder);
    let _guard = acquire(&lock);
    fs::remove_dir_all(&folder)?;
    info!(save = save_name, "Deleted save");
    Ok(())
}
