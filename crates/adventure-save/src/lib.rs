//! Save folders: player and seed data, backups, listing and the
//! load/save transactions.
//!
//! A save is a folder under `saves/` holding `data.json` (two documents:
//! the display header and the main data) and a `chunks/` folder with one
//! file per generated chunk.

pub mod backup;
pub mod dirs;
pub mod error;
pub mod listing;
pub mod lock;
pub mod manager;
pub mod player;
pub mod save_data;
pub mod session;

pub use dirs::SaveDirs;
pub use error::SaveError;
pub use listing::{list_saves, processed_saves, SaveListing, SaveStatus};
pub use manager::{
    create_new_save, delete_save, load_save, make_save, BackupPrompt, LoadOptions, NoPrompt,
    SaveReport,
};
pub use player::Player;
pub use session::SaveSession;
