use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
pub struct AdventureConfig {
    #[serde(default)]
    pub game: GameSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct GameSection {
    /// Folder holding `saves/`, `backups/` and `CRASH.log`.
    #[serde(default = "default_root_folder")]
    pub root_folder: String,
    /// Back up every save on load. Only used when `backup_choice` is off.
    #[serde(default = "default_true")]
    pub auto_backup: bool,
    /// Ask before loading a save written by another version.
    #[serde(default = "default_true")]
    pub backup_choice: bool,
}

fn default_root_folder() -> String {
    ".".into()
}

fn default_true() -> bool {
    true
}

impl Default for GameSection {
    fn default() -> Self {
        Self {
            root_folder: default_root_folder(),
            auto_backup: true,
            backup_choice: true,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".into()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl AdventureConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file gives the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        if !path.as_ref().exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }
}
