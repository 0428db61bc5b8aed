use adventure_json::{CodecError, JsonError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("not a valid save folder: {save_name}")]
    NotFound { save_name: String },

    #[error("unknown save version: {save_name}")]
    UnknownVersion { save_name: String },

    #[error("save {save_name:?} is version {version}, which can not be converted")]
    UnsupportedMigration { save_name: String, version: String },

    #[error("invalid save name: {0:?}")]
    InvalidSaveName(String),

    #[error("save {save_name:?} could not be parsed: {source}")]
    Parse {
        save_name: String,
        #[source]
        source: JsonError,
    },

    #[error("save {save_name:?} could not be read: {source}")]
    Unreadable {
        save_name: String,
        #[source]
        source: CodecError,
    },

    #[error("save codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SaveError {
    pub(crate) fn parse(save_name: &str, source: JsonError) -> Self {
        Self::Parse {
            save_name: save_name.to_string(),
            source,
        }
    }
}
