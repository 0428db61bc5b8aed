//! Versioned JSON documents for save files.
//!
//! Every persisted entity (chunks, tiles, the player, save headers) is stored
//! as a JSON object tagged with the save version that wrote it. On load the
//! raw object is first run through the entity's chain of version correcters
//! and only then parsed into its structured form.

pub mod codec;
pub mod convert;
pub mod error;
pub mod fields;
pub mod version;

pub use convert::{correct_json_data, JsonConvertable, Parsed, VersionCorrecter};
pub use error::{CodecError, JsonError};
pub use version::{SaveVersion, CURRENT_SAVE_VERSION, LEGACY_EXPORT_VERSION, OLDEST_SAVE_VERSION};

/// An untyped JSON object, the raw form every document is corrected in.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
