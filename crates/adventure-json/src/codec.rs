//! Save file encoding.
//!
//! A save file holds one or more JSON documents, one per line. Reading
//! document `n` only parses line `n`, so a header stored first can be read
//! without decoding the rest of the file.
//!
//! Writes go through a temporary sibling file that is synced and renamed
//! over the target, so a crash mid-write never leaves a truncated file.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::CodecError;
use crate::JsonMap;

/// Extension used by every save file.
pub const SAVE_EXT: &str = "json";

/// Write `documents` to `path`, one per line, replacing any existing file.
pub fn write_documents(path: &Path, documents: &[JsonMap]) -> Result<(), CodecError> {
    let mut buf = Vec::new();
    for document in documents {
        serde_json::to_writer(&mut buf, document).map_err(io::Error::from)?;
        buf.push(b'\n');
    }
    atomic_write(path, &buf)?;
    Ok(())
}

/// Write a single-document file.
pub fn write_document(path: &Path, document: &JsonMap) -> Result<(), CodecError> {
    write_documents(path, std::slice::from_ref(document))
}

/// Read document `index` (zero-based) from `path`.
pub fn read_document(path: &Path, index: usize) -> Result<JsonMap, CodecError> {
    let file = open(path)?;
    let reader = BufReader::new(file);
    for (line_index, line) in reader.lines().enumerate() {
        let line = line?;
        if line_index != index {
            continue;
        }
        let value: Value = serde_json::from_str(&line).map_err(|source| CodecError::Syntax {
            line: line_index + 1,
            source,
        })?;
        return match value {
            Value::Object(map) => Ok(map),
            _ => Err(CodecError::NotAnObject { index }),
        };
    }
    Err(CodecError::MissingDocument { index })
}

/// Read the first document of `path`.
pub fn read_single(path: &Path) -> Result<JsonMap, CodecError> {
    read_document(path, 0)
}

fn open(path: &Path) -> Result<File, CodecError> {
    match File::open(path) {
        Ok(file) => Ok(file),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let folder = path.parent().unwrap_or(Path::new(""));
            if folder.as_os_str().is_empty() || folder.is_dir() {
                Err(CodecError::NotFound(path.to_path_buf()))
            } else {
                Err(CodecError::FolderNotFound(folder.to_path_buf()))
            }
        }
        Err(e) => Err(CodecError::Io(e)),
    }
}

/// Write `data` to `path` via `{path}.tmp`, `sync_all` and rename.
pub fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = temp_path(path);
    let mut file = File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, path)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("adventure_codec_{}", rand::random::<u64>()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn obj(value: Value) -> JsonMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn documents_roundtrip_by_index() {
        let dir = temp_dir();
        let path = dir.join("data.json");

        let header = obj(json!({"displayName": "Test", "note": "multi\nline"}));
        let body = obj(json!({"player": {"name": "Bob"}}));
        write_documents(&path, &[header.clone(), body.clone()]).unwrap();

        assert_eq!(read_document(&path, 0).unwrap(), header);
        assert_eq!(read_document(&path, 1).unwrap(), body);
        assert!(matches!(
            read_document(&path, 2),
            Err(CodecError::MissingDocument { index: 2 })
        ));
        assert!(!temp_path(&path).exists());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn header_readable_when_body_is_corrupt() {
        let dir = temp_dir();
        let path = dir.join("data.json");
        fs::write(&path, "{\"displayName\":\"ok\"}\n{not json\n").unwrap();

        assert!(read_document(&path, 0).is_ok());
        assert!(matches!(
            read_document(&path, 1),
            Err(CodecError::Syntax { line: 2, .. })
        ));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_and_folder_are_distinguished() {
        let dir = temp_dir();

        let err = read_document(&dir.join("nope.json"), 0).unwrap_err();
        assert!(matches!(err, CodecError::NotFound(_)));
        assert!(err.is_not_found());

        let err = read_document(&dir.join("missing").join("nope.json"), 0).unwrap_err();
        assert!(matches!(err, CodecError::FolderNotFound(_)));
        assert!(err.is_not_found());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn non_object_document_is_rejected() {
        let dir = temp_dir();
        let path = dir.join("list.json");
        fs::write(&path, "[1, 2, 3]\n").unwrap();

        assert!(matches!(
            read_document(&path, 0),
            Err(CodecError::NotAnObject { index: 0 })
        ));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn write_creates_parent_and_overwrites() {
        let dir = temp_dir();
        let path = dir.join("nested").join("chunk_0_0.json");

        write_document(&path, &obj(json!({"v": 1}))).unwrap();
        write_document(&path, &obj(json!({"v": 2}))).unwrap();

        assert_eq!(read_single(&path).unwrap().get("v"), Some(&json!(2)));

        fs::remove_dir_all(&dir).ok();
    }
}
