//! File system helpers for project documents and generated artifacts
//!
//! Every write goes through [`atomic_write`]: the content is written to a
//! temp file in the target directory, synced, then renamed over the target.
//! A reader never observes a half-written template.
//!
//! IO failures keep their [`std::io::ErrorKind`] and gain the offending path
//! in the message, so callers can still tell "missing" from "denied".
//!
//! # Examples
//!
//! ```rust,no_run
//! use apimtool::utils::fs::{ensure_dir, write_text_file};
//! use std::path::Path;
//!
//! # fn example() -> apimtool::core::Result<()> {
//! ensure_dir(Path::new("apim-dev/sources/orders"))?;
//! write_text_file(Path::new("apim-dev/sources/orders/orders.csv"), "list,GET,/\n")?;
//! # Ok(())
//! # }
//! ```

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::core::{ApimError, Result};

fn with_path(path: &Path, action: &str, err: io::Error) -> ApimError {
    ApimError::IoError(io::Error::new(
        err.kind(),
        format!("Failed to {action} {}: {err}", path.display()),
    ))
}

/// Ensures a directory exists, creating it and all parent directories if necessary.
///
/// # Errors
///
/// Fails when creation fails or when `path` exists and is not a directory.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| with_path(path, "create directory", e))?;
    } else if !path.is_dir() {
        return Err(ApimError::IoError(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Path exists but is not a directory: {}", path.display()),
        )));
    }
    Ok(())
}

/// Atomically write `content` to `path`, creating parent directories.
///
/// # Errors
///
/// Any failure while creating, writing, syncing or renaming the temp file.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(dir)?;

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| with_path(dir, "create temp file in", e))?;
    temp.write_all(content).map_err(|e| with_path(temp.path(), "write temp file", e))?;
    temp.as_file().sync_all().map_err(|e| with_path(temp.path(), "sync temp file", e))?;
    temp.persist(path).map_err(|e| with_path(path, "replace", e.error))?;
    Ok(())
}

/// Read a UTF-8 text file.
///
/// # Errors
///
/// The IO error, with `path` in the message.
pub fn read_text_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| with_path(path, "read", e))
}

/// Atomically write a text file.
///
/// # Errors
///
/// See [`atomic_write`].
pub fn write_text_file(path: &Path, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

/// Serialize `value` as pretty JSON indented with tabs, with a trailing newline.
///
/// # Errors
///
/// [`ApimError::JsonError`] when `value` cannot be serialized.
pub fn to_tab_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"\t");
    let mut serializer = Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    buf.push(b'\n');
    String::from_utf8(buf).map_err(|e| ApimError::Other(e.to_string()))
}

/// Atomically write `value` as tab-indented JSON.
///
/// # Errors
///
/// Serialization or IO failure.
pub fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = to_tab_json(value)?;
    write_text_file(path, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_creates_parents_and_overwrites() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a/b/file.txt");

        write_text_file(&path, "first").unwrap();
        write_text_file(&path, "second").unwrap();

        assert_eq!(read_text_file(&path).unwrap(), "second");
        let entries = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_ensure_dir_rejects_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file");
        std::fs::write(&file, "x").unwrap();
        assert!(ensure_dir(&file).is_err());
        ensure_dir(&temp.path().join("new/dir")).unwrap();
        ensure_dir(&temp.path().join("new/dir")).unwrap();
    }

    #[test]
    fn test_read_missing_keeps_kind_and_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.json");
        match read_text_file(&path) {
            Err(ApimError::IoError(e)) => {
                assert_eq!(e.kind(), io::ErrorKind::NotFound);
                assert!(e.to_string().contains("missing.json"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_to_tab_json_uses_tabs() {
        let json = to_tab_json(&serde_json::json!({ "a": { "b": 1 } })).unwrap();
        assert_eq!(json, "{\n\t\"a\": {\n\t\t\"b\": 1\n\t}\n}\n");
    }
}
