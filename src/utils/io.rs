use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Error type for I/O operations
#[derive(Error, Debug)]
pub enum IoError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("IO error: {0}")]
    StdIo(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IoError {
    /// True when the failure came from the filesystem rather than the payload.
    pub fn is_filesystem(&self) -> bool {
        match self {
            IoError::FileNotFound(_) | IoError::StdIo(_) => true,
            // bincode only ever decodes from memory here
            IoError::Serialization(_) => false,
            IoError::Json(e) => e.is_io(),
        }
    }
}

#[cfg(unix)]
const OUTPUT_MODE: u32 = 0o644;

fn map_open_error(path: &Path, e: io::Error) -> IoError {
    if e.kind() == io::ErrorKind::NotFound {
        IoError::FileNotFound(path.to_path_buf())
    } else {
        IoError::StdIo(e)
    }
}

/// Reads a UTF-8 file to string with proper error handling
pub fn read_to_string(path: impl AsRef<Path>) -> Result<String, IoError> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| map_open_error(path, e))
}

/// Writes `dest` atomically: `fill` writes into a temp file in the same
/// directory, which is synced and renamed over `dest` only if `fill` succeeds.
/// On any failure the temp file is removed and `dest` is left untouched.
pub fn write_atomic<F>(dest: impl AsRef<Path>, fill: F) -> Result<(), IoError>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let dest = dest.as_ref();
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        fill(&mut writer)?;
        writer.flush()?;
    }
    // temp files are created owner-only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file().set_permissions(fs::Permissions::from_mode(OUTPUT_MODE))?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| IoError::StdIo(e.error))?;
    Ok(())
}

/// Removes `path` if present. A missing file is not an error.
pub fn remove_if_exists(path: impl AsRef<Path>) -> Result<(), IoError> {
    match fs::remove_file(path.as_ref()) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(IoError::StdIo(e)),
    }
}

/// Writes a string to `dest` atomically
pub fn write_string(path: impl AsRef<Path>, contents: impl AsRef<str>) -> Result<(), IoError> {
    write_atomic(path, |w| w.write_all(contents.as_ref().as_bytes()))
}

/// Serializes data to a binary file using bincode
pub fn serialize_to_file<T: Serialize>(path: impl AsRef<Path>, data: &T) -> Result<(), IoError> {
    let mut encoded = Vec::new();
    bincode::serialize_into(&mut encoded, data)?;
    write_atomic(path, |w| w.write_all(&encoded))
}

/// Deserializes data from a binary file using bincode.
///
/// The file is read fully first so corrupt length prefixes fail against the
/// buffer bounds instead of driving allocations.
pub fn deserialize_from_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, IoError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| map_open_error(path, e))?;
    let data = bincode::deserialize(&bytes)?;
    Ok(data)
}

/// Serializes data to a pretty-printed JSON file
pub fn serialize_to_json<T: Serialize>(path: impl AsRef<Path>, data: &T) -> Result<(), IoError> {
    let encoded = serde_json::to_vec_pretty(data)?;
    write_atomic(path, |w| w.write_all(&encoded))
}

/// Deserializes data from a JSON file
pub fn deserialize_from_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, IoError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| map_open_error(path, e))?;
    let data = serde_json::from_reader(BufReader::new(file))?;
    Ok(data)
}
