//! Key-value persistence collaborators.
//!
//! The repository only needs `get`/`set` over string values. Two backends
//! ship here:
//! - `MemoryKv`: process-local map
//! - `FileKv`: one file per key, replaced atomically on write

use crate::error::StorageError;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

/// Abstract string key-value store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>, StorageError> {
        self.entries
            .lock()
            .map_err(|e| StorageError::Io(format!("memory store poisoned: {e}")))
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Directory-backed store. Each key maps to `<sha256(key)>.json`.
#[derive(Debug, Clone)]
pub struct FileKv {
    root: PathBuf,
}

impl FileKv {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding `key`. Hashing keeps arbitrary user ids filesystem-safe.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        let mut name = String::with_capacity(digest.len() * 2 + 5);
        for byte in digest.iter() {
            name.push_str(&format!("{byte:02x}"));
        }
        name.push_str(".json");
        self.root.join(name)
    }
}

impl KeyValueStore for FileKv {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| StorageError::Corrupt {
                    key: key.to_string(),
                    message: format!("{}: contains non-UTF-8 byte sequence(s)", path.display()),
                }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(format!("{}: {e}", path.display()))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        write_atomically(&self.path_for(key), value.as_bytes())
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|e| StorageError::Io(format!("{}: {e}", parent.display())))?;
    }

    let tmp_path = tmp_write_path(path);
    let write_result = (|| -> Result<(), StorageError> {
        let file = File::create(&tmp_path)
            .map_err(|e| StorageError::Io(format!("{}: {e}", tmp_path.display())))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(bytes)
            .map_err(|e| StorageError::Io(format!("{}: {e}", tmp_path.display())))?;
        let file = writer
            .into_inner()
            .map_err(|e| StorageError::Io(format!("{}: {e}", tmp_path.display())))?;
        file.sync_all()
            .map_err(|e| StorageError::Io(format!("{}: {e}", tmp_path.display())))?;
        Ok(())
    })();

    if let Err(error) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        StorageError::Io(format!(
            "{} -> {}: {e}",
            tmp_path.display(),
            path.display()
        ))
    })?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        let dir = File::open(parent)
            .map_err(|e| StorageError::Io(format!("{}: {e}", parent.display())))?;
        dir.sync_all()
            .map_err(|e| StorageError::Io(format!("{}: {e}", parent.display())))?;
    }

    Ok(())
}

fn tmp_write_path(path: &Path) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut tmp: OsString = path.as_os_str().to_os_string();
    tmp.push(format!(".tmp.{}.{}", std::process::id(), unique));
    PathBuf::from(tmp)
}
