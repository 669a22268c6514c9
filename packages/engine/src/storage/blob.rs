//! Durable blob storage for model state
//!
//! The recall model persists two opaque blobs by name. Their encoding is private
//! to the model; stores only move bytes.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub trait ModelBlobStore: Send + Sync {
    /// Bytes stored under `name`, `None` if absent
    fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>>;

    /// Replace the blob stored under `name`
    fn write(&self, name: &str, bytes: &[u8]) -> io::Result<()>;

    /// Delete the blob; absent blobs are not an error
    fn remove(&self, name: &str) -> io::Result<()>;
}

// ==================== FileBlobStore ====================

/// One file per blob inside a model directory
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

impl ModelBlobStore for FileBlobStore {
    fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(name)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Write-to-temp then rename, so a crash never leaves a half-written blob
    fn write(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(name);
        let temp_path = path.with_extension("json.tmp");
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &path)
    }

    fn remove(&self, name: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

// ==================== MemoryBlobStore ====================

/// In-process store; clones share contents. Writes can be made to fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes return an I/O error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Overwrite raw bytes, bypassing the failure switch
    pub fn put(&self, name: &str, bytes: &[u8]) {
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.insert(name.to_string(), bytes.to_vec());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.blobs.lock().map(|b| b.contains_key(name)).unwrap_or(false)
    }

    fn lock_err() -> io::Error {
        io::Error::new(io::ErrorKind::Other, "blob store lock poisoned")
    }
}

impl ModelBlobStore for MemoryBlobStore {
    fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        let blobs = self.blobs.lock().map_err(|_| Self::lock_err())?;
        Ok(blobs.get(name).cloned())
    }

    fn write(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "writes disabled"));
        }
        let mut blobs = self.blobs.lock().map_err(|_| Self::lock_err())?;
        blobs.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, name: &str) -> io::Result<()> {
        let mut blobs = self.blobs.lock().map_err(|_| Self::lock_err())?;
        blobs.remove(name);
        Ok(())
    }
}
