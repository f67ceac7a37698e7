use std::cell::{Cell, RefCell};
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::Snapshot;

/// Name of the document key, also used as the default file stem.
pub const STORAGE_KEY: &str = "planer_app";

/// Durable mirror of the whole planner document.
///
/// Reads and writes always move the complete [`Snapshot`]; there is no
/// per-record access.
pub trait Gateway {
    /// Reads the stored document.
    ///
    /// A store that has never been written yields an empty snapshot. An
    /// unreadable or corrupt store is an [`Error::Persistence`].
    fn read_all(&self) -> Result<Snapshot>;

    /// Replaces the stored document with `snapshot`.
    fn write_all(&self, snapshot: &Snapshot) -> Result<()>;

    /// Like [`Gateway::read_all`] but falls back to an empty snapshot.
    fn read_all_or_default(&self) -> Snapshot {
        self.read_all().unwrap_or_else(|e| {
            warn!(error = %e, "could not read stored data, using an empty document");
            Snapshot::default()
        })
    }
}

/// Stores the document as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileGateway {
    path: PathBuf,
}

impl JsonFileGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileGateway { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| STORAGE_KEY.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Gateway for JsonFileGateway {
    fn read_all(&self) -> Result<Snapshot> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no data file yet");
            return Ok(Snapshot::default());
        }
        let mut f = OpenOptions::new()
            .read(true)
            .open(&self.path)
            .map_err(|e| Error::Persistence(format!("{}: {}", self.path.display(), e)))?;
        let mut s = String::new();
        f.read_to_string(&mut s)
            .map_err(|e| Error::Persistence(format!("{}: {}", self.path.display(), e)))?;
        if s.trim().is_empty() {
            return Ok(Snapshot::default());
        }
        serde_json::from_str(&s)
            .map_err(|e| Error::Persistence(format!("{} is corrupt: {}", self.path.display(), e)))
    }

    fn write_all(&self, snapshot: &Snapshot) -> Result<()> {
        let s = serde_json::to_string_pretty(snapshot)?;
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)
                    .map_err(|e| Error::Persistence(format!("{}: {}", dir.display(), e)))?;
            }
        }
        // Write beside the target and rename so readers never see half a file.
        let tmp = self.temp_path();
        let write = || -> std::io::Result<()> {
            let mut f = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp)?;
            f.write_all(s.as_bytes())?;
            f.sync_all()?;
            fs::rename(&tmp, &self.path)
        };
        write().map_err(|e| {
            let _ = fs::remove_file(&tmp);
            Error::Persistence(format!("{}: {}", self.path.display(), e))
        })?;
        debug!(path = %self.path.display(), tasks = snapshot.tasks.len(), "saved");
        Ok(())
    }
}

/// Keeps the document in memory. Reads and writes can be made to fail.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    data: RefCell<Option<Snapshot>>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        let gw = Self::default();
        *gw.data.borrow_mut() = Some(snapshot);
        gw
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    /// The last successfully written document.
    pub fn stored(&self) -> Option<Snapshot> {
        self.data.borrow().clone()
    }
}

impl Gateway for MemoryGateway {
    fn read_all(&self) -> Result<Snapshot> {
        if self.fail_reads.get() {
            return Err(Error::Persistence("stored data is unreadable".into()));
        }
        Ok(self.data.borrow().clone().unwrap_or_default())
    }

    fn write_all(&self, snapshot: &Snapshot) -> Result<()> {
        if self.fail_writes.get() {
            return Err(Error::Persistence("storage quota exceeded".into()));
        }
        *self.data.borrow_mut() = Some(snapshot.clone());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

impl<G: Gateway + ?Sized> Gateway for &G {
    fn read_all(&self) -> Result<Snapshot> {
        (**self).read_all()
    }

    fn write_all(&self, snapshot: &Snapshot) -> Result<()> {
        (**self).write_all(snapshot)
    }
}
