//! Bundled delivery sinks.
//!
//! - [`DirectorySink`] writes artifacts into a downloads directory.
//! - [`MemorySink`] keeps artifacts in memory until they are disposed, for
//!   hosts that stream the bytes themselves.

use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::delivery::{Artifact, DeliverySink, SinkHandle};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sink that holds offered artifacts until disposal.
#[derive(Debug, Default)]
pub struct MemorySink {
    next: AtomicU64,
    held: Mutex<BTreeMap<SinkHandle, Artifact>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of artifacts currently held.
    pub fn len(&self) -> usize {
        lock(&self.held).len()
    }

    /// Whether no artifact is held.
    pub fn is_empty(&self) -> bool {
        lock(&self.held).is_empty()
    }

    /// Copy of the artifact behind `handle`, if not yet disposed.
    pub fn get(&self, handle: SinkHandle) -> Option<Artifact> {
        lock(&self.held).get(&handle).cloned()
    }

    /// Held artifacts in the order they were offered.
    pub fn artifacts(&self) -> Vec<Artifact> {
        lock(&self.held).values().cloned().collect()
    }
}

impl DeliverySink for MemorySink {
    fn offer(&self, artifact: Artifact) -> io::Result<SinkHandle> {
        let handle = SinkHandle(self.next.fetch_add(1, Ordering::Relaxed));
        lock(&self.held).insert(handle, artifact);
        Ok(handle)
    }

    fn dispose(&self, handle: SinkHandle) {
        lock(&self.held).remove(&handle);
    }
}

/// Sink that saves artifacts as files in a directory.
///
/// Files are written atomically: the bytes go to a temporary file first and
/// are linked into place once flushed. An existing file is never
/// overwritten. The saved file is the user's download, so disposal only
/// forgets the handle.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    next: AtomicU64,
    saved: Mutex<HashMap<SinkHandle, PathBuf>>,
}

impl DirectorySink {
    /// Create a sink saving into `dir`. The directory is created on demand.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next: AtomicU64::new(0),
            saved: Mutex::new(HashMap::new()),
        }
    }

    /// The target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path an offered artifact was saved to, until it is disposed.
    pub fn path_of(&self, handle: SinkHandle) -> Option<PathBuf> {
        lock(&self.saved).get(&handle).cloned()
    }

    fn write_atomic(&self, artifact: &Artifact) -> io::Result<PathBuf> {
        // Only the final path component is honoured.
        let file_name = Path::new(&artifact.suggested_name)
            .file_name()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Invalid artifact name: {}", artifact.suggested_name),
                )
            })?;

        std::fs::create_dir_all(&self.dir)?;

        let target = self.dir.join(file_name);
        let temp = target.with_extension("tmp");
        let result = (|| {
            let mut writer = io::BufWriter::new(std::fs::File::create(&temp)?);
            writer.write_all(&artifact.bytes)?;
            writer.flush()?;
            publish(&temp, &target)
        })();

        if let Err(e) = result {
            let _ = std::fs::remove_file(&temp);
            return Err(e);
        }

        Ok(target)
    }
}

/// Move a fully written `temp` file to `target`, failing if `target` exists.
///
/// A hard link cannot replace an existing file, so a file created at
/// `target` by anyone else is never clobbered.
fn publish(temp: &Path, target: &Path) -> io::Result<()> {
    std::fs::hard_link(temp, target).map_err(|e| {
        if e.kind() == io::ErrorKind::AlreadyExists {
            io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Output file already exists: {}", target.display()),
            )
        } else {
            e
        }
    })?;
    std::fs::remove_file(temp)
}

impl DeliverySink for DirectorySink {
    fn offer(&self, artifact: Artifact) -> io::Result<SinkHandle> {
        let path = self.write_atomic(&artifact)?;
        debug!(path = %path.display(), bytes = artifact.bytes.len(), "Artifact saved");

        let handle = SinkHandle(self.next.fetch_add(1, Ordering::Relaxed));
        lock(&self.saved).insert(handle, path);
        Ok(handle)
    }

    fn dispose(&self, handle: SinkHandle) {
        lock(&self.saved).remove(&handle);
    }
}
