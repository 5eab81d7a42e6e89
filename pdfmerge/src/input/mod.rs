//! Raw input handed over by the host's picker or drop surface.
//!
//! A [`RawFile`] carries what the host knows about a selected file: its name,
//! size, declared media type and a way to get at the bytes. Bytes are read
//! lazily by the merge run, one entry at a time.

pub mod filter;

pub use filter::InputFilter;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{MergeError, Result};
use crate::utils::has_extension;

/// Where the bytes of a raw file live.
#[derive(Clone)]
pub enum FileSource {
    /// Bytes already held in memory.
    Memory(Arc<[u8]>),
    /// A file on local disk, read when the merge run reaches it.
    Path(PathBuf),
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory(bytes) => write!(f, "Memory({} bytes)", bytes.len()),
            Self::Path(path) => write!(f, "Path({})", path.display()),
        }
    }
}

/// One file as delivered by the host, before filtering.
#[derive(Debug, Clone)]
pub struct RawFile {
    /// File name including extension.
    pub name: String,

    /// Size in bytes as reported by the host.
    pub byte_size: u64,

    /// Declared media type; may be empty or wrong.
    pub media_type: String,

    /// Accessor for the raw bytes.
    pub source: FileSource,
}

impl RawFile {
    /// Create a raw file from bytes already in memory.
    pub fn from_bytes(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            byte_size: bytes.len() as u64,
            media_type: media_type.into(),
            source: FileSource::Memory(bytes),
        }
    }

    /// Describe a file on disk without reading its content.
    ///
    /// The media type is inferred from the extension, the way a file picker
    /// would report it.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist or is not a regular file.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(MergeError::Io {
                source: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Not a file: {}", path.display()),
                ),
            });
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let media_type = if has_extension(&name, "pdf") {
            "application/pdf"
        } else {
            "application/octet-stream"
        };

        Ok(Self {
            name,
            byte_size: metadata.len(),
            media_type: media_type.to_string(),
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    /// Read the raw bytes behind this file.
    pub async fn read_bytes(&self) -> io::Result<Arc<[u8]>> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(Arc::clone(bytes)),
            FileSource::Path(path) => Ok(tokio::fs::read(path).await?.into()),
        }
    }
}
