//! Raster output writers.
//!
//! The mosaic is written PNG-first with a six-line `.wld` world file as
//! sidecar georeferencing. Raster writes go through a temp file in the
//! destination directory and persist atomically, so a crash never leaves a
//! half-written output and the temp file is removed on every exit path.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::Mosaic;

/// Failures while writing output artifacts.
#[derive(Debug)]
pub enum OutputError {
    /// Filesystem failure.
    Io(io::Error),
    /// PNG encoding failure.
    Encode(String),
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputError::Io(e) => write!(f, "I/O error: {}", e),
            OutputError::Encode(msg) => write!(f, "PNG encoding failed: {}", msg),
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutputError::Io(e) => Some(e),
            OutputError::Encode(_) => None,
        }
    }
}

impl From<io::Error> for OutputError {
    fn from(e: io::Error) -> Self {
        OutputError::Io(e)
    }
}

impl Mosaic {
    /// Write the raster as PNG, atomically.
    pub fn write_png(&self, path: &Path) -> Result<(), OutputError> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(parent)?;
        self.image
            .write_to(tmp.as_file_mut(), image::ImageFormat::Png)
            .map_err(|e| OutputError::Encode(e.to_string()))?;
        tmp.persist(path).map_err(|e| OutputError::Io(e.error))?;
        Ok(())
    }

    /// Write the world-file sidecar next to the raster.
    pub fn write_world_file(&self, path: &Path) -> Result<(), OutputError> {
        std::fs::write(path, self.transform.world_file())?;
        Ok(())
    }

    /// Conventional sidecar path for a raster (`map.png` -> `map.wld`).
    pub fn world_file_path(raster: &Path) -> PathBuf {
        raster.with_extension("wld")
    }
}
