//! The upload destination directory.
//!
//! Client-supplied names never touch the filesystem as strings: a path under
//! the output directory can only be built from a [`SafeFileName`].

use std::io;
use std::path::{Path, PathBuf};

use intact_core::SafeFileName;
use tempfile::NamedTempFile;

/// Directory that receives uploads.
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    /// Use `root` as the output directory, creating it if needed.
    pub fn create(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Destination for a sanitized name. Always a direct child of the root.
    pub fn resolve(&self, name: &SafeFileName) -> PathBuf {
        self.root.join(name.as_str())
    }

    /// Open a hidden staging file in the output directory.
    ///
    /// The file is removed when dropped unless it is persisted. Staging on
    /// the same filesystem keeps the final rename atomic.
    pub fn stage(&self) -> io::Result<NamedTempFile> {
        tempfile::Builder::new()
            .prefix(".intact-")
            .suffix(".partial")
            .tempfile_in(&self.root)
    }
}
