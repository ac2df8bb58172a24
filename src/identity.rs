use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Content-derived identity of a book. The key is an md5 digest of the file
/// bytes, so the same book opened from two different paths resolves to the
/// same persistence record. The path is carried along for display only and
/// never participates in equality.
#[derive(Debug, Clone)]
pub struct BookIdentity {
    key: String,
    path: PathBuf,
}

impl BookIdentity {
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read book file: {path:?}"))?;
        Ok(Self {
            key: format!("{:x}", md5::compute(&bytes)),
            path: path.to_path_buf(),
        })
    }

    /// Stable persistence key.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PartialEq for BookIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for BookIdentity {}
