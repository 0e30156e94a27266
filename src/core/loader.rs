//! Recipe fragment loading
//!
//! A fragment is the YAML definition of a reusable step kind such as
//! `fetch` or `git-checkout`, stored as `<base>/<kind>.yaml`.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("pipeline directory not specified")]
    NoDirectory,

    #[error("reading pipeline fragment {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Source of raw fragment bytes
pub trait FragmentLoader: Send + Sync {
    fn load(&self, uses: &str) -> Result<Vec<u8>, LoaderError>;
}

/// Loads fragments from a directory on disk
#[derive(Debug, Clone, Default)]
pub struct DirectoryLoader {
    base: PathBuf,
}

impl DirectoryLoader {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl FragmentLoader for DirectoryLoader {
    fn load(&self, uses: &str) -> Result<Vec<u8>, LoaderError> {
        load_pipeline_data(&self.base, uses)
    }
}

/// Read the fragment for `uses` from `dir`
pub fn load_pipeline_data(dir: &Path, uses: &str) -> Result<Vec<u8>, LoaderError> {
    if dir.as_os_str().is_empty() {
        return Err(LoaderError::NoDirectory);
    }

    let path = dir.join(format!("{}.yaml", uses));
    debug!("Loading pipeline fragment {}", path.display());
    std::fs::read(&path).map_err(|source| LoaderError::Read { path, source })
}
