//! Management of downloaded firmware artifacts

use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::errors::{PlugError, Result};
use crate::services::verifier::ARTIFACT_SUFFIX;

/// The directory verified firmware files live in (and are served from)
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory if it does not exist yet
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Resolve an artifact name to a path inside the store
    ///
    /// Names come back from the executor over the bus, so anything that could
    /// escape the directory is refused.
    pub fn path_for(&self, filename: &str) -> Result<PathBuf> {
        let is_plain_name = !filename.is_empty()
            && !filename.contains(['/', '\\'])
            && filename != "."
            && filename != ".."
            && filename.ends_with(ARTIFACT_SUFFIX);
        if !is_plain_name {
            return Err(PlugError::invalid_argument(
                "filename",
                format!("\"{}\" is not an artifact name", filename),
            ));
        }
        Ok(self.dir.join(filename))
    }

    /// Names of all artifacts currently stored
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut names: Vec<String> = std::fs::read_dir(&self.dir)?
            .flatten()
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .filter(|name| name.ends_with(ARTIFACT_SUFFIX))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Delete one artifact; returns false if it was already gone
    pub fn remove(&self, filename: &str) -> Result<bool> {
        let path = self.path_for(filename)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed artifact {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete every artifact in the store, returning how many were removed
    pub fn purge(&self) -> Result<usize> {
        let mut removed = 0;
        for name in self.list()? {
            if self.remove(&name)? {
                removed += 1;
            }
        }
        info!(
            "Purged {} artifact(s) from {}",
            removed,
            self.dir.display()
        );
        Ok(removed)
    }
}
