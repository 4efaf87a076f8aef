use std::path::{Path, PathBuf};

/// A converted file sitting in the scratch directory.
///
/// The pipeline removes it explicitly with [`LocalArtifact::remove`] so a
/// failed delete can be reported. If the artifact is dropped without that
/// (early return, panic) the file is still removed on a best-effort basis.
#[derive(Debug)]
pub struct LocalArtifact {
    path: PathBuf,
    removed: bool,
}

impl LocalArtifact {
    /// Writes `bytes` to `dir/name`.
    pub async fn create(dir: &Path, name: &str, bytes: &[u8]) -> std::io::Result<Self> {
        let artifact = Self::claim(dir.join(name));
        // On failure the guard drops and cleans up any partial write.
        tokio::fs::write(&artifact.path, bytes).await?;
        Ok(artifact)
    }

    /// Takes ownership of `path` before anything is written to it.
    fn claim(path: PathBuf) -> Self {
        Self {
            path,
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn remove(mut self) -> std::io::Result<()> {
        self.removed = true;
        tokio::fs::remove_file(&self.path).await
    }
}

impl Drop for LocalArtifact {
    fn drop(&mut self) {
        if !self.removed {
            if let Err(e) = std::fs::remove_file(&self.path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %self.path.display(), error = %e, "Failed to clean up artifact");
                }
            }
        }
    }
}
