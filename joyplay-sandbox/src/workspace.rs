//! Ephemeral per-execution workspace

use crate::error::{Result, SandboxError};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Fresh, exclusive directory holding one submitted source file.
///
/// The directory is removed when the workspace is dropped, so every exit
/// path of an execution cleans up after itself.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a new workspace under `root` (or the OS temp dir)
    pub fn create(root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("sandbox");
        let dir = match root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(SandboxError::Workspace)?;

        tracing::debug!(path = %dir.path().display(), "Created workspace");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Materialize `source` as `name` inside the workspace, read-only
    pub async fn write_source(&self, name: &str, source: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        tokio::fs::write(&path, source)
            .await
            .map_err(SandboxError::Workspace)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o400))
                .await
                .map_err(SandboxError::Workspace)?;
        }

        Ok(path)
    }

    /// Remove the workspace, reporting failures instead of ignoring them
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove workspace");
        }
    }
}
