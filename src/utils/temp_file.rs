use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::constants::{ARTIFACT_EXTENSION, ARTIFACT_PREFIX};

/// Temporary audio artifact, removed when dropped
///
/// Each instance owns a unique `tts_<uuid>.wav` path inside the scratch
/// directory. The file itself is created by the engine, not here.
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
}

impl TempFile {
    /// Reserve a fresh artifact path inside `dir`
    pub fn new_in<P: AsRef<Path>>(dir: P) -> Self {
        let name = format!("{}{}.{}", ARTIFACT_PREFIX, Uuid::new_v4(), ARTIFACT_EXTENSION);
        Self {
            path: dir.as_ref().join(name),
        }
    }

    /// Get the path to the temporary file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Whether a file name follows the artifact naming pattern
pub fn is_artifact_name(name: &str) -> bool {
    name.len() > ARTIFACT_PREFIX.len() + ARTIFACT_EXTENSION.len() + 1
        && name.starts_with(ARTIFACT_PREFIX)
        && name
            .rsplit_once('.')
            .map(|(_, ext)| ext.eq_ignore_ascii_case(ARTIFACT_EXTENSION))
            .unwrap_or(false)
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let path = self.path.clone();

        // Outside a runtime (e.g. during shutdown) fall back to a blocking remove
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    remove_quietly(&path).await;
                });
            }
            Err(_) => {
                if let Err(e) = std::fs::remove_file(&path) {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        tracing::debug!("Failed to cleanup temp file {:?}: {}", path, e);
                    }
                }
            }
        }
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::debug!("Failed to cleanup temp file {:?}: {}", path, e);
        }
    }
}
