use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::time::sleep;

use crate::utils::temp_file::is_artifact_name;

/// Outcome of one sweep over the scratch directory
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: usize,
    pub failed: usize,
}

/// Delete temporary audio artifacts from `dir`
///
/// With `min_age`, only artifacts last modified at least that long ago are
/// removed, so files still being produced or streamed are left alone.
/// Individual failures are logged and counted, never propagated. Only a
/// failure to list the directory itself is an error.
pub async fn sweep_artifacts(dir: &Path, min_age: Option<Duration>) -> io::Result<SweepReport> {
    let mut report = SweepReport::default();
    let cutoff = min_age.and_then(|age| SystemTime::now().checked_sub(age));

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let is_artifact = name.to_str().map(is_artifact_name).unwrap_or(false);
        if !is_artifact {
            continue;
        }

        let metadata = match entry.metadata().await {
            Ok(meta) => meta,
            Err(_) => continue,
        };
        if !metadata.is_file() {
            continue;
        }

        if let Some(cutoff) = cutoff {
            let modified = metadata.modified().unwrap_or_else(|_| SystemTime::now());
            if modified > cutoff {
                continue;
            }
        }

        let path = entry.path();
        match tokio::fs::remove_file(&path).await {
            Ok(()) => report.removed += 1,
            // Already gone, e.g. removed by its own request
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Failed to remove audio artifact");
                report.failed += 1;
            }
        }
    }

    if report.removed > 0 || report.failed > 0 {
        tracing::info!(
            dir = ?dir,
            removed = report.removed,
            failed = report.failed,
            "Artifact sweep finished"
        );
    } else {
        tracing::debug!(dir = ?dir, "Artifact sweep found nothing to remove");
    }

    Ok(report)
}

/// Background task that periodically removes stale artifacts
pub async fn sweep_task(dir: PathBuf, interval: Duration, min_age: Duration) {
    loop {
        sleep(interval).await;

        if let Err(e) = sweep_artifacts(&dir, Some(min_age)).await {
            tracing::error!(
                error = %e,
                dir = ?dir,
                "Artifact sweep failed"
            );
        }
    }
}
