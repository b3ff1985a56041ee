use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the log directory
///
/// Resolution order:
/// 1. Custom directory from parameter (if provided)
/// 2. System location (/var/log/espeak-tts) when writable
/// 3. Per-user data directory
/// 4. Temp directory as last resort
pub fn get_log_directory(custom_dir: Option<&str>) -> Result<PathBuf, std::io::Error> {
    if let Some(dir) = custom_dir {
        return ensure_directory_exists(PathBuf::from(dir));
    }

    ensure_directory_exists(default_log_dir())
}

fn default_log_dir() -> PathBuf {
    if cfg!(unix) {
        let system_dir = PathBuf::from("/var/log/espeak-tts");
        if is_writable(&system_dir) || can_create(&system_dir) {
            return system_dir;
        }
    }

    if let Some(data_dir) = dirs::data_local_dir() {
        return data_dir.join("espeak-tts").join("logs");
    }

    env::temp_dir().join("espeak_tts_logs")
}

/// Check if a directory is writable
fn is_writable(path: &Path) -> bool {
    if !path.exists() {
        return false;
    }
    let test_file = path.join(".write_test");
    fs::write(&test_file, "test").is_ok() && {
        let _ = fs::remove_file(&test_file);
        true
    }
}

/// Check if we can create a directory
fn can_create(path: &Path) -> bool {
    if path.exists() {
        return is_writable(path);
    }
    path.parent()
        .map(|parent| parent.exists() && is_writable(parent))
        .unwrap_or(false)
}

fn ensure_directory_exists(path: PathBuf) -> Result<PathBuf, std::io::Error> {
    if !path.exists() {
        fs::create_dir_all(&path)?;
    }
    Ok(path)
}
