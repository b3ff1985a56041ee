use std::env;
use std::time::Duration;

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Custom log directory path (overrides auto-detection)
    pub custom_log_dir: Option<String>,

    /// Filter directives for console output
    pub console_log_level: String,

    /// Filter directives for the application log file
    pub file_log_level: String,

    /// Write JSON access/application logs to disk (default: true)
    pub files_enabled: bool,

    /// Requests slower than this are reported in the application log
    pub slow_request_threshold_ms: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            custom_log_dir: None,
            console_log_level: "espeak_tts_server=info,tower_http=warn,sqlx=warn".to_string(),
            file_log_level: "debug".to_string(),
            files_enabled: true,
            slow_request_threshold_ms: 5000,
        }
    }
}

impl LogConfig {
    /// Load logging configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("ESPEAK_TTS_LOG_DIR").filter(|d| !d.trim().is_empty()) {
            config.custom_log_dir = Some(dir);
        }

        if let Some(level) = lookup("RUST_LOG").filter(|l| !l.trim().is_empty()) {
            config.console_log_level = level;
        }

        if let Some(level) = lookup("TTS_FILE_LOG_LEVEL").filter(|l| !l.trim().is_empty()) {
            config.file_log_level = level;
        }

        if let Some(val) = lookup("LOG_FILES_ENABLED") {
            config.files_enabled = val.to_lowercase() != "false";
        }

        if let Some(threshold) = lookup("LOG_SLOW_REQUEST_THRESHOLD_MS").and_then(|v| v.parse().ok()) {
            config.slow_request_threshold_ms = threshold;
        }

        config
    }

    pub fn slow_request_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_request_threshold_ms)
    }
}
