pub mod constants;

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::keystore::RecencyPolicy;
use crate::rate_limit::RateLimitConfig;

/// Process-wide server configuration, built once at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// SQLite file holding issued API keys
    pub db_path: PathBuf,

    /// Directory for temporary audio artifacts
    pub scratch_dir: PathBuf,

    /// espeak-ng binary, either a bare name looked up on PATH or a path
    pub engine_binary: PathBuf,

    /// Voice used when the requested language has no mapping
    pub default_voice: String,

    /// Directory containing index.html
    pub template_dir: PathBuf,

    pub recency: RecencyPolicy,
    pub request_timeout: Duration,

    /// Interval of the background artifact sweep (None disables it)
    pub cleanup_interval: Option<Duration>,

    /// Artifacts younger than this survive periodic and on-demand sweeps
    pub cleanup_min_age: Duration,

    /// Per-IP limit on key issuance (None disables it)
    pub key_rate_limit: Option<RateLimitConfig>,

    /// Take client addresses from `X-Forwarded-For` / `X-Real-IP`
    pub trust_proxy: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            db_path: PathBuf::from("api_keys.db"),
            scratch_dir: env::temp_dir().join("espeak_tts"),
            engine_binary: PathBuf::from("espeak-ng"),
            default_voice: "en-us".to_string(),
            template_dir: PathBuf::from("templates"),
            recency: RecencyPolicy::default(),
            request_timeout: Duration::from_secs(60),
            cleanup_interval: Some(Duration::from_secs(600)),
            cleanup_min_age: Duration::from_secs(300),
            key_rate_limit: Some(RateLimitConfig::default()),
            trust_proxy: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Unset or unparsable values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST").filter(|h| !h.trim().is_empty()) {
            config.host = host;
        }
        if let Some(port) = parse_var(&lookup, "PORT") {
            config.port = port;
        }

        if let Some(path) = non_empty(&lookup, "SQLITE_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        if let Some(dir) = non_empty(&lookup, "TTS_SCRATCH_DIR") {
            config.scratch_dir = PathBuf::from(dir);
        }
        if let Some(bin) = non_empty(&lookup, "ESPEAK_BIN") {
            config.engine_binary = PathBuf::from(bin);
        }
        if let Some(voice) = non_empty(&lookup, "TTS_DEFAULT_VOICE") {
            config.default_voice = voice;
        }
        if let Some(dir) = non_empty(&lookup, "TTS_TEMPLATE_DIR") {
            config.template_dir = PathBuf::from(dir);
        }

        // Key recency policy
        if let Some(strict) = lookup("API_KEY_STRICT_RECENCY") {
            config.recency.strict_recency = parse_bool(&strict, true);
        }
        if let Some(days) = parse_var::<i64, _>(&lookup, "API_KEY_RECENCY_DAYS") {
            if days > 0 {
                config.recency.window_days = days;
            }
        }

        if let Some(secs) = parse_var::<u64, _>(&lookup, "REQUEST_TIMEOUT_SECONDS") {
            config.request_timeout = Duration::from_secs(secs);
        }

        // Artifact sweep
        if let Some(secs) = parse_var::<u64, _>(&lookup, "CLEANUP_INTERVAL_SECONDS") {
            config.cleanup_interval = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "CLEANUP_MIN_AGE_SECONDS") {
            config.cleanup_min_age = Duration::from_secs(secs);
        }

        // Key issuance rate limiting
        let mode = lookup("RATE_LIMIT_MODE")
            .unwrap_or_else(|| "per-ip".to_string())
            .to_lowercase();
        config.key_rate_limit = match mode.as_str() {
            "disabled" | "off" | "none" => None,
            _ => {
                let mut limit = RateLimitConfig::default();
                if let Some(per_second) = parse_var::<u32, _>(&lookup, "RATE_LIMIT_KEYS_PER_SECOND") {
                    if per_second > 0 {
                        limit.per_second = per_second;
                    }
                }
                if let Some(burst) = parse_var::<u32, _>(&lookup, "RATE_LIMIT_KEYS_BURST_SIZE") {
                    if burst > 0 {
                        limit.burst_size = burst;
                    }
                }
                Some(limit)
            }
        };

        if let Some(trust) = lookup("TRUSTED_PROXY") {
            config.trust_proxy = parse_bool(&trust, false);
        }

        config
    }

    /// Socket address string to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(name).and_then(|v| v.trim().parse::<T>().ok())
}

fn parse_bool(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}
