/// CLI argument parsing and help text
use crate::config::ServerConfig;

/// Flags accepted on the command line; all optional
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Deactivate this key and exit
    pub revoke: Option<String>,
    pub show_help: bool,
    pub show_version: bool,
}

impl CliArgs {
    /// Flags take precedence over the environment
    pub fn apply(&self, config: &mut ServerConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
    }
}

/// Parse arguments, excluding the program name
pub fn parse_args<I>(args: I) -> Result<CliArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => parsed.show_help = true,
            "-v" | "--version" => parsed.show_version = true,
            // Server mode is the only mode
            "--server" => {}
            "--port" => {
                let value = args.next().ok_or("--port requires a value")?;
                let port = value
                    .parse::<u16>()
                    .map_err(|_| format!("invalid port: {}", value))?;
                parsed.port = Some(port);
            }
            "--host" => {
                parsed.host = Some(args.next().ok_or("--host requires a value")?);
            }
            "--revoke" => {
                parsed.revoke = Some(args.next().ok_or("--revoke requires an API key")?);
            }
            other => return Err(format!("unknown argument: {}", other)),
        }
    }

    Ok(parsed)
}

pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!("eSpeak TTS Server v{}", version);
    println!("HTTP text-to-speech service powered by espeak-ng");
    println!();
    println!("USAGE:");
    println!("    espeak_tts_server [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --host <HOST>         Bind address (default: 0.0.0.0)");
    println!("    --port <PORT>         Server port (default: 5000)");
    println!("    --revoke <KEY>        Deactivate an API key and exit");
    println!("    -h, --help            Print this help message");
    println!("    -v, --version         Print version information");
    println!();
    println!("SERVER ENDPOINTS (also available under /api):");
    println!("    GET    /                 - Landing page");
    println!("    POST   /keys/generate    - Issue an API key");
    println!("    POST   /tts              - Generate speech from form fields (API key required)");
    println!("    POST   /cleanup          - Remove stale audio files (API key required)");
    println!("    GET    /voices           - List installed voices");
    println!("    GET    /health           - Health check");
    println!();
    println!("ENVIRONMENT VARIABLES:");
    println!("    HOST, PORT                       - Bind address and port");
    println!("    SQLITE_DB_PATH                   - API key database (default: api_keys.db)");
    println!("    ESPEAK_BIN                       - espeak-ng binary (default: espeak-ng)");
    println!("    TTS_SCRATCH_DIR                  - Directory for temporary audio (default: <tmp>/espeak_tts)");
    println!("    TTS_DEFAULT_VOICE                - Fallback voice (default: en-us)");
    println!("    TTS_TEMPLATE_DIR                 - Directory holding index.html");
    println!("    API_KEY_STRICT_RECENCY           - Expire unused keys (default: true)");
    println!("    API_KEY_RECENCY_DAYS             - Expiry window in days (default: 30)");
    println!("    REQUEST_TIMEOUT_SECONDS          - Request timeout in seconds (default: 60)");
    println!("    CLEANUP_INTERVAL_SECONDS         - Background sweep interval, 0 disables (default: 600)");
    println!("    CLEANUP_MIN_AGE_SECONDS          - Minimum artifact age for sweeps (default: 300)");
    println!("    RATE_LIMIT_MODE                  - Key issuance limit (per-ip/disabled)");
    println!("    TRUSTED_PROXY                    - Rate limit by X-Forwarded-For (default: false)");
    println!("    ESPEAK_TTS_LOG_DIR               - Log directory override");
    println!("    RUST_LOG                         - Console log filter");
    println!();
    println!("CONFIGURATION:");
    println!("    Settings can also be placed in a .env file in the working directory");
}

pub fn print_version() {
    println!("eSpeak TTS Server v{}", env!("CARGO_PKG_VERSION"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, String> {
        parse_args(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn test_no_args() {
        assert_eq!(parse(&[]).unwrap(), CliArgs::default());
    }

    #[test]
    fn test_port_and_host() {
        let args = parse(&["--server", "--port", "8080", "--host", "127.0.0.1"]).unwrap();
        assert_eq!(args.port, Some(8080));
        assert_eq!(args.host.as_deref(), Some("127.0.0.1"));
    }

    #[test]
    fn test_invalid_port() {
        assert!(parse(&["--port", "http"]).is_err());
        assert!(parse(&["--port"]).is_err());
    }

    #[test]
    fn test_revoke() {
        let args = parse(&["--revoke", "abc"]).unwrap();
        assert_eq!(args.revoke.as_deref(), Some("abc"));
    }

    #[test]
    fn test_flags() {
        let args = parse(&["-h", "--version"]).unwrap();
        assert!(args.show_help);
        assert!(args.show_version);
    }

    #[test]
    fn test_unknown_argument() {
        assert_eq!(
            parse(&["--pool-size", "3"]).unwrap_err(),
            "unknown argument: --pool-size"
        );
    }

    #[test]
    fn test_apply_overrides_config() {
        let mut config = ServerConfig::default();
        let args = parse(&["--port", "9000"]).unwrap();
        args.apply(&mut config);

        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "0.0.0.0");
    }
}
