use espeak_tts_server::cleanup::{sweep_artifacts, sweep_task};
use espeak_tts_server::cli::{parse_args, print_help, print_version};
use espeak_tts_server::config::ServerConfig;
use espeak_tts_server::keystore::{fingerprint, KeyStore};
use espeak_tts_server::logging::{init_logging, log_platform_info, AccessLogSettings, LogConfig};
use espeak_tts_server::rate_limit::eviction_task;
use espeak_tts_server::server::{create_router, AppState};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;

/// How often idle per-IP rate limit buckets are dropped
const LIMITER_EVICTION_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists (silently ignore if it doesn't)
    let _ = dotenvy::dotenv();

    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("error: {}", msg);
            eprintln!("Run with --help for usage");
            std::process::exit(2);
        }
    };

    if args.show_help {
        print_help();
        return Ok(());
    }
    if args.show_version {
        print_version();
        return Ok(());
    }

    let log_config = LogConfig::from_env();
    let _log_guards = init_logging(&log_config)?;
    log_platform_info();

    let mut config = ServerConfig::from_env();
    args.apply(&mut config);

    let key_store = KeyStore::open(&config.db_path, config.recency).await?;

    // Maintenance mode: revoke and exit
    if let Some(key) = args.revoke.as_deref() {
        let revoked = key_store.set_active(key, false).await?;
        key_store.close().await;

        if revoked {
            tracing::info!(key_fingerprint = %fingerprint(key), "API key revoked");
            println!("API key revoked");
            return Ok(());
        }
        eprintln!("API key not found");
        std::process::exit(1);
    }

    tokio::fs::create_dir_all(&config.scratch_dir).await?;

    let state = AppState::new(config.clone(), key_store.clone()).with_access_log(
        AccessLogSettings {
            slow_request_threshold: log_config.slow_request_threshold(),
            trust_proxy: config.trust_proxy,
        },
    );

    // A missing engine is reported per request; warn early so operators notice
    match state.engine.resolve_binary() {
        Ok(path) => tracing::info!(engine = ?path, "Using espeak-ng"),
        Err(e) => tracing::warn!(error = %e, "espeak-ng not found, synthesis requests will fail"),
    }

    if let Some(interval) = config.cleanup_interval {
        tokio::spawn(sweep_task(
            config.scratch_dir.clone(),
            interval,
            config.cleanup_min_age,
        ));
    }

    if let Some(limiter) = state.key_limiter.clone() {
        tokio::spawn(eviction_task(limiter, LIMITER_EVICTION_INTERVAL));
    }

    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("eSpeak TTS Server v{}", env!("CARGO_PKG_VERSION"));
    println!("\nServer listening on http://{}", addr);
    println!("\nAvailable endpoints (also under /api):");
    println!("  GET    /                 - Landing page");
    println!("  POST   /keys/generate    - Issue an API key");
    println!("  POST   /tts              - Generate speech");
    println!("  POST   /cleanup          - Remove stale audio files");
    println!("  GET    /voices           - List available voices");
    println!("  GET    /health           - Health check");
    println!("\nAuthentication:");
    if config.recency.strict_recency {
        println!(
            "  Keys expire after {} days without use",
            config.recency.window_days
        );
    } else {
        println!("  Keys stay valid until revoked");
    }
    println!("\nRate Limiting (key issuance):");
    match &config.key_rate_limit {
        Some(limit) => {
            println!("  Status: ENABLED (per IP)");
            if config.trust_proxy {
                println!("  Client address: X-Forwarded-For / X-Real-IP (TRUSTED_PROXY=true)");
            } else {
                println!("  Client address: connection peer");
            }
            println!("  Rate: {} requests/second", limit.per_second);
            println!("  Burst size: {} requests", limit.burst_size);
        }
        None => {
            println!("  Status: DISABLED");
            println!("  Set RATE_LIMIT_MODE=per-ip to enable protection");
        }
    }
    println!("\nRequest Timeout: {} seconds", config.request_timeout.as_secs());

    tracing::info!(addr = %addr, "Server started");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Shutting down, removing remaining audio files");
    if let Err(e) = sweep_artifacts(&config.scratch_dir, None).await {
        tracing::error!(error = %e, "Final artifact sweep failed");
    }
    key_store.close().await;

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
