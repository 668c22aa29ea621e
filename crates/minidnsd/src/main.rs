// # minidnsd - record store daemon
//
// Thin integration layer over minidns-core:
// 1. Reading configuration from environment variables
// 2. Initializing tracing and the runtime
// 3. Building the record store through the store registry
// 4. Running the background sweeper until SIGTERM/SIGINT
// 5. Flushing the store on the way out
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Store
// - `MINIDNS_STORE_TYPE`: Type of record store (memory, file)
// - `MINIDNS_STORE_PATH`: Path to the store file (for file store)
//
// ### Resolution
// - `MINIDNS_MAX_CNAME_DEPTH`: Maximum CNAME hops (1-64, default 8)
//
// ### Sweeper
// - `MINIDNS_EXPIRE_INTERVAL_SECS`: Seconds between expiry scans (default 3600)
// - `MINIDNS_STATS_INTERVAL_SECS`: Seconds between stats snapshots (default 300)
// - `MINIDNS_DELETE_EXPIRED`: Delete expired records instead of reporting them
//
// ### Runtime
// - `MINIDNS_ENVIRONMENT`: development, testing or production
// - `MINIDNS_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export MINIDNS_STORE_TYPE=file
// export MINIDNS_STORE_PATH=/var/lib/minidns/records.json
// export MINIDNS_ENVIRONMENT=production
//
// minidnsd
// ```

use anyhow::{Context, Result};
use minidns_core::config::{ServiceConfig, StoreConfig, SweeperConfig};
use minidns_core::{MiniDnsConfig, RecordService, RecordSweeper, StoreRegistry};
use std::env;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// How long the sweeper gets to finish its current job after shutdown
const SWEEPER_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum MiniDnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<MiniDnsExitCode> for ExitCode {
    fn from(code: MiniDnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    store_type: String,
    store_path: Option<String>,
    max_cname_depth: Option<usize>,
    expire_interval_secs: Option<u64>,
    stats_interval_secs: Option<u64>,
    delete_expired: bool,
    environment: String,
    log_level: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            store_type: env::var("MINIDNS_STORE_TYPE").unwrap_or_else(|_| "memory".to_string()),
            store_path: env::var("MINIDNS_STORE_PATH").ok(),
            max_cname_depth: parse_var("MINIDNS_MAX_CNAME_DEPTH")?,
            expire_interval_secs: parse_var("MINIDNS_EXPIRE_INTERVAL_SECS")?,
            stats_interval_secs: parse_var("MINIDNS_STATS_INTERVAL_SECS")?,
            delete_expired: parse_var("MINIDNS_DELETE_EXPIRED")?.unwrap_or(false),
            environment: env::var("MINIDNS_ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            log_level: env::var("MINIDNS_LOG_LEVEL").ok(),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match self.store_type.as_str() {
            "memory" => {}
            "file" => match self.store_path.as_deref() {
                None | Some("") => anyhow::bail!(
                    "MINIDNS_STORE_PATH is required when MINIDNS_STORE_TYPE=file. \
                    Set it via: export MINIDNS_STORE_PATH=/var/lib/minidns/records.json"
                ),
                Some(path) => {
                    if let Some(parent) = std::path::Path::new(path).parent()
                        && !parent.as_os_str().is_empty()
                        && !parent.exists()
                    {
                        anyhow::bail!(
                            "MINIDNS_STORE_PATH parent directory does not exist: {}. \
                            Create it first: sudo mkdir -p {}",
                            parent.display(),
                            parent.display()
                        );
                    }
                }
            },
            _ => anyhow::bail!(
                "MINIDNS_STORE_TYPE '{}' is not supported. \
                Supported types: memory, file",
                self.store_type
            ),
        }

        match self.environment.as_str() {
            "development" | "testing" | "production" => {}
            _ => anyhow::bail!(
                "MINIDNS_ENVIRONMENT '{}' is not valid. \
                Valid environments: development, testing, production",
                self.environment
            ),
        }

        if self.environment == "production" && self.store_type == "memory" {
            eprintln!(
                "WARNING: MINIDNS_STORE_TYPE=memory in production. \
                Records will be lost on restart."
            );
        }

        if let Some(level) = &self.log_level {
            match level.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => {}
                _ => anyhow::bail!(
                    "MINIDNS_LOG_LEVEL '{}' is not valid. \
                    Valid levels: trace, debug, info, warn, error",
                    level
                ),
            }
        }

        // Range checks on the library side
        self.to_core_config().validate()?;

        Ok(())
    }

    /// Build the library configuration
    fn to_core_config(&self) -> MiniDnsConfig {
        let store = match self.store_type.as_str() {
            "file" => StoreConfig::File {
                path: self.store_path.clone().unwrap_or_default(),
            },
            _ => StoreConfig::Memory,
        };

        let defaults = SweeperConfig::default();
        MiniDnsConfig {
            store,
            service: ServiceConfig {
                max_cname_depth: self
                    .max_cname_depth
                    .unwrap_or_else(|| ServiceConfig::default().max_cname_depth),
            },
            sweeper: SweeperConfig {
                expire_interval_secs: self
                    .expire_interval_secs
                    .unwrap_or(defaults.expire_interval_secs),
                stats_interval_secs: self
                    .stats_interval_secs
                    .unwrap_or(defaults.stats_interval_secs),
                delete_expired: self.delete_expired,
            },
        }
    }

    /// Log level from MINIDNS_LOG_LEVEL, or by environment
    fn log_level(&self) -> Level {
        let level = self.log_level.as_deref().unwrap_or(match self.environment.as_str() {
            "development" => "debug",
            "production" => "warn",
            _ => "info",
        });

        match level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Parse an optional environment variable
fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} has an invalid value: '{}'", name, value)),
        Err(_) => Ok(None),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return MiniDnsExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return MiniDnsExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return MiniDnsExitCode::ConfigError.into();
    }

    info!("Starting minidnsd daemon ({})", config.environment);

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return MiniDnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run_daemon(config.to_core_config()).await {
            Ok(()) => MiniDnsExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                MiniDnsExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: MiniDnsConfig) -> Result<()> {
    let registry = StoreRegistry::with_builtin();
    info!("Record store type: {}", config.store.type_name());

    let store = registry
        .create_store(&config.store)
        .await
        .context("Failed to create record store")?;

    let service = RecordService::new(store.clone(), config.service)?;
    info!(
        "Record service ready: {} host(s), {} record(s), max CNAME depth {}",
        service.list_hosts().await?.len(),
        service.list_records(None).await?.len(),
        service.max_cname_depth()
    );

    let sweeper = RecordSweeper::new(store.clone(), config.sweeper)?;
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let sweeper_handle = tokio::spawn(async move { sweeper.run_with_shutdown(shutdown_rx).await });

    let signal = wait_for_shutdown().await?;
    info!("Received shutdown signal: {}", signal);

    if shutdown_tx.send(()).is_err() {
        warn!("Sweeper already stopped");
    }

    match tokio::time::timeout(SWEEPER_STOP_TIMEOUT, sweeper_handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Sweeper task failed: {}", e),
        Err(_) => warn!("Sweeper did not stop within {:?}", SWEEPER_STOP_TIMEOUT),
    }

    store.flush().await.context("Failed to flush record store")?;
    info!("Record store flushed, daemon stopped");

    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for CTRL-C")?;
    Ok("SIGINT")
}
