mod access_log;
mod handlers;
mod openapi;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
#[cfg(target_os = "linux")]
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};

#[cfg(not(target_os = "linux"))]
use nodewatch_core::collector::mock::{MockCommands, MockFs};
use nodewatch_core::collector::{Collector, CollectorConfig};
#[cfg(target_os = "linux")]
use nodewatch_core::collector::{RealFs, SystemCommands};
use nodewatch_core::registry::Registry;
use nodewatch_core::storage::{LogStore, MemoryStore, ObservationStore, RetentionPolicy};

use state::AppState;

// ============================================================
// CLI
// ============================================================

#[derive(Parser)]
#[command(
    name = "nodewatch-web",
    about = "nodewatch REST API server",
    version = nodewatch_core::VERSION
)]
struct Args {
    /// Listen address.
    #[arg(long, default_value = "0.0.0.0:8000", env = "NODEWATCH_LISTEN")]
    listen: String,

    /// Directory of the observation log.
    /// If not specified, observations are kept in memory only.
    #[arg(long, env = "NODEWATCH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Path to /proc filesystem.
    #[arg(long, default_value = "/proc", env = "NODEWATCH_PROC_PATH")]
    proc_path: PathBuf,

    /// Path to /sys filesystem.
    #[arg(long, default_value = "/sys", env = "NODEWATCH_SYS_PATH")]
    sys_path: PathBuf,

    /// Timeout for external commands (df, hostnamectl, journalctl), in seconds.
    #[arg(long, default_value = "5", env = "NODEWATCH_COMMAND_TIMEOUT")]
    command_timeout: u64,

    /// Days of history kept by `/truncate` without an explicit datetime.
    #[arg(
        long,
        default_value = "7",
        env = "NODEWATCH_RETENTION_DAYS",
        value_parser = clap::value_parser!(u32).range(1..=36500)
    )]
    retention_days: u32,
}

// ============================================================
// Main
// ============================================================

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("nodewatch_web=info,nodewatch_core=info")
                }),
        )
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to build tokio runtime");
            process::exit(1);
        }
    };
    runtime.block_on(async_main(args));
}

async fn async_main(args: Args) {
    info!(version = nodewatch_core::VERSION, "starting nodewatch-web");

    let store: Box<dyn ObservationStore> = match args.data_dir {
        Some(ref dir) => match LogStore::open(dir) {
            Ok(store) => Box::new(store),
            Err(e) => {
                error!(path = %dir.display(), error = %e, "failed to open observation log");
                process::exit(1);
            }
        },
        None => {
            info!("no data directory configured, observations are kept in memory");
            Box::new(MemoryStore::new())
        }
    };

    let collector = create_collector(&args);
    let config = collector.config();
    info!(
        proc_path = %config.proc_path.display(),
        sys_path = %config.sys_path.display(),
        "collector configured"
    );
    if !collector.proc_available() {
        warn!(path = %config.proc_path.display(), "procfs not found, collections will fail");
    }

    let state = AppState::new(
        Registry::standard(),
        collector,
        store,
        RetentionPolicy::new(args.retention_days),
    );

    let app = routes::build_router(state).into_make_service_with_connect_info::<SocketAddr>();

    let addr: SocketAddr = match args.listen.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(listen = %args.listen, error = %e, "invalid listen address");
            process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind");
            process::exit(1);
        }
    };
    info!(%addr, "listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %e, "server error");
        process::exit(1);
    }
    info!("shut down");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

fn create_collector(args: &Args) -> Collector {
    let config = CollectorConfig {
        proc_path: args.proc_path.clone(),
        sys_path: args.sys_path.clone(),
    };
    #[cfg(target_os = "linux")]
    {
        let commands = SystemCommands::new(Duration::from_secs(args.command_timeout));
        Collector::new(RealFs::new(), commands, config)
    }
    #[cfg(not(target_os = "linux"))]
    {
        info!(
            command_timeout = args.command_timeout,
            "not a linux host, serving mock metrics"
        );
        Collector::new(MockFs::typical_system(), MockCommands::typical_system(), config)
    }
}
