use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{Level, debug, error};
use tracing_subscriber::EnvFilter;

use nodewatch_core::collector::{Collector, CollectorConfig, RealFs, SystemCommands};
use nodewatch_core::registry::Registry;
use nodewatch_core::storage::{LogStore, ObservationStore, RetentionPolicy};

type CliResult = Result<Value, Box<dyn Error>>;

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "nodewatch-dump",
    about = "Collect host metrics and inspect nodewatch observation logs",
    version = nodewatch_core::VERSION
)]
struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the known categories.
    Categories,

    /// Collect one category now and print it.
    Collect {
        category: String,

        /// Also append the result to the observation log in this directory.
        #[arg(long, env = "NODEWATCH_DATA_DIR")]
        data_dir: Option<PathBuf>,

        #[arg(long, default_value = "/proc", env = "NODEWATCH_PROC_PATH")]
        proc_path: PathBuf,

        #[arg(long, default_value = "/sys", env = "NODEWATCH_SYS_PATH")]
        sys_path: PathBuf,

        /// Timeout for external commands, in seconds.
        #[arg(long, default_value = "5", env = "NODEWATCH_COMMAND_TIMEOUT")]
        command_timeout: u64,
    },

    /// Print stored observations of one category, newest first.
    List {
        category: String,

        #[arg(long, env = "NODEWATCH_DATA_DIR")]
        data_dir: PathBuf,
    },

    /// Delete observations older than a cutoff.
    Truncate {
        #[arg(long, env = "NODEWATCH_DATA_DIR")]
        data_dir: PathBuf,

        /// Cutoff (RFC 3339, date, unix seconds or relative like -7d).
        #[arg(long)]
        datetime: Option<String>,

        /// Window used when no datetime is given.
        #[arg(
            long,
            default_value = "7",
            env = "NODEWATCH_RETENTION_DAYS",
            value_parser = clap::value_parser!(u32).range(1..=36500)
        )]
        retention_days: u32,
    },
}

/// Logs go to stderr so stdout stays valid JSON.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["nodewatch_dump", "nodewatch_core"] {
        if let Ok(directive) = format!("{target}={level}").parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let registry = Registry::standard();
    let result = match cli.command {
        Command::Categories => Ok(Value::from(registry.categories())),
        Command::Collect {
            category,
            data_dir,
            proc_path,
            sys_path,
            command_timeout,
        } => {
            let collector = Collector::new(
                RealFs::new(),
                SystemCommands::new(Duration::from_secs(command_timeout)),
                CollectorConfig {
                    proc_path,
                    sys_path,
                },
            );
            collect(&registry, &collector, &category, data_dir.as_deref())
        }
        Command::List { category, data_dir } => list(&registry, &data_dir, &category),
        Command::Truncate {
            data_dir,
            datetime,
            retention_days,
        } => truncate(
            &data_dir,
            datetime.as_deref(),
            RetentionPolicy::new(retention_days),
        ),
    };

    match result.and_then(|value| Ok(serde_json::to_string_pretty(&value)?)) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    }
}

// ── Commands ─────────────────────────────────────────────────────────────────

fn collect(
    registry: &Registry,
    collector: &Collector,
    category: &str,
    data_dir: Option<&Path>,
) -> CliResult {
    let data = registry.collect(category, collector)?.to_json()?;
    let Some(dir) = data_dir else {
        return Ok(data);
    };

    let mut store = LogStore::open(dir)?;
    let observation = store.append(category, Utc::now(), data)?;
    debug!(id = observation.id, "observation appended");
    Ok(serde_json::to_value(observation)?)
}

fn list(registry: &Registry, data_dir: &Path, category: &str) -> CliResult {
    registry.resolve(category)?;
    let store = LogStore::open(data_dir)?;
    Ok(serde_json::to_value(store.list(category)?)?)
}

fn truncate(data_dir: &Path, datetime: Option<&str>, policy: RetentionPolicy) -> CliResult {
    let cutoff = policy.resolve_cutoff(datetime, Utc::now())?;
    let mut store = LogStore::open(data_dir)?;
    let report = policy.truncate(&mut store, Some(cutoff))?;
    Ok(serde_json::to_value(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use nodewatch_core::collector::mock::{MockCommands, MockFs};
    use serde_json::json;
    use tempfile::TempDir;

    fn mock_collector() -> Collector {
        Collector::new(
            MockFs::typical_system(),
            MockCommands::typical_system(),
            CollectorConfig::default(),
        )
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "nodewatch-dump",
            "-vv",
            "truncate",
            "--data-dir",
            "/tmp/nw",
            "--datetime",
            "-3d",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Truncate {
                datetime,
                retention_days,
                ..
            } => {
                assert_eq!(datetime.as_deref(), Some("-3d"));
                assert_eq!(retention_days, 7);
            }
            _ => panic!("expected truncate"),
        }
    }

    #[test]
    fn test_cli_rejects_retention_window_out_of_range() {
        for days in ["0", "36501", "200000000"] {
            let parsed = Cli::try_parse_from([
                "nodewatch-dump",
                "truncate",
                "--data-dir",
                "/tmp/nw",
                "--retention-days",
                days,
            ]);
            assert!(parsed.is_err(), "{days} accepted");
        }
    }

    #[test]
    fn test_collect_without_store_prints_metric() {
        let value = collect(&Registry::standard(), &mock_collector(), "loadavg", None).unwrap();
        assert_eq!(value["loadavg1"], 0.15);
    }

    #[test]
    fn test_collect_appends_and_list_reads_back() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::standard();
        let collector = mock_collector();

        let first = collect(&registry, &collector, "mem", Some(dir.path())).unwrap();
        let second = collect(&registry, &collector, "mem", Some(dir.path())).unwrap();
        assert_eq!(first["id"], 1);
        assert_eq!(second["id"], 2);

        let listed = list(&registry, dir.path(), "mem").unwrap();
        let ids: Vec<u64> = listed
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_unknown_category_is_error() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::standard();
        assert!(collect(&registry, &mock_collector(), "machineid", None).is_err());
        assert!(list(&registry, dir.path(), "machineid").is_err());
    }

    #[test]
    fn test_truncate_reports_remaining() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = LogStore::open(dir.path()).unwrap();
            let collected = Utc::now() - ChronoDuration::seconds(1);
            for i in 0..14 {
                store
                    .append("cpu", collected - ChronoDuration::days(i), json!({}))
                    .unwrap();
            }
        }

        let report = truncate(dir.path(), None, RetentionPolicy::default()).unwrap();
        assert_eq!(report["deleted"], 7);
        assert_eq!(report["remaining"], 7);

        assert!(truncate(dir.path(), Some("why"), RetentionPolicy::default()).is_err());
        let store = LogStore::open(dir.path()).unwrap();
        assert_eq!(store.count().unwrap(), 7);
    }
}
