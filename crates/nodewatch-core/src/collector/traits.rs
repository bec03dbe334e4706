//! Abstractions over the text sources the collector reads.
//!
//! The `FileSystem` trait covers `/proc` and `/sys`, the `CommandRunner` trait
//! covers external commands (`df`, `hostnamectl`, `journalctl`). Both have a
//! real implementation for Linux hosts and a mock in [`crate::collector::mock`].

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tokio::runtime::{self, Handle};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Abstraction for filesystem operations.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Lists entries in a directory. Order is unspecified.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(paths)
    }
}

/// Runs an external program and returns its standard output.
pub trait CommandRunner: Send + Sync {
    /// Executes `program` with `args`.
    ///
    /// Fails with an I/O error when the program cannot be started, exits with
    /// a non-zero status, prints non-UTF-8 output, or exceeds the runner's
    /// timeout.
    fn run(&self, program: &str, args: &[&str]) -> io::Result<String>;
}

/// Spawns real processes with a bounded wall-clock timeout.
///
/// The deadline covers the whole call: spawning, reading stdout to EOF and
/// reaping the child. A descendant that keeps stdout open cannot hold the
/// call past it. On expiry the child is killed.
#[derive(Debug, Clone)]
pub struct SystemCommands {
    timeout: Duration,
}

impl SystemCommands {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn run_async(&self, program: &str, args: &[&str]) -> io::Result<String> {
        debug!(program, ?args, "spawning command");
        let start = Instant::now();

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        // Dropping the pending future drops the child, which kills it.
        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                warn!(
                    program,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "command timed out, killing"
                );
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("{program} timed out after {:?}", self.timeout),
                ));
            }
        };

        if !output.status.success() {
            return Err(io::Error::other(format!(
                "{program} exited with {}",
                output.status
            )));
        }

        debug!(
            program,
            bytes = output.stdout.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "command finished"
        );

        String::from_utf8(output.stdout).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl Default for SystemCommands {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl CommandRunner for SystemCommands {
    /// Blocks the calling thread. Inside a tokio runtime this must run on a
    /// blocking thread (`spawn_blocking`), never on an async worker.
    fn run(&self, program: &str, args: &[&str]) -> io::Result<String> {
        let fut = self.run_async(program, args);
        match Handle::try_current() {
            Ok(handle) => handle.block_on(fut),
            Err(_) => runtime::Builder::new_current_thread()
                .enable_all()
                .build()?
                .block_on(fut),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_real_fs_read_to_string() {
        let fs = RealFs::new();
        let cargo_toml = env::current_dir().unwrap().join("Cargo.toml");
        let content = fs.read_to_string(&cargo_toml).unwrap();
        assert!(content.contains("[package]"));
    }

    #[test]
    fn test_real_fs_exists() {
        let fs = RealFs::new();
        let cargo_toml = env::current_dir().unwrap().join("Cargo.toml");
        assert!(fs.exists(&cargo_toml));
        assert!(!fs.exists(Path::new("/nonexistent/path/12345")));
    }

    #[test]
    fn test_real_fs_read_dir() {
        let fs = RealFs::new();
        let src_dir = env::current_dir().unwrap().join("src");
        let entries = fs.read_dir(&src_dir).unwrap();
        assert!(entries.iter().any(|p| p.ends_with("lib.rs")));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_commands_captures_stdout() {
        let runner = SystemCommands::default();
        let out = runner.run("echo", &["hello"]).unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_commands_missing_program() {
        let runner = SystemCommands::default();
        let err = runner.run("/nonexistent/program-12345", &[]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_system_commands_non_zero_exit() {
        let runner = SystemCommands::default();
        assert!(runner.run("false", &[]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_system_commands_timeout_kills_child() {
        let runner = SystemCommands::new(Duration::from_millis(100));
        let start = Instant::now();
        let err = runner.run("sleep", &["5"]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_commands_timeout_covers_inherited_stdout() {
        // The shell exits at once but its background job keeps stdout open.
        let runner = SystemCommands::new(Duration::from_millis(100));
        let start = Instant::now();
        let err = runner.run("sh", &["-c", "sleep 3 & echo hi"]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_commands_inside_blocking_task() {
        let rt = runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let _guard = rt.enter();
        let out = rt
            .block_on(tokio::task::spawn_blocking(|| {
                SystemCommands::default().run("echo", &["from", "pool"])
            }))
            .unwrap()
            .unwrap();
        assert_eq!(out.trim(), "from pool");
    }
}
