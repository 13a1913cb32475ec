//! Log output setup for the command-line tool.
//!
//! Library code only emits `tracing` events; the binary decides where they go
//! with `--log`:
//! - `0` / `off` - no logging
//! - `1` / `stdout` - standard output
//! - `2` / `stderr` - standard error (default)
//! - anything else - a file, appended to, without ANSI colors
//!
//! `RUST_LOG` overrides the level chosen by `--verbose` when set.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Where log events are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LogTarget {
    Off,
    Stdout,
    #[default]
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "0" | "off" => LogTarget::Off,
            "1" | "stdout" => LogTarget::Stdout,
            "2" | "stderr" | "" => LogTarget::Stderr,
            filename => LogTarget::File(PathBuf::from(filename)),
        }
    }
}

/// Level used when `RUST_LOG` is not set.
pub fn default_level(verbose: bool) -> Level {
    if verbose { Level::DEBUG } else { Level::INFO }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(default_level(verbose)).into())
        .from_env_lossy()
}

/// Install the global subscriber for `target`.
pub fn init(target: &LogTarget, verbose: bool) -> Result<()> {
    match target {
        LogTarget::Off => {}
        LogTarget::Stdout => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter(verbose))
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogTarget::Stderr => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter(verbose))
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter(verbose))
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_targets() {
        assert_eq!(LogTarget::parse("0"), LogTarget::Off);
        assert_eq!(LogTarget::parse("off"), LogTarget::Off);
        assert_eq!(LogTarget::parse("1"), LogTarget::Stdout);
        assert_eq!(LogTarget::parse("stdout"), LogTarget::Stdout);
        assert_eq!(LogTarget::parse("2"), LogTarget::Stderr);
        assert_eq!(LogTarget::parse("stderr"), LogTarget::Stderr);
        assert_eq!(
            LogTarget::parse("run.log"),
            LogTarget::File(PathBuf::from("run.log"))
        );
    }

    #[test]
    fn test_default_target_is_stderr() {
        assert_eq!(LogTarget::default(), LogTarget::Stderr);
        assert_eq!(LogTarget::parse("  "), LogTarget::Stderr);
    }

    #[test]
    fn test_verbose_raises_level() {
        assert_eq!(default_level(false), Level::INFO);
        assert_eq!(default_level(true), Level::DEBUG);
    }
}
