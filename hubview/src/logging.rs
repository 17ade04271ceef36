// SPDX-License-Identifier: GPL-3.0-only

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

use crate::config::{Config, LoggingLevel};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const DEFAULT_LOG_PREFIX: &str = "hubview.log";
const KEEP_DAYS: u64 = 7;

fn default_filter(level: LoggingLevel) -> EnvFilter {
    let level = level.as_directive();
    EnvFilter::new(format!(
        "warn,hubview={level},hubview_core={level},hubview_contracts={level}"
    ))
}

/// Install the global subscriber: stderr always, a daily log file when
/// `log_to_disk` is set. `RUST_LOG` overrides the configured level.
pub(crate) fn init(config: &Config, verbose: bool) {
    let level = if verbose {
        LoggingLevel::Debug
    } else {
        config.log_level
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(env_filter);

    if !config.log_to_disk {
        tracing_subscriber::registry().with(stderr_layer).init();
        return;
    }

    match file_writer() {
        Ok((writer, guard)) => {
            let file_filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(level));
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .with_filter(file_filter);

            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(file_layer)
                .init();

            // Keep the background logging worker alive for the duration of the process.
            let _ = LOG_GUARD.set(guard);
        }
        Err(e) => {
            eprintln!("hubview: failed to initialize file logging: {e:#}");
            tracing_subscriber::registry().with(stderr_layer).init();
        }
    }
}

fn file_writer() -> anyhow::Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let (dir, prefix) = resolve_log_location();

    if let Err(e) = fs::create_dir_all(&dir) {
        return Err(anyhow::anyhow!(
            "create log directory failed: {} ({})",
            dir.display(),
            e
        ));
    }

    cleanup_old_logs(&dir, &prefix, SystemTime::now());

    let appender = tracing_appender::rolling::daily(&dir, &prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    Ok((writer, guard))
}

fn resolve_log_location() -> (PathBuf, OsString) {
    if let Some(dir) = std::env::var_os("HUBVIEW_LOG_DIR") {
        return (PathBuf::from(dir), OsString::from(DEFAULT_LOG_PREFIX));
    }

    (default_log_dir(), OsString::from(DEFAULT_LOG_PREFIX))
}

fn default_log_dir() -> PathBuf {
    if let Some(xdg_state) = std::env::var_os("XDG_STATE_HOME") {
        return PathBuf::from(xdg_state).join("hubview").join("logs");
    }

    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("state")
            .join("hubview")
            .join("logs");
    }

    std::env::temp_dir().join("hubview").join("logs")
}

fn cleanup_old_logs(dir: &Path, prefix: &OsString, now: SystemTime) {
    let Some(cutoff) = now.checked_sub(Duration::from_secs(KEEP_DAYS * 24 * 60 * 60)) else {
        return;
    };

    let prefix = prefix.to_string_lossy();

    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }

        // Only touch files created by our rolling appender.
        if !entry
            .file_name()
            .to_string_lossy()
            .starts_with(prefix.as_ref())
        {
            continue;
        }

        let Ok(modified) = entry.metadata().and_then(|metadata| metadata.modified()) else {
            continue;
        };
        if modified >= cutoff {
            continue;
        }

        let _ = fs::remove_file(entry.path());
    }
}
