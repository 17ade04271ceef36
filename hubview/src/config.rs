// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use hubview_core::RetryPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LoggingLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Built-in sample hubs, devices and modules
    #[default]
    Demo,
    /// External command line tool (az by default)
    Command,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    /// Simulated latency of every demo call
    pub latency_ms: u64,
    /// Number of failed fetches before a parent starts answering
    pub failures_per_parent: u32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            latency_ms: 150,
            failures_per_parent: 0,
        }
    }
}

/// Argument templates for the command provider.
///
/// `{hub}` and `{device}` are substituted before the command runs (`{name}`
/// is an alias of `{device}` when creating); every
/// listing command must print a JSON array on stdout. `monitor_device` keeps
/// running and every line it prints is one message.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct CommandConfig {
    pub program: String,
    pub list_hubs: Vec<String>,
    pub list_devices: Vec<String>,
    pub list_modules: Vec<String>,
    pub create_device: Vec<String>,
    pub delete_device: Vec<String>,
    pub monitor_device: Vec<String>,
}

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            program: "az".to_string(),
            list_hubs: args(&["iot", "hub", "list", "--query", "[].{name:name}", "-o", "json"]),
            list_devices: args(&[
                "iot", "hub", "device-identity", "list", "--hub-name", "{hub}", "-o", "json",
            ]),
            list_modules: args(&[
                "iot", "hub", "module-identity", "list", "--hub-name", "{hub}", "--device-id",
                "{device}", "-o", "json",
            ]),
            create_device: args(&[
                "iot", "hub", "device-identity", "create", "--hub-name", "{hub}", "--device-id",
                "{device}", "-o", "json",
            ]),
            delete_device: args(&[
                "iot", "hub", "device-identity", "delete", "--hub-name", "{hub}", "--device-id",
                "{device}",
            ]),
            monitor_device: args(&[
                "iot", "hub", "monitor-events", "--hub-name", "{hub}", "--device-id", "{device}",
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct Config {
    pub log_level: LoggingLevel,
    pub log_to_disk: bool,
    pub retry_delay_ms: u64,
    /// Unset means retry until the selection changes
    pub retry_max_attempts: Option<u32>,
    pub provider: ProviderKind,
    pub demo: DemoConfig,
    pub command: CommandConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LoggingLevel::Warn,
            log_to_disk: false,
            retry_delay_ms: 1000,
            retry_max_attempts: None,
            provider: ProviderKind::Demo,
            demo: DemoConfig::default(),
            command: CommandConfig::default(),
        }
    }
}

impl Config {
    /// Load `path`, or the default location when `path` is `None`.
    ///
    /// A missing default file yields the defaults; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        if !required && !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let policy = RetryPolicy::fixed(Duration::from_millis(self.retry_delay_ms));
        match self.retry_max_attempts {
            Some(max) => policy.with_max_attempts(max),
            None => policy,
        }
    }
}

pub fn default_path() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(dir).join("hubview").join("config.toml"));
    }

    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("hubview")
            .join("config.toml")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").expect("parse empty config");
        assert_eq!(config, Config::default());
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn partial_file_overrides_selected_fields() {
        let config = Config::parse(
            r#"
            log_level = "debug"
            retry_delay_ms = 250
            retry_max_attempts = 5
            provider = "command"

            [command]
            program = "/opt/az/bin/az"
            "#,
        )
        .expect("parse config");

        assert_eq!(config.log_level, LoggingLevel::Debug);
        assert_eq!(config.provider, ProviderKind::Command);
        assert_eq!(config.command.program, "/opt/az/bin/az");
        assert_eq!(config.command.list_devices, CommandConfig::default().list_devices);
        assert_eq!(
            config.retry_policy(),
            RetryPolicy::fixed(Duration::from_millis(250)).with_max_attempts(5)
        );
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(Config::parse("provider = \"soap\"").is_err());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let missing = Path::new("/nonexistent/hubview/config.toml");
        assert!(Config::load(Some(missing)).is_err());
    }
}
