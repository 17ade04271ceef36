// SPDX-License-Identifier: GPL-3.0-only

//! External command backend
//!
//! Every operation runs the configured program with a templated argument
//! list and parses a JSON array from stdout. Listings are cached per parent
//! until a `FetchMode::Refresh` fetch or a device command invalidates them.
//! Device monitoring keeps its command running and turns every output line
//! into a message.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use hubview_contracts::{
    CollectionProvider, DeviceMonitor, DeviceRegistry, FetchMode, HubDiscovery, MessageStream,
};
use hubview_types::{
    DeviceInfo, DeviceMessage, DeviceRef, HubError, HubErrorKind, HubInfo, ModuleInfo,
};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::process::Child;
use which::which;

use crate::config::CommandConfig;

pub struct CommandProvider {
    program: PathBuf,
    templates: CommandConfig,
    cache: Mutex<Cache>,
}

#[derive(Default)]
struct Cache {
    hubs: Option<Vec<HubInfo>>,
    devices: HashMap<String, Vec<DeviceInfo>>,
    modules: HashMap<DeviceRef, Vec<ModuleInfo>>,
}

/// Substitute `{name}` placeholders in every argument.
pub fn render_args(template: &[String], vars: &[(&str, &str)]) -> Vec<String> {
    template
        .iter()
        .map(|arg| {
            vars.iter().fold(arg.clone(), |arg, (name, value)| {
                arg.replace(&format!("{{{name}}}"), value)
            })
        })
        .collect()
}

pub fn render(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

/// Parse a JSON array of records from command output.
pub fn parse_records<T: DeserializeOwned>(command: &str, stdout: &str) -> Result<Vec<T>, HubError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed).map_err(|e| {
        HubError::internal(format!("unexpected output from '{command}': {e}"))
    })
}

impl CommandProvider {
    pub fn new(templates: CommandConfig) -> anyhow::Result<Self> {
        let program = which(&templates.program).map_err(|e| {
            anyhow::anyhow!("command provider needs '{}' on PATH: {e}", templates.program)
        })?;
        Ok(Self {
            program,
            templates,
            cache: Mutex::new(Cache::default()),
        })
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, Cache> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn run(&self, template: &[String], vars: &[(&str, &str)]) -> Result<String, HubError> {
        let args = render_args(template, vars);
        let rendered = render(&self.templates.program, &args);
        tracing::debug!(command = %rendered, "running provider command");

        let output = tokio::process::Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| HubError::unavailable(format!("failed to run '{rendered}': {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HubError::new(
                HubErrorKind::Unavailable,
                format!("'{rendered}' failed ({}): {}", output.status, stderr.trim()),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn run_records<T: DeserializeOwned>(
        &self,
        template: &[String],
        vars: &[(&str, &str)],
    ) -> Result<Vec<T>, HubError> {
        let stdout = self.run(template, vars).await?;
        parse_records(&self.templates.program, &stdout)
    }
}

#[async_trait]
impl HubDiscovery for CommandProvider {
    async fn list_hubs(&self, mode: FetchMode) -> Result<Vec<HubInfo>, HubError> {
        if mode == FetchMode::Cached
            && let Some(hubs) = self.lock_cache().hubs.clone()
        {
            return Ok(hubs);
        }

        let hubs: Vec<HubInfo> = self.run_records(&self.templates.list_hubs, &[]).await?;
        self.lock_cache().hubs = Some(hubs.clone());
        Ok(hubs)
    }
}

#[async_trait]
impl CollectionProvider<String, DeviceInfo> for CommandProvider {
    async fn fetch(&self, hub: &String, mode: FetchMode) -> Result<Vec<DeviceInfo>, HubError> {
        if mode == FetchMode::Cached
            && let Some(devices) = self.lock_cache().devices.get(hub).cloned()
        {
            return Ok(devices);
        }

        let mut devices: Vec<DeviceInfo> = self
            .run_records(&self.templates.list_devices, &[("hub", hub.as_str())])
            .await?;
        for device in &mut devices {
            device.hub_name = hub.clone();
        }
        self.lock_cache().devices.insert(hub.clone(), devices.clone());
        Ok(devices)
    }
}

#[async_trait]
impl CollectionProvider<DeviceRef, ModuleInfo> for CommandProvider {
    async fn fetch(&self, device: &DeviceRef, mode: FetchMode) -> Result<Vec<ModuleInfo>, HubError> {
        if mode == FetchMode::Cached
            && let Some(modules) = self.lock_cache().modules.get(device).cloned()
        {
            return Ok(modules);
        }

        let vars = [
            ("hub", device.hub_name.as_str()),
            ("device", device.device_id.as_str()),
        ];
        let mut modules: Vec<ModuleInfo> = self
            .run_records(&self.templates.list_modules, &vars)
            .await?;
        for module in &mut modules {
            module.hub_name = device.hub_name.clone();
            module.device_id = device.device_id.clone();
        }
        self.lock_cache().modules.insert(device.clone(), modules.clone());
        Ok(modules)
    }
}

#[async_trait]
impl DeviceRegistry for CommandProvider {
    async fn create_device(&self, hub: &str, device_id: &str) -> Result<DeviceInfo, HubError> {
        let vars = [("hub", hub), ("device", device_id), ("name", device_id)];
        self.run(&self.templates.create_device, &vars).await?;
        self.lock_cache().devices.remove(hub);
        Ok(DeviceInfo::new(hub, device_id))
    }

    async fn delete_device(&self, hub: &str, device_id: &str) -> Result<(), HubError> {
        self.run(&self.templates.delete_device, &[("hub", hub), ("device", device_id)])
            .await?;
        let mut cache = self.lock_cache();
        cache.devices.remove(hub);
        cache.modules.remove(&DeviceRef::new(hub, device_id));
        Ok(())
    }
}

#[async_trait]
impl DeviceMonitor for CommandProvider {
    async fn monitor_device(&self, device: &DeviceRef) -> Result<MessageStream, HubError> {
        let vars = [
            ("hub", device.hub_name.as_str()),
            ("device", device.device_id.as_str()),
        ];
        let args = render_args(&self.templates.monitor_device, &vars);
        let rendered = render(&self.templates.program, &args);
        tracing::debug!(command = %rendered, "starting device monitor");

        let mut child = tokio::process::Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| HubError::unavailable(format!("failed to run '{rendered}': {e}")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HubError::internal(format!("no stdout from '{rendered}'")))?;

        let monitor = RunningMonitor {
            device: device.clone(),
            command: rendered,
            child,
            lines: BufReader::new(stdout).lines(),
        };
        Ok(monitor.into_messages().boxed())
    }
}

/// A monitor command and its output. Dropping it kills the command.
struct RunningMonitor<R> {
    device: DeviceRef,
    command: String,
    child: Child,
    lines: Lines<R>,
}

impl<R> RunningMonitor<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    /// Non-empty output lines as messages. A non-zero exit ends the stream
    /// with an `Unavailable` error.
    fn into_messages(self) -> impl Stream<Item = Result<DeviceMessage, HubError>> + Send + 'static {
        futures_util::stream::unfold(Some(self), |state| async move {
            let mut monitor = state?;
            loop {
                match monitor.lines.next_line().await {
                    Ok(Some(line)) if line.trim().is_empty() => continue,
                    Ok(Some(line)) => {
                        let message = DeviceMessage::new(&monitor.device, line);
                        return Some((Ok(message), Some(monitor)));
                    }
                    Ok(None) => {
                        let error = match monitor.child.wait().await {
                            Ok(status) if status.success() => return None,
                            Ok(status) => format!("'{}' exited ({status})", monitor.command),
                            Err(e) => format!("waiting for '{}' failed: {e}", monitor.command),
                        };
                        return Some((Err(HubError::unavailable(error)), None));
                    }
                    Err(e) => {
                        let error = format!("reading output of '{}' failed: {e}", monitor.command);
                        return Some((Err(HubError::internal(error)), None));
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_substituted_in_every_argument() {
        let template = CommandConfig::default().list_modules;
        let args = render_args(&template, &[("hub", "Hub1"), ("device", "Device2")]);
        assert!(args.windows(2).any(|w| w == ["--hub-name", "Hub1"]));
        assert!(args.windows(2).any(|w| w == ["--device-id", "Device2"]));
        assert!(!args.iter().any(|arg| arg == "{hub}" || arg == "{device}"));
    }

    #[test]
    fn jmespath_braces_survive_rendering() {
        let template = CommandConfig::default().list_hubs;
        let args = render_args(&template, &[]);
        assert!(args.contains(&"[].{name:name}".to_string()));
        assert!(render("az", &args).starts_with("az iot hub list"));
    }

    #[test]
    fn parses_device_listing() {
        let stdout = r#"
            [
              {"deviceId": "sensor-01", "status": "enabled", "connectionState": "Connected"},
              {"deviceId": "sensor-02", "status": "disabled"}
            ]
        "#;
        let devices: Vec<DeviceInfo> = parse_records("az", stdout).expect("parse devices");
        let ids: Vec<_> = devices.iter().map(|d| d.device_id.as_str()).collect();
        assert_eq!(ids, vec!["sensor-01", "sensor-02"]);
    }

    #[test]
    fn empty_output_is_an_empty_listing() {
        let modules: Vec<ModuleInfo> = parse_records("az", "  \n").expect("parse empty");
        assert!(modules.is_empty());
    }

    #[test]
    fn malformed_output_is_an_internal_error() {
        let result: Result<Vec<HubInfo>, _> = parse_records("az", "ERROR: please run az login");
        assert_eq!(result.unwrap_err().kind, HubErrorKind::Internal);
    }

    fn shell_monitor(script: &str) -> CommandProvider {
        CommandProvider::new(CommandConfig {
            program: "sh".to_string(),
            monitor_device: vec!["-c".to_string(), script.to_string()],
            ..CommandConfig::default()
        })
        .expect("sh on PATH")
    }

    #[tokio::test]
    async fn monitor_streams_non_empty_output_lines() {
        let provider = shell_monitor("echo '{\"n\":1}'; echo; echo {hub}:{device}");
        let device = DeviceRef::new("Hub1", "Device2");

        let messages: Vec<_> = provider
            .monitor_device(&device)
            .await
            .expect("start monitor")
            .collect()
            .await;

        let payloads: Vec<_> = messages
            .into_iter()
            .map(|message| message.expect("message").payload)
            .collect();
        assert_eq!(payloads, vec![r#"{"n":1}"#, "Hub1:Device2"]);
    }

    #[tokio::test]
    async fn monitor_failure_ends_the_stream_with_an_error() {
        let provider = shell_monitor("echo partial; exit 3");

        let messages: Vec<_> = provider
            .monitor_device(&DeviceRef::new("Hub1", "Device1"))
            .await
            .expect("start monitor")
            .collect()
            .await;

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].as_ref().expect("first line").payload, "partial");
        assert_eq!(
            messages[1].as_ref().err().map(|e| e.kind),
            Some(HubErrorKind::Unavailable)
        );
    }
}
