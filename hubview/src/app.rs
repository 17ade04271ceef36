// SPDX-License-Identifier: GPL-3.0-only

//! Wiring of selections, list models and output

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use futures_util::StreamExt;
use hubview_contracts::{FetchMode, MessageStream};
use hubview_core::{
    CommandOutcome, DeviceListModel, ModuleListModel, RetryPolicy, SelectionService,
};
use hubview_types::{ChildRecord, DeviceInfo, HubError, HubInfo, LoadState, Selection};
use serde::Serialize;
use tokio::sync::watch;

use crate::prompt::StaticPrompt;
use crate::providers::Backend;

pub struct App {
    backend: Backend,
    timeout: Duration,
    json: bool,
    hubs: Arc<SelectionService<HubInfo>>,
    devices: Arc<SelectionService<DeviceInfo>>,
    device_list: DeviceListModel,
    module_list: ModuleListModel,
}

impl App {
    /// Build the list models and start following the selections.
    pub fn new(backend: Backend, retry: RetryPolicy, timeout: Duration, json: bool) -> Self {
        let hubs = Arc::new(SelectionService::new());
        let devices = Arc::new(SelectionService::new());
        let device_list = DeviceListModel::new(
            hubs.clone(),
            devices.clone(),
            backend.devices.clone(),
            backend.registry.clone(),
            retry,
        );
        let module_list = ModuleListModel::new(devices.clone(), backend.modules.clone(), retry);
        device_list.attach();
        module_list.attach();

        Self {
            backend,
            timeout,
            json,
            hubs,
            devices,
            device_list,
            module_list,
        }
    }

    pub fn device_list(&self) -> &DeviceListModel {
        &self.device_list
    }

    pub fn module_list(&self) -> &ModuleListModel {
        &self.module_list
    }

    pub async fn fetch_hubs(&self, mode: FetchMode) -> anyhow::Result<Vec<HubInfo>> {
        let hubs = tokio::time::timeout(self.timeout, self.backend.hubs.list_hubs(mode))
            .await
            .map_err(|_| {
                HubError::timeout(format!("listing hubs took longer than {:?}", self.timeout))
            })??;
        Ok(hubs)
    }

    pub async fn list_hubs(&self) -> anyhow::Result<()> {
        let hubs = self.fetch_hubs(FetchMode::Cached).await?;
        if self.json {
            print_json(&hubs)?;
        } else {
            for hub in &hubs {
                println!("{}", hub.name);
            }
        }
        Ok(())
    }

    /// Select a hub by name. Re-selecting the current hub is a no-op.
    pub fn select_hub(&self, hub: Option<&str>) {
        let hub = hub.map(HubInfo::new);
        if self.hubs.selected() != hub {
            self.hubs.select(hub);
        }
    }

    /// Select a device of the listed hub by id.
    pub fn select_device(&self, device_id: Option<&str>) -> anyhow::Result<()> {
        let Some(device_id) = device_id else {
            self.devices.clear();
            return Ok(());
        };
        let state = self.device_list.state();
        let Some(device) = state.items.iter().find(|d| d.id() == device_id) else {
            bail!(
                "device '{device_id}' is not listed under {}",
                state.parent.as_option().map_or("any hub", String::as_str)
            );
        };
        self.devices.select(Some(device.clone()));
        Ok(())
    }

    pub async fn list_devices(&self, hub: &str) -> anyhow::Result<()> {
        self.select_hub(Some(hub));
        let state = self.settled_devices(hub).await?;
        self.print_items(&state.items)
    }

    pub async fn list_modules(&self, hub: &str, device: &str) -> anyhow::Result<()> {
        self.select_hub(Some(hub));
        self.settled_devices(hub).await?;
        self.select_device(Some(device))?;

        let expected = Selection::Some(hubview_types::DeviceRef::new(hub, device));
        let state = wait_settled(self.module_list.subscribe(), &expected, self.timeout)
            .await
            .with_context(|| format!("loading modules of {hub}/{device}"))?;
        self.print_items(&state.items)
    }

    pub async fn create_device(&self, hub: &str, name: &str) -> anyhow::Result<()> {
        self.select_hub(Some(hub));
        self.settled_devices(hub).await?;

        let prompt = StaticPrompt::with_device_name(name);
        report(self.device_list.create_device(&prompt).await)?;

        let state = self.settled_devices(hub).await?;
        self.print_items(&state.items)
    }

    pub async fn delete_device(&self, hub: &str, device: &str, confirm: bool) -> anyhow::Result<()> {
        self.select_hub(Some(hub));
        self.settled_devices(hub).await?;
        self.select_device(Some(device))?;

        let prompt = StaticPrompt::confirming(confirm);
        match self.device_list.delete_selected_device(&prompt).await {
            CommandOutcome::Cancelled => bail!("not deleting {hub}/{device} without --yes"),
            outcome => report(outcome)?,
        }

        let state = self.settled_devices(hub).await?;
        self.print_items(&state.items)
    }

    async fn settled_devices(&self, hub: &str) -> anyhow::Result<LoadState<String, DeviceInfo>> {
        wait_settled(
            self.device_list.subscribe(),
            &Selection::Some(hub.to_string()),
            self.timeout,
        )
        .await
        .with_context(|| format!("loading devices of {hub}"))
    }

    /// Print the messages of `hub`/`device` until Ctrl-C, or until `count`
    /// messages arrived.
    pub async fn monitor(&self, hub: &str, device: &str, count: Option<usize>) -> anyhow::Result<()> {
        self.select_hub(Some(hub));
        self.settled_devices(hub).await?;
        self.select_device(Some(device))?;

        let messages = self.monitor_selected_device().await?;
        let received = self.print_messages(messages, count).await?;
        tracing::debug!(%hub, %device, received, "monitoring stopped");
        Ok(())
    }

    pub async fn monitor_selected_device(&self) -> anyhow::Result<MessageStream> {
        let Some(device) = self.device_list.selected_device() else {
            bail!("no device selected");
        };
        let device = device.device_ref();
        tracing::info!(%device, "monitoring device");
        let messages = self
            .backend
            .monitor
            .monitor_device(&device)
            .await
            .with_context(|| format!("monitoring {device}"))?;
        Ok(messages)
    }

    /// Print messages until the stream ends, Ctrl-C, or `count` messages.
    /// Returns the number of messages printed.
    pub async fn print_messages(
        &self,
        mut messages: MessageStream,
        count: Option<usize>,
    ) -> anyhow::Result<usize> {
        let interrupted = tokio::signal::ctrl_c();
        tokio::pin!(interrupted);

        let mut received = 0;
        while count.is_none_or(|limit| received < limit) {
            let next = tokio::select! {
                _ = &mut interrupted => break,
                next = messages.next() => next,
            };
            let Some(message) = next else {
                break;
            };
            let message = message?;
            received += 1;

            if self.json {
                println!("{}", serde_json::to_string(&message)?);
            } else {
                println!(
                    "[{}/{}] {}",
                    message.hub_name, message.device_id, message.payload
                );
            }
        }
        Ok(received)
    }

    fn print_items<T: ChildRecord + Serialize>(&self, items: &[T]) -> anyhow::Result<()> {
        if self.json {
            return print_json(items);
        }
        for item in items {
            println!("{}", item.id());
        }
        Ok(())
    }

    pub fn shutdown(&self) {
        self.module_list.shutdown();
        self.device_list.shutdown();
    }
}

/// Wait until `rx` shows a settled state for `parent`.
pub async fn wait_settled<P, T>(
    mut rx: watch::Receiver<LoadState<P, T>>,
    parent: &Selection<P>,
    timeout: Duration,
) -> anyhow::Result<LoadState<P, T>>
where
    P: PartialEq + Clone,
    T: Clone,
{
    let state = tokio::time::timeout(
        timeout,
        rx.wait_for(|state| state.parent == *parent && state.is_settled()),
    )
    .await
    .map_err(|_| HubError::timeout(format!("list did not settle within {timeout:?}")))??;
    Ok(state.clone())
}

fn report(outcome: CommandOutcome) -> anyhow::Result<()> {
    match outcome {
        CommandOutcome::Completed => Ok(()),
        CommandOutcome::Cancelled => bail!("cancelled"),
        CommandOutcome::Unavailable => bail!("no hub or device selected"),
        CommandOutcome::Failed(error) => Err(error.into()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One-line rendering of a list state for the watch session.
pub fn describe_state<P, T>(label: &str, state: &LoadState<P, T>) -> String
where
    P: std::fmt::Display,
    T: ChildRecord,
{
    let mut line = format!("[{label}]");
    match state.parent.as_option() {
        None => line.push_str(" (nothing selected)"),
        Some(parent) => {
            let _ = write!(line, " {parent}:");
            if state.is_loading {
                line.push_str(" loading...");
            } else if state.items.is_empty() {
                line.push_str(" (empty)");
            } else {
                for item in &state.items {
                    let _ = write!(line, " {}", item.id());
                }
            }
        }
    }
    line
}
