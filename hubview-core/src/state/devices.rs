// SPDX-License-Identifier: GPL-3.0-only

//! Device list bound to the hub selection

use std::sync::Arc;

use futures_util::StreamExt;
use hubview_contracts::{CollectionProvider, DeviceRegistry, Prompt, PromptDecision};
use hubview_types::{DeviceInfo, HubError, HubErrorKind, HubInfo, LoadState, Selection};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::CommandOutcome;
use crate::{DependentCollectionLoader, RetryPolicy, SelectionService};

/// Devices of the selected hub, plus the add / delete / reload commands.
pub struct DeviceListModel {
    hubs: Arc<SelectionService<HubInfo>>,
    devices: Arc<SelectionService<DeviceInfo>>,
    registry: Arc<dyn DeviceRegistry>,
    loader: DependentCollectionLoader<String, DeviceInfo>,
}

impl DeviceListModel {
    pub fn new(
        hubs: Arc<SelectionService<HubInfo>>,
        devices: Arc<SelectionService<DeviceInfo>>,
        provider: Arc<dyn CollectionProvider<String, DeviceInfo>>,
        registry: Arc<dyn DeviceRegistry>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            hubs,
            devices,
            registry,
            loader: DependentCollectionLoader::new("devices", provider, retry),
        }
    }

    /// Start following the hub selection.
    ///
    /// A hub change drops the selected device when it belongs to another
    /// hub, so lists chained to the device selection reset as well.
    pub fn attach(&self) -> JoinHandle<()> {
        let devices = Arc::clone(&self.devices);
        let hub_names = self.hubs.changes().map(move |hub| {
            let hub_name = hub.into_option().map(|hub| hub.name);
            if let Some(device) = devices.selected()
                && Some(&device.hub_name) != hub_name.as_ref()
            {
                tracing::debug!(device = %device.device_ref(), "hub changed, clearing device selection");
                devices.clear();
            }
            Selection::from(hub_name)
        });
        self.loader.observe_selection(hub_names)
    }

    pub fn state(&self) -> LoadState<String, DeviceInfo> {
        self.loader.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadState<String, DeviceInfo>> {
        self.loader.subscribe()
    }

    pub async fn settled(&self) -> LoadState<String, DeviceInfo> {
        self.loader.settled().await
    }

    pub fn select_device(&self, device: Option<DeviceInfo>) {
        self.devices.select(device);
    }

    pub fn selected_device(&self) -> Option<DeviceInfo> {
        self.devices.selected()
    }

    /// Hub whose devices are currently listed.
    pub fn current_hub(&self) -> Option<String> {
        self.loader.state().parent.into_option()
    }

    pub fn can_add_device(&self) -> bool {
        self.current_hub().is_some()
    }

    pub fn can_delete_device(&self) -> bool {
        self.devices.is_selected()
    }

    pub fn reload(&self) -> CommandOutcome {
        tracing::debug!("start reloading devices");
        if self.loader.reload() {
            CommandOutcome::Completed
        } else {
            CommandOutcome::Unavailable
        }
    }

    pub async fn create_device(&self, prompt: &dyn Prompt) -> CommandOutcome {
        let Some(hub) = self.current_hub() else {
            return CommandOutcome::Unavailable;
        };
        tracing::debug!(%hub, "add device requested");

        let name = match prompt.request_device_name(&hub).await {
            PromptDecision::Accept(name) => name.trim().to_string(),
            PromptDecision::Cancel => {
                tracing::debug!(%hub, "add device cancelled");
                return CommandOutcome::Cancelled;
            }
        };
        if name.is_empty() {
            let error = HubError::new(HubErrorKind::InvalidInput, "device name is empty");
            tracing::warn!(%hub, "{error}");
            return CommandOutcome::Failed(error);
        }

        match self.registry.create_device(&hub, &name).await {
            Ok(device) => {
                tracing::info!(%hub, device = %device.device_id, "device created");
                self.loader.reload();
                CommandOutcome::Completed
            }
            Err(error) => {
                tracing::error!(%hub, device = %name, %error, "error while creating new device");
                CommandOutcome::Failed(error)
            }
        }
    }

    pub async fn delete_selected_device(&self, prompt: &dyn Prompt) -> CommandOutcome {
        let Some(device) = self.devices.selected() else {
            return CommandOutcome::Unavailable;
        };
        let device_ref = device.device_ref();
        tracing::debug!(device = %device_ref, "delete device requested");

        if prompt.confirm_delete(&device_ref).await == PromptDecision::Cancel {
            tracing::debug!(device = %device_ref, "delete device cancelled");
            return CommandOutcome::Cancelled;
        }

        match self
            .registry
            .delete_device(&device.hub_name, &device.device_id)
            .await
        {
            Ok(()) => {
                tracing::info!(device = %device_ref, "device deleted");
                self.devices.clear();
                if self.current_hub().as_deref() == Some(device.hub_name.as_str()) {
                    self.loader.reload();
                }
                CommandOutcome::Completed
            }
            Err(error) => {
                tracing::error!(device = %device_ref, %error, "error while deleting device");
                CommandOutcome::Failed(error)
            }
        }
    }

    pub fn shutdown(&self) {
        self.loader.shutdown();
    }
}
