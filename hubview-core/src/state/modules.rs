// SPDX-License-Identifier: GPL-3.0-only

use std::sync::Arc;

use futures_util::StreamExt;
use hubview_contracts::CollectionProvider;
use hubview_types::{DeviceInfo, DeviceRef, LoadState, ModuleInfo, Selection};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::{DependentCollectionLoader, RetryPolicy, SelectionService};

/// Modules of the selected device.
pub struct ModuleListModel {
    devices: Arc<SelectionService<DeviceInfo>>,
    loader: DependentCollectionLoader<DeviceRef, ModuleInfo>,
}

impl ModuleListModel {
    pub fn new(
        devices: Arc<SelectionService<DeviceInfo>>,
        provider: Arc<dyn CollectionProvider<DeviceRef, ModuleInfo>>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            devices,
            loader: DependentCollectionLoader::new("modules", provider, retry),
        }
    }

    pub fn attach(&self) -> JoinHandle<()> {
        let device_refs = self
            .devices
            .changes()
            .map(|device| Selection::from(device.into_option().map(|d| d.device_ref())));
        self.loader.observe_selection(device_refs)
    }

    pub fn state(&self) -> LoadState<DeviceRef, ModuleInfo> {
        self.loader.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadState<DeviceRef, ModuleInfo>> {
        self.loader.subscribe()
    }

    pub async fn settled(&self) -> LoadState<DeviceRef, ModuleInfo> {
        self.loader.settled().await
    }

    pub fn reload(&self) -> bool {
        self.loader.reload()
    }

    pub fn shutdown(&self) {
        self.loader.shutdown();
    }
}
