// SPDX-License-Identifier: GPL-3.0-only

//! Concrete backends behind the hubview contracts

pub mod command;
pub mod demo;

use std::sync::Arc;

use hubview_contracts::{CollectionProvider, DeviceMonitor, DeviceRegistry, HubDiscovery};
use hubview_types::{DeviceInfo, DeviceRef, ModuleInfo};

use crate::config::{Config, ProviderKind};

pub use command::CommandProvider;
pub use demo::DemoProvider;

/// One backend seen through every capability the app needs.
#[derive(Clone)]
pub struct Backend {
    pub name: &'static str,
    pub hubs: Arc<dyn HubDiscovery>,
    pub devices: Arc<dyn CollectionProvider<String, DeviceInfo>>,
    pub modules: Arc<dyn CollectionProvider<DeviceRef, ModuleInfo>>,
    pub registry: Arc<dyn DeviceRegistry>,
    pub monitor: Arc<dyn DeviceMonitor>,
}

impl Backend {
    pub fn from_provider<B>(name: &'static str, provider: Arc<B>) -> Self
    where
        B: HubDiscovery
            + CollectionProvider<String, DeviceInfo>
            + CollectionProvider<DeviceRef, ModuleInfo>
            + DeviceRegistry
            + DeviceMonitor
            + 'static,
    {
        Self {
            name,
            hubs: provider.clone(),
            devices: provider.clone(),
            modules: provider.clone(),
            registry: provider.clone(),
            monitor: provider,
        }
    }
}

pub fn build(config: &Config, kind: ProviderKind) -> anyhow::Result<Backend> {
    let backend = match kind {
        ProviderKind::Demo => {
            Backend::from_provider("demo", Arc::new(DemoProvider::from_config(&config.demo)))
        }
        ProviderKind::Command => Backend::from_provider(
            "command",
            Arc::new(CommandProvider::new(config.command.clone())?),
        ),
    };
    tracing::debug!(provider = backend.name, "backend ready");
    Ok(backend)
}
