// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;

use hubview_types::{DeviceInfo, HubError};

#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    async fn create_device(&self, hub_name: &str, device_id: &str)
    -> Result<DeviceInfo, HubError>;

    async fn delete_device(&self, hub_name: &str, device_id: &str) -> Result<(), HubError>;
}
