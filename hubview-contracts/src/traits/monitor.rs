// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use hubview_types::{DeviceMessage, DeviceRef, HubError};

/// Messages of one device, in arrival order.
///
/// The stream ends when the backend stops delivering; dropping it stops
/// the monitoring.
pub type MessageStream = BoxStream<'static, Result<DeviceMessage, HubError>>;

#[async_trait]
pub trait DeviceMonitor: Send + Sync {
    /// Start monitoring `device`. Fails if monitoring cannot be started.
    async fn monitor_device(&self, device: &DeviceRef) -> Result<MessageStream, HubError>;
}
