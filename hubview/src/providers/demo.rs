// SPDX-License-Identifier: GPL-3.0-only

//! Design-time data
//!
//! Three hubs with three devices each, every device hosting three modules.
//! Latency and a number of leading failures per parent can be simulated to
//! watch the loaders retry. Monitored devices send one synthetic telemetry
//! message per latency period.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use hubview_contracts::{
    CollectionProvider, DeviceMonitor, DeviceRegistry, FetchMode, HubDiscovery, MessageStream,
};
use hubview_types::{
    DeviceInfo, DeviceMessage, DeviceRef, HubError, HubErrorKind, HubInfo, ModuleInfo,
};

use crate::config::DemoConfig;

const MODULES: [&str; 3] = ["Module1", "Module2", "Module3"];
const IDLE_MESSAGE_INTERVAL: Duration = Duration::from_secs(1);

pub struct DemoProvider {
    latency: Duration,
    failures_per_parent: u32,
    hubs: Mutex<BTreeMap<String, Vec<String>>>,
    failures: Mutex<HashMap<String, u32>>,
}

impl DemoProvider {
    pub fn new(latency: Duration, failures_per_parent: u32) -> Self {
        let hubs = ["Hub1", "Hub2", "Hub3"]
            .into_iter()
            .map(|hub| {
                let devices = (1..=3).map(|n| format!("Device{n}")).collect();
                (hub.to_string(), devices)
            })
            .collect();

        Self {
            latency,
            failures_per_parent,
            hubs: Mutex::new(hubs),
            failures: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &DemoConfig) -> Self {
        Self::new(
            Duration::from_millis(config.latency_ms),
            config.failures_per_parent,
        )
    }

    fn lock_hubs(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<String>>> {
        self.hubs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fail the first `failures_per_parent` fetches of `key`.
    fn simulate_outage(&self, key: &str) -> Result<(), HubError> {
        let mut failures = self
            .failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let count = failures.entry(key.to_string()).or_insert(0);
        if *count < self.failures_per_parent {
            *count += 1;
            return Err(HubError::unavailable(format!(
                "simulated outage for {key} ({}/{})",
                count, self.failures_per_parent
            )));
        }
        Ok(())
    }

    fn message_interval(&self) -> Duration {
        if self.latency.is_zero() {
            IDLE_MESSAGE_INTERVAL
        } else {
            self.latency
        }
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl HubDiscovery for DemoProvider {
    async fn list_hubs(&self, _mode: FetchMode) -> Result<Vec<HubInfo>, HubError> {
        self.delay().await;
        Ok(self.lock_hubs().keys().map(HubInfo::new).collect())
    }
}

#[async_trait]
impl CollectionProvider<String, DeviceInfo> for DemoProvider {
    async fn fetch(&self, hub: &String, _mode: FetchMode) -> Result<Vec<DeviceInfo>, HubError> {
        self.delay().await;
        self.simulate_outage(hub)?;

        let hubs = self.lock_hubs();
        let devices = hubs
            .get(hub)
            .ok_or_else(|| HubError::not_found(format!("hub '{hub}'")))?;
        Ok(devices
            .iter()
            .map(|device| DeviceInfo::new(hub.as_str(), device.as_str()))
            .collect())
    }
}

#[async_trait]
impl CollectionProvider<DeviceRef, ModuleInfo> for DemoProvider {
    async fn fetch(&self, device: &DeviceRef, _mode: FetchMode) -> Result<Vec<ModuleInfo>, HubError> {
        self.delay().await;
        self.simulate_outage(&device.to_string())?;

        let hubs = self.lock_hubs();
        let known = hubs
            .get(&device.hub_name)
            .is_some_and(|devices| devices.contains(&device.device_id));
        if !known {
            return Err(HubError::not_found(format!("device '{device}'")));
        }
        Ok(MODULES
            .iter()
            .map(|module| ModuleInfo::new(device, *module))
            .collect())
    }
}

#[async_trait]
impl DeviceRegistry for DemoProvider {
    async fn create_device(&self, hub: &str, device_id: &str) -> Result<DeviceInfo, HubError> {
        self.delay().await;
        let mut hubs = self.lock_hubs();
        let devices = hubs
            .get_mut(hub)
            .ok_or_else(|| HubError::not_found(format!("hub '{hub}'")))?;
        if devices.iter().any(|existing| existing == device_id) {
            return Err(HubError::new(
                HubErrorKind::InvalidInput,
                format!("device '{device_id}' already exists in {hub}"),
            ));
        }
        devices.push(device_id.to_string());
        Ok(DeviceInfo::new(hub, device_id))
    }

    async fn delete_device(&self, hub: &str, device_id: &str) -> Result<(), HubError> {
        self.delay().await;
        let mut hubs = self.lock_hubs();
        let devices = hubs
            .get_mut(hub)
            .ok_or_else(|| HubError::not_found(format!("hub '{hub}'")))?;
        let before = devices.len();
        devices.retain(|existing| existing != device_id);
        if devices.len() == before {
            return Err(HubError::not_found(format!("device '{device_id}' in {hub}")));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceMonitor for DemoProvider {
    async fn monitor_device(&self, device: &DeviceRef) -> Result<MessageStream, HubError> {
        let known = self
            .lock_hubs()
            .get(&device.hub_name)
            .is_some_and(|devices| devices.contains(&device.device_id));
        if !known {
            return Err(HubError::not_found(format!("device '{device}'")));
        }

        let device = device.clone();
        let interval = self.message_interval();
        let messages = futures_util::stream::unfold(1u64, move |sequence| {
            let device = device.clone();
            async move {
                tokio::time::sleep(interval).await;
                let payload = format!(
                    r#"{{"sequence":{sequence},"temperature":{}}}"#,
                    20 + sequence % 5
                );
                Some((Ok(DeviceMessage::new(&device, payload)), sequence + 1))
            }
        });
        Ok(messages.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> DemoProvider {
        DemoProvider::new(Duration::ZERO, 0)
    }

    #[tokio::test]
    async fn lists_sample_hierarchy() {
        let demo = provider();
        let hubs = demo.list_hubs(FetchMode::Cached).await.expect("hubs");
        assert_eq!(hubs.len(), 3);

        let devices: Vec<DeviceInfo> = demo
            .fetch(&"Hub2".to_string(), FetchMode::Cached)
            .await
            .expect("devices");
        assert_eq!(devices[0], DeviceInfo::new("Hub2", "Device1"));

        let modules: Vec<ModuleInfo> = demo
            .fetch(&devices[0].device_ref(), FetchMode::Cached)
            .await
            .expect("modules");
        assert_eq!(modules.len(), 3);
        assert!(modules.iter().all(|m| m.hub_name == "Hub2"));
    }

    #[tokio::test]
    async fn unknown_parents_are_not_found() {
        let demo = provider();
        let result: Result<Vec<DeviceInfo>, _> =
            demo.fetch(&"Hub9".to_string(), FetchMode::Cached).await;
        assert_eq!(result.unwrap_err().kind, HubErrorKind::NotFound);

        let result: Result<Vec<ModuleInfo>, _> = demo
            .fetch(&DeviceRef::new("Hub1", "Device9"), FetchMode::Cached)
            .await;
        assert_eq!(result.unwrap_err().kind, HubErrorKind::NotFound);
    }

    #[tokio::test]
    async fn simulated_outage_fails_leading_fetches_per_parent() {
        let demo = DemoProvider::new(Duration::ZERO, 2);
        let hub = "Hub1".to_string();

        for _ in 0..2 {
            let result: Result<Vec<DeviceInfo>, _> = demo.fetch(&hub, FetchMode::Cached).await;
            assert_eq!(result.unwrap_err().kind, HubErrorKind::Unavailable);
        }
        let result: Result<Vec<DeviceInfo>, _> = demo.fetch(&hub, FetchMode::Cached).await;
        assert_eq!(result.expect("third fetch succeeds").len(), 3);

        let other: Result<Vec<DeviceInfo>, _> =
            demo.fetch(&"Hub2".to_string(), FetchMode::Cached).await;
        assert!(other.is_err(), "each parent has its own outage budget");
    }

    #[tokio::test]
    async fn create_and_delete_devices() {
        let demo = provider();
        demo.create_device("Hub1", "Device4").await.expect("create");
        assert!(demo.create_device("Hub1", "Device4").await.is_err());

        demo.delete_device("Hub1", "Device1").await.expect("delete");
        let err = demo.delete_device("Hub1", "Device1").await.unwrap_err();
        assert_eq!(err.kind, HubErrorKind::NotFound);

        let devices: Vec<DeviceInfo> = demo
            .fetch(&"Hub1".to_string(), FetchMode::Cached)
            .await
            .expect("devices");
        let ids: Vec<_> = devices.iter().map(|d| d.device_id.as_str()).collect();
        assert_eq!(ids, vec!["Device2", "Device3", "Device4"]);
    }

    #[tokio::test(start_paused = true)]
    async fn monitored_device_sends_a_message_per_period() {
        let demo = DemoProvider::new(Duration::from_millis(150), 0);
        let started = tokio::time::Instant::now();

        let messages: Vec<_> = demo
            .monitor_device(&DeviceRef::new("Hub3", "Device2"))
            .await
            .expect("start monitoring")
            .take(3)
            .collect()
            .await;

        assert_eq!(messages.len(), 3);
        let first = messages[0].as_ref().expect("first message");
        assert_eq!(first.hub_name, "Hub3");
        assert_eq!(first.device_id, "Device2");
        assert_eq!(first.payload, r#"{"sequence":1,"temperature":21}"#);
        assert!(started.elapsed() >= Duration::from_millis(450));

        let missing = demo.monitor_device(&DeviceRef::new("Hub3", "Device9")).await;
        assert_eq!(missing.err().map(|e| e.kind), Some(HubErrorKind::NotFound));
    }
}
