// SPDX-License-Identifier: GPL-3.0-only

//! Hub, device and module records
//!
//! Records only carry identity: their own id and the id of the parent they
//! were listed under. Field names are camelCase on the wire so command output
//! can be parsed without a mapping layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A record that belongs to a parent entity.
pub trait ChildRecord {
    fn id(&self) -> &str;
    fn parent_id(&self) -> &str;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct HubInfo {
    pub name: String,
}

impl HubInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub device_id: String,

    /// Hub the device was listed under
    #[serde(default)]
    pub hub_name: String,
}

impl DeviceInfo {
    pub fn new(hub_name: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            hub_name: hub_name.into(),
        }
    }

    pub fn device_ref(&self) -> DeviceRef {
        DeviceRef::new(self.hub_name.clone(), self.device_id.clone())
    }
}

impl ChildRecord for DeviceInfo {
    fn id(&self) -> &str {
        &self.device_id
    }

    fn parent_id(&self) -> &str {
        &self.hub_name
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInfo {
    pub module_id: String,

    #[serde(default)]
    pub device_id: String,

    #[serde(default)]
    pub hub_name: String,
}

impl ModuleInfo {
    pub fn new(parent: &DeviceRef, module_id: impl Into<String>) -> Self {
        Self {
            module_id: module_id.into(),
            device_id: parent.device_id.clone(),
            hub_name: parent.hub_name.clone(),
        }
    }
}

impl ChildRecord for ModuleInfo {
    fn id(&self) -> &str {
        &self.module_id
    }

    fn parent_id(&self) -> &str {
        &self.device_id
    }
}

/// Fully qualified device address, the parent key of a module list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRef {
    pub hub_name: String,
    pub device_id: String,
}

impl DeviceRef {
    pub fn new(hub_name: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            hub_name: hub_name.into(),
            device_id: device_id.into(),
        }
    }
}

impl fmt::Display for DeviceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.hub_name, self.device_id)
    }
}

/// One message received while monitoring a device.
///
/// `payload` is passed through as printed by the backend; it is usually a
/// JSON document but nothing here relies on that.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMessage {
    pub hub_name: String,
    pub device_id: String,
    pub payload: String,
}

impl DeviceMessage {
    pub fn new(device: &DeviceRef, payload: impl Into<String>) -> Self {
        Self {
            hub_name: device.hub_name.clone(),
            device_id: device.device_id.clone(),
            payload: payload.into(),
        }
    }
}
