// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain models for hubview
//!
//! These types are shared by every layer of the stack:
//!
//! - **hubview-contracts**: providers return these records directly
//! - **hubview-core**: loaders hold them inside [`LoadState`]
//! - **hubview**: prints them and parses them from external command output
//!
//! ## Hierarchy
//!
//! - `HubInfo` → top level, no parent
//! - `DeviceInfo` → child of a hub (parent id is the hub name)
//! - `ModuleInfo` → child of a device, addressed through [`DeviceRef`]
//! - `DeviceMessage` → a monitored message sent by a device

pub mod error;
pub mod load_state;
pub mod records;
pub mod selection;

pub use error::{HubError, HubErrorKind};
pub use load_state::LoadState;
pub use records::{ChildRecord, DeviceInfo, DeviceMessage, DeviceRef, HubInfo, ModuleInfo};
pub use selection::Selection;
