// SPDX-License-Identifier: GPL-3.0-only

pub mod discovery;
pub mod monitor;
pub mod prompt;
pub mod registry;

pub use discovery::{CollectionProvider, FetchMode, HubDiscovery};
pub use monitor::{DeviceMonitor, MessageStream};
pub use prompt::{Prompt, PromptDecision};
pub use registry::DeviceRegistry;
