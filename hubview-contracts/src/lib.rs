// SPDX-License-Identifier: GPL-3.0-only

pub mod traits;

pub use hubview_types::{HubError, HubErrorKind};
pub use traits::{
    CollectionProvider, DeviceMonitor, DeviceRegistry, FetchMode, HubDiscovery, MessageStream,
    Prompt, PromptDecision,
};
