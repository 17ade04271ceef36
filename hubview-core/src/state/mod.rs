// SPDX-License-Identifier: GPL-3.0-only

pub mod devices;
pub mod modules;

pub use devices::DeviceListModel;
pub use modules::ModuleListModel;

use hubview_types::HubError;

/// Result of a user-triggered list command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Completed,
    /// The prompt was dismissed.
    Cancelled,
    /// Preconditions not met (nothing selected).
    Unavailable,
    Failed(HubError),
}

impl CommandOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}
