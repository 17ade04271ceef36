// SPDX-License-Identifier: GPL-3.0-only

//! Selection-driven loading of dependent lists
//!
//! A [`DependentCollectionLoader`] keeps the child list of whatever parent is
//! currently selected: it clears stale items as soon as the selection moves,
//! fetches through an injected provider, and retries failed fetches on a
//! fixed delay. [`SelectionService`] is the usual source of selections, and
//! the list models in [`state`] wire both together for hubs, devices and
//! modules.

pub mod loader;
pub mod retry;
pub mod selection;
pub mod state;

#[cfg(test)]
mod test_support;

pub use loader::DependentCollectionLoader;
pub use retry::RetryPolicy;
pub use selection::SelectionService;
pub use state::{CommandOutcome, DeviceListModel, ModuleListModel};
