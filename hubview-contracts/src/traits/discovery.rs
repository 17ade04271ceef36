// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;

use hubview_types::{HubError, HubInfo};

/// Whether a provider may answer from its own cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchMode {
    #[default]
    Cached,
    Refresh,
}

/// Fetches the child collection of one parent.
///
/// Implemented once per (parent, child) pair, so a single backend can serve
/// both device and module lists.
#[async_trait]
pub trait CollectionProvider<P, T>: Send + Sync
where
    P: Send + Sync + 'static,
    T: Send + 'static,
{
    async fn fetch(&self, parent: &P, mode: FetchMode) -> Result<Vec<T>, HubError>;
}

#[async_trait]
pub trait HubDiscovery: Send + Sync {
    async fn list_hubs(&self, mode: FetchMode) -> Result<Vec<HubInfo>, HubError>;
}
