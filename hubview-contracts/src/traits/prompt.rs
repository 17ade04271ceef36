// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;

use hubview_types::DeviceRef;

/// Answer from the user-facing side of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptDecision<T> {
    Accept(T),
    Cancel,
}

/// Asks the user for input or confirmation before a device command runs.
#[async_trait]
pub trait Prompt: Send + Sync {
    async fn request_device_name(&self, hub_name: &str) -> PromptDecision<String>;

    async fn confirm_delete(&self, device: &DeviceRef) -> PromptDecision<()>;
}
